//! Engine error taxonomy.
//!
//!     Every variant is recovered locally and reported to the user; none of
//!     them aborts the session, and a failed operation leaves the document
//!     exactly as it was.

use plu_model::ValidationError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No document is loaded in the session.
    NoDocument,
    /// A flat index does not address any titre.
    InvalidIndex(usize),
    /// A path no longer resolves inside the tree.
    InvalidPath,
    /// The requested move would corrupt the tree.
    InvalidMove(String),
    /// A structural reorder was attempted while a content edit is open.
    EditInProgress,
    /// begin_edit was called while another edit is open, or save/cancel
    /// without one.
    NotEditing,
    /// The undo stack is empty.
    NothingToUndo,
    /// The redo stack is empty.
    NothingToRedo,
    /// The mutation would leave an invalid document.
    Validation(ValidationError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoDocument => write!(f, "No document is loaded"),
            EngineError::InvalidIndex(index) => {
                write!(f, "No titre at position {}", index)
            }
            EngineError::InvalidPath => write!(f, "The titre no longer exists"),
            EngineError::InvalidMove(msg) => write!(f, "Invalid move: {}", msg),
            EngineError::EditInProgress => {
                write!(f, "Finish or cancel the current content edit first")
            }
            EngineError::NotEditing => write!(f, "No content edit is in progress"),
            EngineError::NothingToUndo => write!(f, "Nothing to undo"),
            EngineError::NothingToRedo => write!(f, "Nothing to redo"),
            EngineError::Validation(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err)
    }
}
