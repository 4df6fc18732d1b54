//! Error types for the import and export boundaries.
//!
//!     The structured ⇄ rich mappings never surface errors (they degrade and
//!     log); these types cover the paths that must reject bad input outright.

use crate::images::StoreError;
use plu_model::ValidationError;
use std::fmt;

/// A DOCX-converted HTML import was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The HTML text could not be parsed at all.
    Parse(String),
    /// The leading `#key value` metadata block lacks required keys.
    MissingMetadata(Vec<String>),
    /// A metadata value is present but unusable.
    InvalidMetadata { key: String, message: String },
    /// The assembled document failed model validation.
    Validation(ValidationError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(msg) => write!(f, "Could not parse HTML input: {}", msg),
            ImportError::MissingMetadata(keys) => {
                write!(f, "Missing required metadata: {}", keys.join(", "))
            }
            ImportError::InvalidMetadata { key, message } => {
                write!(f, "Invalid metadata '{}': {}", key, message)
            }
            ImportError::Validation(err) => write!(f, "Imported document is invalid: {}", err),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<ValidationError> for ImportError {
    fn from(err: ValidationError) -> Self {
        ImportError::Validation(err)
    }
}

/// An export bundle could not be assembled or written.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    /// The document could not be serialized to JSON.
    Serialization(String),
    /// The archive sink refused a file.
    Archive(String),
    /// The image store failed while collecting resources.
    Store(StoreError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ExportError::Archive(msg) => write!(f, "Archive error: {}", msg),
            ExportError::Store(err) => write!(f, "Image store error: {}", err),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<StoreError> for ExportError {
    fn from(err: StoreError) -> Self {
        ExportError::Store(err)
    }
}
