//! Editing engine for règlement documents
//!
//!     The mutable half of the toolchain: an editing session owns one
//!     document and funnels every change through three cooperating pieces:
//!     the tree engine (flatten, move, add, delete, renumber), the history
//!     engine (deep-snapshot undo/redo), and the session state machine that
//!     keeps structural reorders out while a content edit is in flight.
//!
//! Mutation discipline
//!
//!     Every undoable operation is computed on a copy first ("build then
//!     swap"): the candidate document is built, then the pre-mutation state
//!     is captured, then the copy replaces the live document. A failure
//!     while building leaves both the document and the history untouched.
//!
//!     The file structure :
//!     .
//!     ├── error.rs      # Engine error taxonomy
//!     ├── tree.rs       # Flatten/addressing, moves, renumbering, cascade rename
//!     ├── history.rs    # Snapshot stacks with re-entrancy guard
//!     └── session.rs    # Session owner and edit-state machine

pub mod error;
pub mod history;
pub mod session;
pub mod tree;

pub use error::EngineError;
pub use history::{History, Snapshot, DEFAULT_CAPACITY};
pub use session::{EditState, Session};
pub use tree::{ExpandedSet, FlatTitre, TitrePath};
