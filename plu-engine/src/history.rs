//! History engine
//!
//!     Undo/redo over the whole document by deep snapshot. Capture runs
//!     *before* every mutation; capturing after would snapshot the already
//!     mutated state and undo would be a no-op. O(document) per action is
//!     deliberate: documents are a few hundred nodes and the simplicity
//!     buys correctness.
//!
//! Stack discipline
//!
//!     - capture: push on undo, evict the single oldest entry past
//!       capacity, clear redo (a fresh action invalidates the redo branch).
//!     - undo: push the live document on redo, pop undo into the live slot.
//!     - redo: the mirror image.
//!     - A boolean re-entrancy guard keeps the restore itself from being
//!       captured as a user action.

use crate::error::EngineError;
use plu_model::PluDocument;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of undo snapshots kept.
pub const DEFAULT_CAPACITY: usize = 50;

/// One captured state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// User-facing name of the action that followed the capture.
    pub label: String,
    /// Seconds since the Unix epoch at capture time.
    pub timestamp: u64,
    pub document: PluDocument,
}

impl Snapshot {
    fn of(label: &str, document: &PluDocument) -> Self {
        Self {
            label: label.to_string(),
            timestamp: now_secs(),
            document: document.clone(),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[derive(Debug)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    restoring: bool,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            restoring: false,
            capacity: capacity.max(1),
        }
    }

    /// Snapshot the document before a mutation. No-op while a restore is
    /// in progress.
    pub fn capture(&mut self, label: &str, document: &PluDocument) {
        if self.restoring {
            return;
        }
        self.undo.push(Snapshot::of(label, document));
        if self.undo.len() > self.capacity {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Replace the live document with the most recent snapshot. Returns
    /// the restored action's label.
    pub fn undo(&mut self, live: &mut PluDocument) -> Result<String, EngineError> {
        let snapshot = self.undo.pop().ok_or(EngineError::NothingToUndo)?;
        self.restoring = true;
        self.redo.push(Snapshot::of(&snapshot.label, live));
        *live = snapshot.document;
        self.restoring = false;
        Ok(snapshot.label)
    }

    /// The mirror of undo.
    pub fn redo(&mut self, live: &mut PluDocument) -> Result<String, EngineError> {
        let snapshot = self.redo.pop().ok_or(EngineError::NothingToRedo)?;
        self.restoring = true;
        self.undo.push(Snapshot::of(&snapshot.label, live));
        *live = snapshot.document;
        self.restoring = false;
        Ok(snapshot.label)
    }

    /// Drop both stacks (a new document was loaded).
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.restoring = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Labels of the undo stack, oldest first. For display.
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo.iter().map(|snapshot| snapshot.label.as_str()).collect()
    }
}
