//! Directory-backed archive sink.
//!
//!     The export boundary only asks for "a place files go"; on the command
//!     line that is a plain directory tree (which any zip tool can pack
//!     afterwards).

use plu_babel::export::ArchiveSink;
use plu_babel::ExportError;
use std::fs;
use std::path::{Path, PathBuf};

pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl ArchiveSink for DirSink {
    fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| ExportError::Archive(format!("{}: {}", parent.display(), err)))?;
        }
        fs::write(&full, bytes)
            .map_err(|err| ExportError::Archive(format!("{}: {}", full.display(), err)))
    }
}
