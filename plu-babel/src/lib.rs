//! Format interoperability for règlement documents
//!
//!     This crate owns every conversion at the system's boundaries: the
//!     bidirectional mapping between the browser editor's rich-document JSON
//!     and the structured-HTML storage format, the content splitter, the
//!     DOCX-converted-HTML importer, and the export bundle assembly.
//!
//!     This is a pure lib: it powers the plu-cli but is shell agnostic, that
//!     is no code here should suppose a shell environment, be it to std
//!     print, env vars etc. Degradations are reported through the `log`
//!     facade and the conversion functions never panic on foreign input.
//!
//!     The rich-text editor itself is an external collaborator: the only
//!     thing this crate knows about it is the document JSON it produces and
//!     accepts (see [`rich`]). Likewise image persistence is behind the
//!     [`images::ImageStore`] trait and archive packaging behind
//!     [`export::ArchiveSink`].
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # Import/export error types
//!     ├── images.rs               # ImageStore boundary, data-URL helpers
//!     ├── rich
//!     │   └── nodes.rs            # Rich editor document model
//!     ├── mappings
//!     │   ├── marks.rs            # Mark nesting and inline markup re-parse
//!     │   ├── to_structured.rs    # Rich doc → structured HTML
//!     │   ├── from_structured.rs  # Structured HTML → rich doc
//!     │   └── splitter.rs         # `***` separator partitioning
//!     ├── formats
//!     │   └── docx_html           # DOCX-converted HTML import
//!     └── export.rs               # Export bundle assembly
//!
//! Error policy
//!
//!     The two mapping functions degrade and log rather than fail: malformed
//!     input yields an empty result, unknown constructs fall back to plain
//!     text or a generic wrapper. Import and export, by contrast, return
//!     hard errors: a rejected DOCX import must not plant half a document.

pub mod error;
pub mod export;
pub mod formats;
pub mod images;
pub mod mappings;
pub mod rich;

pub use error::{ExportError, ImportError};
pub use export::{build_export, write_bundle, ArchiveSink, ExportBundle, ExportOptions};
pub use formats::docx_html::{import_docx_html, import_docx_html_with, ImportOptions};
pub use images::{ImageStore, MemoryImageStore, StoreError, StoredImage};
pub use mappings::from_structured::from_structured;
pub use mappings::splitter::split_rich_doc;
pub use mappings::to_structured::to_structured;
pub use rich::nodes::{Mark, RichDoc, RichNode};
