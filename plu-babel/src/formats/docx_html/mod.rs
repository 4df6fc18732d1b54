//! DOCX-converted HTML import (DOCX → règlement)
//!
//!     The DOCX file itself never reaches this crate: an external
//!     collaborator (mammoth or similar) turns it into raw HTML, and this
//!     module parses that flat stream of headings, paragraphs, lists and
//!     tables into a nested titre tree.
//!
//!     Pipeline: HTML string → rcdom → ImportNode view → section stack →
//!     PluDocument.
//!
//!     A leading block of `#key value` lines (before the first real
//!     heading) carries the document metadata; `nom`, `idUrba` and
//!     `typeDoc` are required or the import is rejected outright.

pub mod dom;
pub mod parser;

pub use parser::{import_docx_html, import_docx_html_with, ImportOptions};
