//! AST elements of a règlement document.
//!
//!     The aggregate root is [`document::PluDocument`]; everything below it is
//!     plain owned data. All types serialize to the camelCase JSON shape the
//!     browser editor exchanges, so field renames here are wire-format changes.

pub mod contenu;
pub mod document;
pub mod html_node;
pub mod titre;
