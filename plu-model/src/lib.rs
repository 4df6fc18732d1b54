//! Document model for PLU règlement documents
//!
//!     This crate defines the data shapes shared by the whole toolchain: the
//!     règlement aggregate, its tree of titres, the content blocks attached to
//!     them, and the structured-HTML payload those blocks carry.
//!
//!     The model is deliberately dumb. It owns the wire format (the JSON shape
//!     exchanged with the browser editor and persisted to disk), id synthesis,
//!     and import validation, nothing else. Conversion lives in plu-babel,
//!     mutation and history in plu-engine.
//!
//! Ownership model
//!
//!     A titre is exclusively owned by its parent array (the document's root
//!     list or a parent titre's child list). There are no back-references:
//!     parent lookup is always done by path recomputation, so the tree is
//!     acyclic by construction. Keep it that way.
//!
//! The file structure :
//!     .
//!     ├── ast
//!     │   ├── document.rs     # PluDocument and DocType
//!     │   ├── titre.rs        # Titre tree node
//!     │   ├── contenu.rs      # Contenu content block
//!     │   └── html_node.rs    # Structured-HTML payload nodes
//!     ├── ids.rs              # Slugging and id synthesis
//!     └── validation.rs       # Import-time invariant checks

pub mod ast;
pub mod ids;
pub mod validation;

pub use ast::contenu::Contenu;
pub use ast::document::{DocType, PluDocument};
pub use ast::html_node::{HtmlElement, HtmlNode};
pub use ast::titre::Titre;
pub use validation::ValidationError;
