//! Titre element
//!
//!     A titre is the main structural element of a règlement. Titres can be
//!     nested up to six levels deep and carry a display title, an ordering
//!     label, classification tags, and an ordered list of content blocks.
//!
//!     The tree of titres is the document's structure. A titre is owned by
//!     exactly one parent array; there are no parent pointers, and every
//!     operation that needs a parent recomputes it from a path of indices.
//!     This creates powerful addressing capabilities as one can target any
//!     sub-titre from a flat rendering of the tree.
//!
//! Structure:
//!
//!         - intitule: short text identifying the titre
//!         - contenu: content blocks attached directly to this titre
//!         - titres: nested child titres (unlimited count, niveau capped at 6)

use super::contenu::Contenu;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default zone tag for a freshly created titre.
pub const DEFAULT_ZONE: &str = "porteeGenerale";
/// Default prescription tag for a freshly created titre.
pub const DEFAULT_PRESCRIPTION: &str = "nonConcerne";

/// Maximum nesting depth of the titre tree.
pub const MAX_NIVEAU: u8 = 6;

/// A hierarchical section of the règlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Titre {
    pub id_titre: String,
    pub intitule: String,
    pub niveau: u8,
    #[serde(default)]
    pub numero: String,
    #[serde(default)]
    pub id_zone: Vec<String>,
    #[serde(default)]
    pub id_prescription: Vec<String>,
    #[serde(default)]
    pub insee_commune: Vec<String>,
    #[serde(default)]
    pub contenu: Vec<Contenu>,
    #[serde(default)]
    pub titres: Vec<Titre>,
}

impl Titre {
    pub fn new(id_titre: impl Into<String>, intitule: impl Into<String>, niveau: u8) -> Self {
        Self {
            id_titre: id_titre.into(),
            intitule: intitule.into(),
            niveau,
            numero: String::new(),
            id_zone: vec![DEFAULT_ZONE.to_string()],
            id_prescription: vec![DEFAULT_PRESCRIPTION.to_string()],
            insee_commune: Vec::new(),
            contenu: Vec::new(),
            titres: Vec::new(),
        }
    }

    /// Preferred builder
    pub fn with_numero(mut self, numero: impl Into<String>) -> Self {
        self.numero = numero.into();
        self
    }

    pub fn with_communes(mut self, insee: Vec<String>) -> Self {
        self.insee_commune = insee;
        self
    }

    /// Iterate this titre and all descendants, depth-first pre-order.
    pub fn iter_subtree(&self) -> impl Iterator<Item = &Titre> {
        fn walk<'a>(titre: &'a Titre, out: &mut Vec<&'a Titre>) {
            out.push(titre);
            for child in &titre.titres {
                walk(child, out);
            }
        }
        let mut all = Vec::new();
        walk(self, &mut all);
        all.into_iter()
    }

    /// Number of nodes in this subtree, self included.
    pub fn subtree_count(&self) -> usize {
        1 + self.titres.iter().map(Titre::subtree_count).sum::<usize>()
    }
}

impl fmt::Display for Titre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Titre('{}', niveau {}, {} contenus, {} children)",
            self.intitule,
            self.niveau,
            self.contenu.len(),
            self.titres.len()
        )
    }
}
