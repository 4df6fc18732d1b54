//! Import-time invariant checks
//!
//!     Ad hoc required-field and shape checks run when a document enters the
//!     system (JSON import, DOCX import, metadata edit). A failed check
//!     aborts the whole operation before any state is touched; there is no
//!     partial acceptance.

use crate::ast::document::{DocType, PluDocument};
use crate::ast::titre::{Titre, MAX_NIVEAU};
use crate::ids;
use std::fmt;

/// A document failed an import-time invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required top-level field is empty or absent.
    MissingField(&'static str),
    /// idReglement does not equal idUrba + "/reglement".
    IdMismatch { expected: String, found: String },
    /// An INSEE commune code is not 5 digits.
    InvalidInsee(String),
    /// The EPCI SIREN is not 9 digits.
    InvalidSiren(String),
    /// typeDoc is PLUi but no sirenEpci is present.
    MissingSiren,
    /// A titre's niveau is outside 1..=6.
    InvalidNiveau { id_titre: String, niveau: u8 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => {
                write!(f, "Required field '{}' is missing or empty", field)
            }
            ValidationError::IdMismatch { expected, found } => {
                write!(
                    f,
                    "idReglement '{}' does not match idUrba (expected '{}')",
                    found, expected
                )
            }
            ValidationError::InvalidInsee(code) => {
                write!(f, "'{}' is not a 5-digit INSEE commune code", code)
            }
            ValidationError::InvalidSiren(code) => {
                write!(f, "'{}' is not a 9-digit SIREN", code)
            }
            ValidationError::MissingSiren => {
                write!(f, "A PLUi document requires a sirenEpci")
            }
            ValidationError::InvalidNiveau { id_titre, niveau } => {
                write!(
                    f,
                    "Titre '{}' has niveau {} (must be 1..={})",
                    id_titre, niveau, MAX_NIVEAU
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check every import invariant on a parsed document.
pub fn validate_document(doc: &PluDocument) -> Result<(), ValidationError> {
    if doc.id_reglement.trim().is_empty() {
        return Err(ValidationError::MissingField("idReglement"));
    }
    if doc.nom.trim().is_empty() {
        return Err(ValidationError::MissingField("nom"));
    }
    if !doc.id_urba.is_empty() {
        let expected = ids::reglement_id(&doc.id_urba);
        if doc.id_reglement != expected {
            return Err(ValidationError::IdMismatch {
                expected,
                found: doc.id_reglement.clone(),
            });
        }
    }
    for code in &doc.insee_commune {
        if !ids::is_valid_insee(code) {
            return Err(ValidationError::InvalidInsee(code.clone()));
        }
    }
    match (&doc.type_doc, &doc.siren_epci) {
        (DocType::Plui, None) => return Err(ValidationError::MissingSiren),
        (_, Some(siren)) if !ids::is_valid_siren(siren) => {
            return Err(ValidationError::InvalidSiren(siren.clone()));
        }
        _ => {}
    }
    for titre in doc.iter_titres() {
        validate_titre(titre)?;
    }
    Ok(())
}

fn validate_titre(titre: &Titre) -> Result<(), ValidationError> {
    if titre.niveau == 0 || titre.niveau > MAX_NIVEAU {
        return Err(ValidationError::InvalidNiveau {
            id_titre: titre.id_titre.clone(),
            niveau: titre.niveau,
        });
    }
    Ok(())
}
