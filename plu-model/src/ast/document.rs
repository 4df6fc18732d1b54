//! Règlement document
//!
//!     The aggregate root. A document carries its identity (idUrba encodes
//!     commune-or-siren + document type + date, idReglement is derived from
//!     it), the list of communes it covers, and the ordered tree of root
//!     titres.
//!
//! Identity invariant
//!
//!     idReglement == idUrba + "/reglement"
//!
//!     The derivation is centralized in [`crate::ids::reglement_id`]; the
//!     cascade rename in plu-engine rewrites the whole tree whenever the
//!     prefix changes.

use super::titre::Titre;
use crate::ids;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of the planning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "PLU")]
    Plu,
    #[serde(rename = "PLUi")]
    Plui,
    #[serde(rename = "PSMV")]
    Psmv,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Plu => "PLU",
            DocType::Plui => "PLUi",
            DocType::Psmv => "PSMV",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PLU" => Some(DocType::Plu),
            "PLUi" => Some(DocType::Plui),
            "PSMV" => Some(DocType::Psmv),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A règlement document: identity, covered communes, and the titre tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluDocument {
    pub id_reglement: String,
    pub nom: String,
    pub type_doc: DocType,
    #[serde(default)]
    pub id_urba: String,
    /// 5-digit commune codes, order preserving.
    #[serde(default)]
    pub insee_commune: Vec<String>,
    /// 9-digit EPCI identifier, required for PLUi documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siren_epci: Option<String>,
    #[serde(default)]
    pub titres: Vec<Titre>,
}

impl PluDocument {
    pub fn new(id_urba: impl Into<String>, nom: impl Into<String>, type_doc: DocType) -> Self {
        let id_urba = id_urba.into();
        Self {
            id_reglement: ids::reglement_id(&id_urba),
            nom: nom.into(),
            type_doc,
            id_urba,
            insee_commune: Vec::new(),
            siren_epci: None,
            titres: Vec::new(),
        }
    }

    /// Preferred builder
    pub fn with_communes(mut self, insee: Vec<String>) -> Self {
        self.insee_commune = insee;
        self
    }

    pub fn with_siren(mut self, siren: impl Into<String>) -> Self {
        self.siren_epci = Some(siren.into());
        self
    }

    /// Parse a document from its JSON wire form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Iterate every titre in the tree, depth-first pre-order.
    pub fn iter_titres(&self) -> impl Iterator<Item = &Titre> {
        fn walk<'a>(titres: &'a [Titre], out: &mut Vec<&'a Titre>) {
            for titre in titres {
                out.push(titre);
                walk(&titre.titres, out);
            }
        }
        let mut all = Vec::new();
        walk(&self.titres, &mut all);
        all.into_iter()
    }

    /// Total number of titres in the tree.
    pub fn titre_count(&self) -> usize {
        self.iter_titres().count()
    }
}

impl fmt::Display for PluDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({} titres)",
            self.type_doc,
            self.nom,
            self.titres.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_id_reglement_from_id_urba() {
        let doc = PluDocument::new("14027_PLU_20240101", "Règlement", DocType::Plu);
        assert_eq!(doc.id_reglement, "14027_PLU_20240101/reglement");
    }

    #[test]
    fn doc_type_serializes_to_official_labels() {
        assert_eq!(serde_json::to_string(&DocType::Plui).unwrap(), "\"PLUi\"");
        assert_eq!(DocType::parse("PSMV"), Some(DocType::Psmv));
        assert_eq!(DocType::parse("plu"), None);
    }

    #[test]
    fn json_round_trip_uses_camel_case() {
        let doc = PluDocument::new("14027_PLU_20240101", "Règlement", DocType::Plu)
            .with_communes(vec!["14027".to_string()]);
        let json = doc.to_json_string().unwrap();
        assert!(json.contains("\"idReglement\""));
        assert!(json.contains("\"typeDoc\":\"PLU\""));
        assert!(json.contains("\"inseeCommune\""));
        let back = PluDocument::from_json_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn missing_required_fields_fail_to_parse() {
        let json = r#"{"nom":"x","typeDoc":"PLU"}"#;
        assert!(PluDocument::from_json_str(json).is_err());
    }

    #[test]
    fn iter_titres_is_pre_order() {
        use crate::ast::titre::Titre;
        let mut doc = PluDocument::new("14027_PLU_20240101", "Règlement", DocType::Plu);
        let mut root = Titre::new("a", "A", 1);
        root.titres.push(Titre::new("a/b", "B", 2));
        doc.titres.push(root);
        doc.titres.push(Titre::new("c", "C", 1));
        let ids: Vec<&str> = doc.iter_titres().map(|t| t.id_titre.as_str()).collect();
        assert_eq!(ids, vec!["a", "a/b", "c"]);
    }
}
