//! Contenu element
//!
//!     A contenu is one block of structured rich text attached to a titre.
//!     Its id encodes its 1-based position in the owning titre's content list
//!     (`<base>/contenu01`, `<base>/contenu02`, ...) and must be re-derived
//!     after every structural change to that list; renumbering is always
//!     whole-list, never incremental.
//!
//!     Zone and prescription tags override the owning titre's when they
//!     differ by value; equal lists mean "inherited". The comparison is by
//!     value, never by reference.

use super::html_node::HtmlNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A content block attached to a titre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contenu {
    pub id_contenu: String,
    #[serde(default)]
    pub id_zone: Vec<String>,
    #[serde(default)]
    pub id_prescription: Vec<String>,
    #[serde(default)]
    pub html: Vec<HtmlNode>,
}

impl Contenu {
    pub fn new(id_contenu: impl Into<String>, html: Vec<HtmlNode>) -> Self {
        Self {
            id_contenu: id_contenu.into(),
            id_zone: Vec::new(),
            id_prescription: Vec::new(),
            html,
        }
    }

    /// Preferred builder
    pub fn with_tags(mut self, id_zone: Vec<String>, id_prescription: Vec<String>) -> Self {
        self.id_zone = id_zone;
        self.id_prescription = id_prescription;
        self
    }

    /// Whether this block's tags equal the owning titre's (inherited) rather
    /// than overriding them.
    pub fn inherits_tags(&self, titre_zone: &[String], titre_prescription: &[String]) -> bool {
        self.id_zone == titre_zone && self.id_prescription == titre_prescription
    }
}

impl fmt::Display for Contenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contenu('{}', {} nodes)", self.id_contenu, self.html.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::html_node::HtmlElement;

    #[test]
    fn inherits_tags_compares_by_value() {
        let zone = vec!["Ua".to_string()];
        let prescription = vec!["nonConcerne".to_string()];
        let contenu =
            Contenu::new("base/contenu01", vec![]).with_tags(zone.clone(), prescription.clone());
        assert!(contenu.inherits_tags(&zone, &prescription));
        assert!(!contenu.inherits_tags(&["Ub".to_string()], &prescription));
    }

    #[test]
    fn serde_round_trip_keeps_html_order() {
        let contenu = Contenu::new(
            "base/contenu01",
            vec![
                HtmlNode::Element(HtmlElement::with_text("p", "premier")),
                HtmlNode::text("deuxième"),
            ],
        );
        let json = serde_json::to_string(&contenu).unwrap();
        assert!(json.contains("\"idContenu\""));
        let back: Contenu = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contenu);
    }
}
