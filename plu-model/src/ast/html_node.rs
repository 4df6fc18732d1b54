//! Structured-HTML payload nodes
//!
//!     A contenu's `html` field is an ordered list of nodes in a restricted,
//!     storage-friendly HTML shape: either a bare string (plain text) or a
//!     tagged element carrying exactly one of `text` or `children`, plus
//!     optional attributes. This is the persisted counterpart of the rich
//!     editor's document tree; plu-babel maps between the two.
//!
//!     The tag vocabulary is closed. Anything outside it is produced only by
//!     the `div` degradation path of the converter and is tolerated on read.
//!
//! Invariants
//!
//!     - `img` and `br` carry neither text nor children.
//!     - `text` and `children` are mutually exclusive on every element.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tags the converter is allowed to emit (plus `div` as degradation target).
pub const SUPPORTED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "strong", "em", "u", "span", "a",
    "img", "table", "thead", "tbody", "tr", "td", "th", "br", "div",
];

/// One node of structured-HTML content: bare text or a tagged element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HtmlNode {
    Text(String),
    Element(HtmlElement),
}

/// A tagged structured-HTML element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<HtmlNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, String>>,
}

impl HtmlElement {
    /// Element holding a single plain-text payload.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            children: None,
            attrs: None,
        }
    }

    /// Element holding nested children.
    pub fn with_children(tag: impl Into<String>, children: Vec<HtmlNode>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: Some(children),
            attrs: None,
        }
    }

    /// Void element (`br`, childless `img` before attrs are attached).
    pub fn void(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: None,
            attrs: None,
        }
    }

    /// An image element with `src` and optional `alt`.
    pub fn img(src: impl Into<String>, alt: Option<&str>) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert("src".to_string(), src.into());
        if let Some(alt) = alt {
            attrs.insert("alt".to_string(), alt.to_string());
        }
        Self {
            tag: "img".to_string(),
            text: None,
            children: None,
            attrs: Some(attrs),
        }
    }

    /// Attach an attribute, preserving the builder chain.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Attribute lookup.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .as_ref()
            .and_then(|attrs| attrs.get(name))
            .map(String::as_str)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Heading level for `h1`..`h6`, None otherwise.
    pub fn heading_level(&self) -> Option<u8> {
        let rest = self.tag.strip_prefix('h')?;
        match rest.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }
}

impl HtmlNode {
    pub fn text(value: impl Into<String>) -> Self {
        HtmlNode::Text(value.into())
    }

    pub fn element(element: HtmlElement) -> Self {
        HtmlNode::Element(element)
    }

    pub fn as_element(&self) -> Option<&HtmlElement> {
        match self {
            HtmlNode::Element(element) => Some(element),
            HtmlNode::Text(_) => None,
        }
    }

    /// Whether this node is a supported-vocabulary node.
    pub fn is_supported(&self) -> bool {
        match self {
            HtmlNode::Text(_) => true,
            HtmlNode::Element(element) => SUPPORTED_TAGS.contains(&element.tag.as_str()),
        }
    }

    /// Concatenated plain text of this node, markup stripped.
    pub fn plain_text(&self) -> String {
        match self {
            HtmlNode::Text(text) => text.clone(),
            HtmlNode::Element(element) => {
                if let Some(text) = &element.text {
                    text.clone()
                } else if let Some(children) = &element.children {
                    children.iter().map(HtmlNode::plain_text).collect()
                } else {
                    String::new()
                }
            }
        }
    }
}

impl fmt::Display for HtmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HtmlNode::Text(text) => write!(f, "\"{}\"", text),
            HtmlNode::Element(element) => write!(f, "<{}>", element.tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_round_trips_as_json_string() {
        let node = HtmlNode::text("hello");
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, "\"hello\"");
        let back: HtmlNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn element_round_trips_without_empty_fields() {
        let node = HtmlNode::Element(HtmlElement::with_text("p", "Bonjour"));
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"tag":"p","text":"Bonjour"}"#);
        let back: HtmlNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn img_carries_attrs_only() {
        let node = HtmlElement::img("ressources/plan.png", Some("plan"));
        assert_eq!(node.get_attr("src"), Some("ressources/plan.png"));
        assert_eq!(node.get_attr("alt"), Some("plan"));
        assert!(node.text.is_none());
        assert!(node.children.is_none());
    }

    #[test]
    fn heading_level_parses_only_h1_to_h6() {
        assert_eq!(HtmlElement::void("h1").heading_level(), Some(1));
        assert_eq!(HtmlElement::void("h6").heading_level(), Some(6));
        assert_eq!(HtmlElement::void("h7").heading_level(), None);
        assert_eq!(HtmlElement::void("p").heading_level(), None);
    }

    #[test]
    fn plain_text_strips_markup() {
        let node = HtmlNode::Element(HtmlElement::with_children(
            "p",
            vec![
                HtmlNode::text("un "),
                HtmlNode::Element(HtmlElement::with_text("strong", "deux")),
            ],
        ));
        assert_eq!(node.plain_text(), "un deux");
    }
}
