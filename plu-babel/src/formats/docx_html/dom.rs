//! Generic element view over parsed HTML
//!
//!     The import logic wants "an element with a tag name, attributes,
//!     ordered children, and text content" and nothing more. This module
//!     owns the only html5ever-facing code: it parses the input and copies
//!     the body into that plain shape so the recursive descent in
//!     [`super::parser`] stays pure tree logic.

use crate::error::ImportError;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::BTreeMap;

/// One node of the imported HTML: an element or a text chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportNode {
    Element(ImportElement),
    Text(String),
}

/// An element with tag name, attributes and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<ImportNode>,
}

impl ImportElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Heading level for `h1`..`h6` tags.
    pub fn heading_level(&self) -> Option<u8> {
        let rest = self.tag.strip_prefix('h')?;
        match rest.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }
}

fn collect_text(nodes: &[ImportNode], out: &mut String) {
    for node in nodes {
        match node {
            ImportNode::Text(text) => out.push_str(text),
            ImportNode::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// Parse an HTML string and return the body's children as import nodes.
pub fn parse_body(html: &str) -> Result<Vec<ImportNode>, ImportError> {
    let mut input = html.as_bytes();
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut input)
        .map_err(|err| ImportError::Parse(err.to_string()))?;

    let Some(body) = find_element(&dom.document, "body") else {
        return Err(ImportError::Parse("no body element".to_string()));
    };
    Ok(convert_children(&body))
}

fn find_element(handle: &Handle, wanted: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if name.local.as_ref() == wanted {
            return Some(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_element(child, wanted) {
            return Some(found);
        }
    }
    None
}

fn convert_children(handle: &Handle) -> Vec<ImportNode> {
    let mut nodes = Vec::new();
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|attr| {
                        (
                            attr.name.local.as_ref().to_string(),
                            attr.value.to_string(),
                        )
                    })
                    .collect();
                nodes.push(ImportNode::Element(ImportElement {
                    tag: name.local.as_ref().to_string(),
                    attrs,
                    children: convert_children(child),
                }));
            }
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.trim().is_empty() {
                    nodes.push(ImportNode::Text(text));
                }
            }
            // Comments, doctype, processing instructions: nothing to import.
            _ => {}
        }
    }
    nodes
}
