//! Rich document nodes
//!
//!     The editor's native document is a root node with an ordered list of
//!     block nodes; blocks hold either nested blocks or inline text runs
//!     with attached formatting marks. Node and mark kinds are open strings
//!     on the wire (the editor is free to grow vocabulary we do not know),
//!     so the model keeps them as strings and the converter degrades
//!     gracefully on unknown kinds.
//!
//! Known vocabulary
//!
//!     Blocks: paragraph, heading(level), bulletList, orderedList, listItem,
//!     table, tableRow, tableCell, tableHeader, image(src, alt), hardBreak.
//!     Marks: bold, italic, underline, link(href).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Node kind names as they appear on the wire.
pub mod kinds {
    pub const DOC: &str = "doc";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const BULLET_LIST: &str = "bulletList";
    pub const ORDERED_LIST: &str = "orderedList";
    pub const LIST_ITEM: &str = "listItem";
    pub const TABLE: &str = "table";
    pub const TABLE_ROW: &str = "tableRow";
    pub const TABLE_CELL: &str = "tableCell";
    pub const TABLE_HEADER: &str = "tableHeader";
    pub const IMAGE: &str = "image";
    pub const HARD_BREAK: &str = "hardBreak";
    pub const TEXT: &str = "text";
}

/// Mark kind names as they appear on the wire.
pub mod mark_kinds {
    pub const BOLD: &str = "bold";
    pub const ITALIC: &str = "italic";
    pub const UNDERLINE: &str = "underline";
    pub const LINK: &str = "link";
}

/// The editor's document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichDoc {
    #[serde(rename = "type", default = "doc_kind")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<RichNode>,
}

fn doc_kind() -> String {
    kinds::DOC.to_string()
}

impl RichDoc {
    pub fn new(content: Vec<RichNode>) -> Self {
        Self {
            kind: doc_kind(),
            content,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// One node of the editor's tree: a block, an inline run, or anything the
/// editor invents that we pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<RichNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RichNode {
    fn block(kind: &str, content: Vec<RichNode>) -> Self {
        Self {
            kind: kind.to_string(),
            attrs: None,
            content: Some(content),
            marks: None,
            text: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: kinds::TEXT.to_string(),
            attrs: None,
            content: None,
            marks: None,
            text: Some(value.into()),
        }
    }

    pub fn text_with_marks(value: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            marks: if marks.is_empty() { None } else { Some(marks) },
            ..Self::text(value)
        }
    }

    pub fn paragraph(content: Vec<RichNode>) -> Self {
        Self::block(kinds::PARAGRAPH, content)
    }

    pub fn heading(level: u8, content: Vec<RichNode>) -> Self {
        let mut node = Self::block(kinds::HEADING, content);
        node.attrs
            .get_or_insert_with(BTreeMap::new)
            .insert("level".to_string(), Value::from(level));
        node
    }

    pub fn bullet_list(items: Vec<RichNode>) -> Self {
        Self::block(kinds::BULLET_LIST, items)
    }

    pub fn ordered_list(items: Vec<RichNode>) -> Self {
        Self::block(kinds::ORDERED_LIST, items)
    }

    pub fn list_item(content: Vec<RichNode>) -> Self {
        Self::block(kinds::LIST_ITEM, content)
    }

    pub fn table(rows: Vec<RichNode>) -> Self {
        Self::block(kinds::TABLE, rows)
    }

    pub fn table_row(cells: Vec<RichNode>) -> Self {
        Self::block(kinds::TABLE_ROW, cells)
    }

    pub fn table_cell(content: Vec<RichNode>) -> Self {
        Self::block(kinds::TABLE_CELL, content)
    }

    pub fn table_header(content: Vec<RichNode>) -> Self {
        Self::block(kinds::TABLE_HEADER, content)
    }

    pub fn image(src: impl Into<String>, alt: Option<&str>) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert("src".to_string(), Value::from(src.into()));
        if let Some(alt) = alt {
            attrs.insert("alt".to_string(), Value::from(alt));
        }
        Self {
            kind: kinds::IMAGE.to_string(),
            attrs: Some(attrs),
            content: None,
            marks: None,
            text: None,
        }
    }

    pub fn hard_break() -> Self {
        Self {
            kind: kinds::HARD_BREAK.to_string(),
            attrs: None,
            content: None,
            marks: None,
            text: None,
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Children of this node, empty when it has none.
    pub fn children(&self) -> &[RichNode] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Marks on this run, empty when it has none.
    pub fn mark_list(&self) -> &[Mark] {
        self.marks.as_deref().unwrap_or(&[])
    }

    /// String attribute lookup.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(name)?.as_str()
    }

    /// Heading level attribute, clamped to 1..=6, defaulting to 1.
    pub fn heading_level(&self) -> u8 {
        self.attrs
            .as_ref()
            .and_then(|attrs| attrs.get("level"))
            .and_then(Value::as_u64)
            .map(|level| level.clamp(1, 6) as u8)
            .unwrap_or(1)
    }

    /// Concatenated text of this node's inline content.
    pub fn plain_text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        self.children().iter().map(RichNode::plain_text).collect()
    }
}

/// A formatting mark attached to a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, Value>>,
}

impl Mark {
    pub fn bold() -> Self {
        Self {
            kind: mark_kinds::BOLD.to_string(),
            attrs: None,
        }
    }

    pub fn italic() -> Self {
        Self {
            kind: mark_kinds::ITALIC.to_string(),
            attrs: None,
        }
    }

    pub fn underline() -> Self {
        Self {
            kind: mark_kinds::UNDERLINE.to_string(),
            attrs: None,
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert("href".to_string(), Value::from(href.into()));
        Self {
            kind: mark_kinds::LINK.to_string(),
            attrs: Some(attrs),
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.attrs.as_ref()?.get("href")?.as_str()
    }
}
