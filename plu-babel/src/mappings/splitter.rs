//! Content splitter
//!
//!     A single editing session can produce several contenus at once: a
//!     paragraph holding exactly `***` (after trimming) acts as a separator
//!     between parts. Only the top-level block list is scanned; a `***`
//!     inside a list item or table cell is ordinary text.
//!
//! Edge rules
//!
//!     - No separator at all: the input comes back verbatim as the sole
//!       part, even when it is empty.
//!     - Separators are never part of any output, and empty parts are
//!       dropped, so `[P("***")]` alone yields zero parts.

use crate::rich::nodes::{kinds, RichDoc, RichNode};

/// The literal separator paragraph content.
pub const SPLIT_SEPARATOR: &str = "***";

/// Partition a rich document at separator paragraphs.
pub fn split_rich_doc(doc: &RichDoc) -> Vec<RichDoc> {
    if !doc.content.iter().any(is_separator) {
        return vec![doc.clone()];
    }

    let mut parts = Vec::new();
    let mut current: Vec<RichNode> = Vec::new();
    for block in &doc.content {
        if is_separator(block) {
            if !current.is_empty() {
                parts.push(RichDoc::new(std::mem::take(&mut current)));
            }
        } else {
            current.push(block.clone());
        }
    }
    if !current.is_empty() {
        parts.push(RichDoc::new(current));
    }
    parts
}

fn is_separator(block: &RichNode) -> bool {
    if !block.is_kind(kinds::PARAGRAPH) {
        return false;
    }
    let children = block.children();
    let all_plain_text = children
        .iter()
        .all(|child| child.is_kind(kinds::TEXT) && child.mark_list().is_empty());
    if children.is_empty() || !all_plain_text {
        return false;
    }
    let joined: String = children.iter().map(RichNode::plain_text).collect();
    joined.trim() == SPLIT_SEPARATOR
}
