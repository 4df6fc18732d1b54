//! Structured HTML → rich document
//!
//!     The inverse mapping. Bare strings and text payloads are re-parsed for
//!     the restricted markup subset, wrapper chains fold back into mark
//!     lists, and `ressources/<name>` image references are rehydrated from
//!     the document's store.
//!
//! Known lossy cases
//!
//!     - A paragraph whose only non-empty children are images: a single
//!       image is promoted to a top-level image block (the editor forbids
//!       block images inside paragraphs); with several images, only text
//!       and line-break children survive.
//!     - A `ressources/` reference with no stored blob passes through
//!       unresolved; the editor cannot render it.

use crate::images::{rehydrate_resource_src, ImageStore};
use crate::mappings::marks::{parse_inline_markup, runs_to_rich, unwrap_marked_element};
use crate::rich::nodes::{RichDoc, RichNode};
use plu_model::{HtmlElement, HtmlNode};

/// Convert a contenu's structured-HTML array back into an editor document.
pub fn from_structured(nodes: &[HtmlNode], store: &dyn ImageStore, scope: &str) -> RichDoc {
    RichDoc::new(blocks_from_nodes(nodes, store, scope))
}

fn blocks_from_nodes(nodes: &[HtmlNode], store: &dyn ImageStore, scope: &str) -> Vec<RichNode> {
    let mut blocks = Vec::new();
    for node in nodes {
        convert_node(node, &mut blocks, store, scope);
    }
    blocks
}

fn convert_node(node: &HtmlNode, out: &mut Vec<RichNode>, store: &dyn ImageStore, scope: &str) {
    let element = match node {
        HtmlNode::Text(text) => {
            out.push(RichNode::paragraph(runs_to_rich(parse_inline_markup(text))));
            return;
        }
        HtmlNode::Element(element) => element,
    };

    if let Some(level) = element.heading_level() {
        out.push(RichNode::heading(level, inline_content(element, store, scope)));
        return;
    }

    match element.tag.as_str() {
        "p" => convert_paragraph(element, out, store, scope),
        "ul" => out.push(RichNode::bullet_list(list_items(element, store, scope))),
        "ol" => out.push(RichNode::ordered_list(list_items(element, store, scope))),
        "table" => out.push(convert_table(element, store, scope)),
        "img" => out.push(convert_image(element, store, scope)),
        "br" => out.push(RichNode::paragraph(vec![RichNode::hard_break()])),
        "div" => {
            // Degraded wrapper from the outbound direction: unwrap in place.
            for child in element.children.as_deref().unwrap_or(&[]) {
                convert_node(child, out, store, scope);
            }
            if let Some(text) = &element.text {
                out.push(RichNode::paragraph(runs_to_rich(parse_inline_markup(text))));
            }
        }
        "strong" | "em" | "u" | "a" | "span" => {
            // Inline content stranded at block level: wrap it in a paragraph.
            out.push(RichNode::paragraph(inline_nodes(
                std::slice::from_ref(node),
                store,
                scope,
            )));
        }
        "thead" | "tbody" | "tr" | "td" | "th" | "li" => {
            log::warn!("stray '{}' outside its container, unwrapping", element.tag);
            out.extend(mixed_children(element, store, scope));
        }
        other => {
            if element.children.is_some() {
                log::warn!("unknown tag '{}', recursing into children", other);
                for child in element.children.as_deref().unwrap_or(&[]) {
                    convert_node(child, out, store, scope);
                }
            } else if let Some(text) = &element.text {
                log::warn!("unknown tag '{}' stripped to text", other);
                out.push(RichNode::paragraph(runs_to_rich(parse_inline_markup(text))));
            } else {
                log::warn!("dropping empty unknown tag '{}'", other);
            }
        }
    }
}

fn convert_paragraph(
    element: &HtmlElement,
    out: &mut Vec<RichNode>,
    store: &dyn ImageStore,
    scope: &str,
) {
    let Some(children) = &element.children else {
        let text = element.text.as_deref().unwrap_or("");
        out.push(RichNode::paragraph(runs_to_rich(parse_inline_markup(text))));
        return;
    };

    let non_empty: Vec<&HtmlNode> = children
        .iter()
        .filter(|child| match child {
            HtmlNode::Text(text) => !text.trim().is_empty(),
            HtmlNode::Element(_) => true,
        })
        .collect();
    let images: Vec<&HtmlElement> = non_empty
        .iter()
        .filter_map(|child| child.as_element())
        .filter(|child| child.is_tag("img"))
        .collect();

    if !images.is_empty() && images.len() == non_empty.len() {
        if images.len() == 1 {
            // The editor forbids block images inside paragraph content, so a
            // lone wrapped image is promoted to a top-level image block.
            out.push(convert_image(images[0], store, scope));
        } else {
            log::warn!("paragraph with {} images: images dropped", images.len());
            let kept: Vec<HtmlNode> = children
                .iter()
                .filter(|child| !matches!(child, HtmlNode::Element(e) if e.is_tag("img")))
                .cloned()
                .collect();
            out.push(RichNode::paragraph(inline_nodes(&kept, store, scope)));
        }
        return;
    }

    out.push(RichNode::paragraph(inline_nodes(children, store, scope)));
}

/// Inline content of a text-or-children element.
fn inline_content(element: &HtmlElement, store: &dyn ImageStore, scope: &str) -> Vec<RichNode> {
    if let Some(text) = &element.text {
        return runs_to_rich(parse_inline_markup(text));
    }
    inline_nodes(element.children.as_deref().unwrap_or(&[]), store, scope)
}

fn inline_nodes(children: &[HtmlNode], _store: &dyn ImageStore, _scope: &str) -> Vec<RichNode> {
    let mut runs = Vec::new();
    for child in children {
        match child {
            HtmlNode::Text(text) => runs.extend(runs_to_rich(parse_inline_markup(text))),
            HtmlNode::Element(element) if element.is_tag("br") => {
                runs.push(RichNode::hard_break());
            }
            HtmlNode::Element(element) if element.is_tag("img") => {
                log::warn!("image inside mixed paragraph content dropped");
            }
            HtmlNode::Element(element) => match unwrap_marked_element(element) {
                Some(marked) => runs.extend(runs_to_rich(marked)),
                None => {
                    let text = child.plain_text();
                    if !text.is_empty() {
                        log::warn!("inline '{}' stripped to text", element.tag);
                        runs.push(RichNode::text(text));
                    }
                }
            },
        }
    }
    runs
}

fn list_items(element: &HtmlElement, store: &dyn ImageStore, scope: &str) -> Vec<RichNode> {
    let mut items = Vec::new();
    for child in element.children.as_deref().unwrap_or(&[]) {
        match child {
            HtmlNode::Element(item) if item.is_tag("li") => {
                let content = if item.children.is_some() {
                    mixed_children(item, store, scope)
                } else {
                    let text = item.text.as_deref().unwrap_or("");
                    vec![RichNode::paragraph(runs_to_rich(parse_inline_markup(text)))]
                };
                items.push(RichNode::list_item(content));
            }
            HtmlNode::Text(text) if text.trim().is_empty() => {}
            other => {
                log::warn!("non-item inside list wrapped as its own item");
                let mut blocks = Vec::new();
                convert_node(other, &mut blocks, store, scope);
                if !blocks.is_empty() {
                    items.push(RichNode::list_item(blocks));
                }
            }
        }
    }
    items
}

fn convert_table(element: &HtmlElement, store: &dyn ImageStore, scope: &str) -> RichNode {
    let mut rows = Vec::new();
    collect_rows(element.children.as_deref().unwrap_or(&[]), &mut rows, store, scope);
    RichNode::table(rows)
}

fn collect_rows(nodes: &[HtmlNode], rows: &mut Vec<RichNode>, store: &dyn ImageStore, scope: &str) {
    for node in nodes {
        let Some(element) = node.as_element() else {
            continue;
        };
        match element.tag.as_str() {
            // Section wrappers have no counterpart in the editor model.
            "thead" | "tbody" => {
                collect_rows(element.children.as_deref().unwrap_or(&[]), rows, store, scope)
            }
            "tr" => rows.push(convert_row(element, store, scope)),
            other => log::warn!("dropping '{}' inside table", other),
        }
    }
}

fn convert_row(row: &HtmlElement, store: &dyn ImageStore, scope: &str) -> RichNode {
    let mut cells = Vec::new();
    for node in row.children.as_deref().unwrap_or(&[]) {
        let Some(element) = node.as_element() else {
            continue;
        };
        let make: fn(Vec<RichNode>) -> RichNode = match element.tag.as_str() {
            "td" => RichNode::table_cell,
            "th" => RichNode::table_header,
            other => {
                log::warn!("dropping '{}' inside table row", other);
                continue;
            }
        };
        let content = if element.children.is_some() {
            mixed_children(element, store, scope)
        } else {
            let text = element.text.as_deref().unwrap_or("");
            vec![RichNode::paragraph(runs_to_rich(parse_inline_markup(text)))]
        };
        cells.push(make(content));
    }
    RichNode::table_row(cells)
}

fn convert_image(element: &HtmlElement, store: &dyn ImageStore, scope: &str) -> RichNode {
    let src = element.get_attr("src").unwrap_or_default();
    let src = rehydrate_resource_src(src, store, scope);
    RichNode::image(src, element.get_attr("alt"))
}

/// Children that may mix inline runs with nested blocks (list items, table
/// cells, stray containers): consecutive inline nodes group into one
/// paragraph, block nodes convert in place.
fn mixed_children(element: &HtmlElement, store: &dyn ImageStore, scope: &str) -> Vec<RichNode> {
    let mut blocks = Vec::new();
    let mut inline_group: Vec<HtmlNode> = Vec::new();

    let flush = |group: &mut Vec<HtmlNode>, blocks: &mut Vec<RichNode>| {
        if group.is_empty() {
            return;
        }
        let runs = inline_nodes(group, store, scope);
        group.clear();
        if !runs.is_empty() {
            blocks.push(RichNode::paragraph(runs));
        }
    };

    for child in element.children.as_deref().unwrap_or(&[]) {
        if is_inline(child) {
            inline_group.push(child.clone());
        } else {
            flush(&mut inline_group, &mut blocks);
            convert_node(child, &mut blocks, store, scope);
        }
    }
    flush(&mut inline_group, &mut blocks);

    if blocks.is_empty() {
        if let Some(text) = &element.text {
            blocks.push(RichNode::paragraph(runs_to_rich(parse_inline_markup(text))));
        }
    }
    blocks
}

fn is_inline(node: &HtmlNode) -> bool {
    match node {
        HtmlNode::Text(_) => true,
        HtmlNode::Element(element) => {
            matches!(element.tag.as_str(), "strong" | "em" | "u" | "a" | "span" | "br")
        }
    }
}
