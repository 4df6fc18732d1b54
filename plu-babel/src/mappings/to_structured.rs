//! Rich document → structured HTML
//!
//!     Block types map 1:1 onto the storage vocabulary; inline runs collapse
//!     to a bare `text` payload whenever nothing (marks, breaks) would be
//!     lost, and wrap into mark chains otherwise. Embedded images are
//!     rewritten to `ressources/<name>` references when the document's
//!     store holds a byte-identical blob.
//!
//!     Conversion never fails outward: unknown blocks degrade to a `div`
//!     wrapper or are dropped, malformed input yields an empty result, and
//!     every degradation is logged.

use crate::images::{rewrite_embedded_src, ImageStore};
use crate::mappings::marks::wrap_marks;
use crate::rich::nodes::{kinds, RichDoc, RichNode};
use plu_model::{HtmlElement, HtmlNode};

/// Convert the editor's document into the structured-HTML array stored on
/// a contenu.
pub fn to_structured(rich: &RichDoc, store: &dyn ImageStore, scope: &str) -> Vec<HtmlNode> {
    if rich.kind != kinds::DOC {
        log::warn!("rich document root has kind '{}', expected 'doc'", rich.kind);
        return Vec::new();
    }
    rich.content
        .iter()
        .filter_map(|node| convert_block(node, store, scope))
        .collect()
}

fn convert_block(node: &RichNode, store: &dyn ImageStore, scope: &str) -> Option<HtmlNode> {
    match node.kind.as_str() {
        kinds::PARAGRAPH => Some(HtmlNode::Element(inline_block("p", node.children(), store, scope))),
        kinds::HEADING => {
            let tag = format!("h{}", node.heading_level());
            Some(HtmlNode::Element(inline_block(&tag, node.children(), store, scope)))
        }
        kinds::BULLET_LIST => Some(list_element("ul", node, store, scope)),
        kinds::ORDERED_LIST => Some(list_element("ol", node, store, scope)),
        kinds::LIST_ITEM => Some(HtmlNode::Element(container_element(
            "li",
            node.children(),
            store,
            scope,
        ))),
        kinds::TABLE => {
            let rows = node
                .children()
                .iter()
                .filter_map(|row| convert_row(row, store, scope))
                .collect();
            Some(HtmlNode::Element(HtmlElement::with_children("table", rows)))
        }
        kinds::IMAGE => convert_image(node, store, scope),
        kinds::HARD_BREAK => Some(HtmlNode::Element(HtmlElement::void("br"))),
        kinds::TEXT => Some(wrap_marks(node.text.as_deref().unwrap_or(""), node.mark_list())),
        other => {
            let children: Vec<HtmlNode> = node
                .children()
                .iter()
                .filter_map(|child| convert_block(child, store, scope))
                .collect();
            if children.is_empty() {
                log::warn!("dropping unknown childless block '{}'", other);
                None
            } else {
                log::warn!("unknown block '{}' degraded to div", other);
                Some(HtmlNode::Element(HtmlElement::with_children("div", children)))
            }
        }
    }
}

fn list_element(tag: &str, node: &RichNode, store: &dyn ImageStore, scope: &str) -> HtmlNode {
    let items = node
        .children()
        .iter()
        .filter_map(|item| {
            if item.is_kind(kinds::LIST_ITEM) {
                Some(HtmlNode::Element(container_element(
                    "li",
                    item.children(),
                    store,
                    scope,
                )))
            } else {
                convert_block(item, store, scope)
            }
        })
        .collect();
    HtmlNode::Element(HtmlElement::with_children(tag, items))
}

fn convert_row(row: &RichNode, store: &dyn ImageStore, scope: &str) -> Option<HtmlNode> {
    if !row.is_kind(kinds::TABLE_ROW) {
        log::warn!("dropping non-row '{}' inside table", row.kind);
        return None;
    }
    let cells = row
        .children()
        .iter()
        .filter_map(|cell| {
            let tag = match cell.kind.as_str() {
                kinds::TABLE_CELL => "td",
                kinds::TABLE_HEADER => "th",
                other => {
                    log::warn!("dropping non-cell '{}' inside table row", other);
                    return None;
                }
            };
            Some(HtmlNode::Element(container_element(
                tag,
                cell.children(),
                store,
                scope,
            )))
        })
        .collect();
    Some(HtmlNode::Element(HtmlElement::with_children("tr", cells)))
}

fn convert_image(node: &RichNode, store: &dyn ImageStore, scope: &str) -> Option<HtmlNode> {
    let Some(src) = node.attr_str("src") else {
        log::warn!("dropping image block without src");
        return None;
    };
    let src = rewrite_embedded_src(src, store, scope);
    Some(HtmlNode::Element(HtmlElement::img(src, node.attr_str("alt"))))
}

/// A block whose children are inline runs: collapse to a single text
/// payload when nothing would be lost, else emit mixed children.
fn inline_block(tag: &str, children: &[RichNode], store: &dyn ImageStore, scope: &str) -> HtmlElement {
    let collapsible = children
        .iter()
        .all(|child| child.is_kind(kinds::TEXT) && child.mark_list().is_empty());
    if collapsible {
        let joined: String = children.iter().map(RichNode::plain_text).collect();
        return HtmlElement::with_text(tag, joined);
    }

    let mut nodes = Vec::new();
    for child in children {
        match child.kind.as_str() {
            kinds::TEXT => {
                nodes.push(wrap_marks(child.text.as_deref().unwrap_or(""), child.mark_list()));
            }
            kinds::HARD_BREAK => nodes.push(HtmlNode::Element(HtmlElement::void("br"))),
            kinds::IMAGE => {
                if let Some(image) = convert_image(child, store, scope) {
                    nodes.push(image);
                }
            }
            other => {
                log::warn!("inline run of kind '{}' reduced to its text", other);
                let text = child.plain_text();
                if !text.is_empty() {
                    nodes.push(HtmlNode::Text(text));
                }
            }
        }
    }
    HtmlElement::with_children(tag, nodes)
}

/// A block whose children are themselves blocks (list items, table cells).
/// A single all-plain paragraph reduces to a bare text payload so that
/// `<li>texte</li>` stays flat in storage.
fn container_element(
    tag: &str,
    children: &[RichNode],
    store: &dyn ImageStore,
    scope: &str,
) -> HtmlElement {
    let converted: Vec<HtmlNode> = children
        .iter()
        .filter_map(|child| convert_block(child, store, scope))
        .collect();

    if converted.len() == 1 {
        if let HtmlNode::Element(element) = &converted[0] {
            if element.is_tag("p") && element.attrs.is_none() {
                if let Some(text) = &element.text {
                    return HtmlElement::with_text(tag, text.clone());
                }
            }
        }
    }
    HtmlElement::with_children(tag, converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{to_data_url, ImageStore as _, MemoryImageStore};
    use crate::rich::nodes::Mark;

    const SCOPE: &str = "doc/reglement";

    fn store() -> MemoryImageStore {
        MemoryImageStore::new()
    }

    fn doc(content: Vec<RichNode>) -> RichDoc {
        RichDoc::new(content)
    }

    #[test]
    fn empty_document_converts_to_empty_array() {
        assert!(to_structured(&RichDoc::empty(), &store(), SCOPE).is_empty());
    }

    #[test]
    fn non_doc_root_degrades_to_empty() {
        let mut rich = RichDoc::empty();
        rich.kind = "fragment".to_string();
        assert!(to_structured(&rich, &store(), SCOPE).is_empty());
    }

    #[test]
    fn plain_paragraph_collapses_to_text() {
        let rich = doc(vec![RichNode::paragraph(vec![RichNode::text("Bonjour")])]);
        let html = to_structured(&rich, &store(), SCOPE);
        assert_eq!(
            html,
            vec![HtmlNode::Element(HtmlElement::with_text("p", "Bonjour"))]
        );
    }

    #[test]
    fn marked_runs_become_wrapper_children() {
        let rich = doc(vec![RichNode::paragraph(vec![
            RichNode::text("un "),
            RichNode::text_with_marks("deux", vec![Mark::bold()]),
        ])]);
        let html = to_structured(&rich, &store(), SCOPE);
        let element = html[0].as_element().unwrap();
        assert_eq!(element.tag, "p");
        let children = element.children.as_ref().unwrap();
        assert_eq!(children[0], HtmlNode::Text("un ".to_string()));
        let strong = children[1].as_element().unwrap();
        assert_eq!(strong.tag, "strong");
        assert_eq!(strong.text.as_deref(), Some("deux"));
    }

    #[test]
    fn hard_break_prevents_collapse() {
        let rich = doc(vec![RichNode::paragraph(vec![
            RichNode::text("a"),
            RichNode::hard_break(),
            RichNode::text("b"),
        ])]);
        let html = to_structured(&rich, &store(), SCOPE);
        let children = html[0].as_element().unwrap().children.as_ref().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].as_element().unwrap().tag, "br");
    }

    #[test]
    fn heading_level_maps_to_tag() {
        let rich = doc(vec![RichNode::heading(3, vec![RichNode::text("Section")])]);
        let html = to_structured(&rich, &store(), SCOPE);
        assert_eq!(
            html,
            vec![HtmlNode::Element(HtmlElement::with_text("h3", "Section"))]
        );
    }

    #[test]
    fn list_items_reduce_single_plain_paragraphs() {
        let rich = doc(vec![RichNode::bullet_list(vec![
            RichNode::list_item(vec![RichNode::paragraph(vec![RichNode::text("un")])]),
            RichNode::list_item(vec![
                RichNode::paragraph(vec![RichNode::text("deux")]),
                RichNode::paragraph(vec![RichNode::text("suite")]),
            ]),
        ])]);
        let html = to_structured(&rich, &store(), SCOPE);
        let list = html[0].as_element().unwrap();
        assert_eq!(list.tag, "ul");
        let items = list.children.as_ref().unwrap();
        let first = items[0].as_element().unwrap();
        assert_eq!(first.text.as_deref(), Some("un"));
        let second = items[1].as_element().unwrap();
        assert_eq!(second.children.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn table_maps_rows_and_cells() {
        let rich = doc(vec![RichNode::table(vec![RichNode::table_row(vec![
            RichNode::table_header(vec![RichNode::paragraph(vec![RichNode::text("Zone")])]),
            RichNode::table_cell(vec![RichNode::paragraph(vec![RichNode::text("Ua")])]),
        ])])]);
        let html = to_structured(&rich, &store(), SCOPE);
        let table = html[0].as_element().unwrap();
        let row = table.children.as_ref().unwrap()[0].as_element().unwrap();
        assert_eq!(row.tag, "tr");
        let cells = row.children.as_ref().unwrap();
        assert_eq!(cells[0].as_element().unwrap().tag, "th");
        assert_eq!(cells[0].as_element().unwrap().text.as_deref(), Some("Zone"));
        assert_eq!(cells[1].as_element().unwrap().tag, "td");
    }

    #[test]
    fn embedded_image_rewrites_to_resource_reference() {
        let mut images = MemoryImageStore::new();
        images.store(SCOPE, "plan.png", "image/png", &[1, 2, 3]).unwrap();
        let rich = doc(vec![RichNode::image(
            to_data_url("image/png", &[1, 2, 3]),
            Some("plan"),
        )]);
        let html = to_structured(&rich, &images, SCOPE);
        let img = html[0].as_element().unwrap();
        assert_eq!(img.get_attr("src"), Some("ressources/plan.png"));
        assert_eq!(img.get_attr("alt"), Some("plan"));
    }

    #[test]
    fn unmatched_embedded_image_keeps_data_url() {
        let url = to_data_url("image/png", &[4, 5, 6]);
        let rich = doc(vec![RichNode::image(url.clone(), None)]);
        let html = to_structured(&rich, &store(), SCOPE);
        assert_eq!(html[0].as_element().unwrap().get_attr("src"), Some(url.as_str()));
    }

    #[test]
    fn unknown_block_with_children_degrades_to_div() {
        let mut unknown = RichNode::paragraph(vec![RichNode::text("x")]);
        unknown.kind = "callout".to_string();
        let rich = doc(vec![RichNode {
            kind: "wrapper".to_string(),
            attrs: None,
            content: Some(vec![unknown]),
            marks: None,
            text: None,
        }]);
        let html = to_structured(&rich, &store(), SCOPE);
        let div = html[0].as_element().unwrap();
        assert_eq!(div.tag, "div");
        // The inner unknown block itself degraded to a div holding the paragraph.
        let inner = div.children.as_ref().unwrap()[0].as_element().unwrap();
        assert_eq!(inner.tag, "div");
    }

    #[test]
    fn unknown_childless_block_is_dropped() {
        let rich = doc(vec![RichNode {
            kind: "horizontalRule".to_string(),
            attrs: None,
            content: None,
            marks: None,
            text: None,
        }]);
        assert!(to_structured(&rich, &store(), SCOPE).is_empty());
    }
}
