//! DOCX-HTML parsing (converted HTML → règlement import)
//!
//! # The Algorithm
//!
//! The converted HTML is a flat sequence: metadata paragraphs, then
//! headings interleaved with body content. Reconstruction uses a stack of
//! open titres, the same shape as any flat-to-nested conversion:
//!
//! 1. A heading at level L first closes every open titre at level >= L
//!    (attaching each to its parent, or to the root list), then opens a
//!    new titre at level L.
//! 2. Body content (paragraphs, lists, tables, images) converts to
//!    structured HTML and accumulates in the innermost open titre's
//!    single contenu.
//! 3. At end of input the stack drains into the root list.
//!
//! Ids are assigned in a final pass once the tree shape is known, so a
//! rejected import never leaves a half-built document behind.

use super::dom::{self, ImportElement, ImportNode};
use crate::error::ImportError;
use plu_model::ast::document::DocType;
use plu_model::ast::titre::MAX_NIVEAU;
use plu_model::{ids, validation, Contenu, HtmlElement, HtmlNode, PluDocument, Titre};
use std::collections::BTreeMap;

/// Metadata keys that must be present for an import to be accepted.
const REQUIRED_METADATA: [&str; 3] = ["nom", "idUrba", "typeDoc"];

/// Knobs for the import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Used when the metadata block omits `#typeDoc`; None keeps the key
    /// required.
    pub default_type_doc: Option<DocType>,
}

/// Import a DOCX-converted HTML string as a fresh règlement document.
pub fn import_docx_html(html: &str) -> Result<PluDocument, ImportError> {
    import_docx_html_with(html, &ImportOptions::default())
}

/// Import with explicit options.
pub fn import_docx_html_with(
    html: &str,
    options: &ImportOptions,
) -> Result<PluDocument, ImportError> {
    let nodes = dom::parse_body(html)?;

    let mut metadata: BTreeMap<String, String> = BTreeMap::new();
    let mut stack: Vec<Titre> = Vec::new();
    let mut roots: Vec<Titre> = Vec::new();
    let mut seen_heading = false;

    for node in &nodes {
        match node {
            ImportNode::Text(text) => {
                if !seen_heading {
                    parse_metadata_lines(text, &mut metadata);
                } else {
                    attach_content(&mut stack, HtmlNode::Text(text.trim().to_string()));
                }
            }
            ImportNode::Element(element) => {
                if let Some(level) = element.heading_level() {
                    seen_heading = true;
                    open_titre(&mut stack, &mut roots, level, element.text().trim());
                } else if !seen_heading {
                    let text = element.text();
                    if text.trim_start().starts_with('#') {
                        parse_metadata_lines(&text, &mut metadata);
                    } else if !text.trim().is_empty() {
                        log::warn!("content before the first heading skipped");
                    }
                } else {
                    for html_node in blocks_from_element(element) {
                        attach_content(&mut stack, html_node);
                    }
                }
            }
        }
    }
    while let Some(titre) = stack.pop() {
        attach_titre(&mut stack, &mut roots, titre);
    }

    let mut doc = document_from_metadata(&metadata, options)?;
    doc.titres = roots;
    let base = doc.id_reglement.clone();
    let insee = doc.insee_commune.clone();
    finalize(&mut doc.titres, &base, &insee);

    validation::validate_document(&doc)?;
    Ok(doc)
}

/// Parse `#key value` lines into the metadata map.
fn parse_metadata_lines(text: &str, metadata: &mut BTreeMap<String, String>) {
    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let rest = rest.trim();
        match rest.split_once(char::is_whitespace) {
            Some((key, value)) => {
                metadata.insert(key.to_string(), value.trim().to_string());
            }
            None if !rest.is_empty() => {
                metadata.insert(rest.to_string(), String::new());
            }
            None => {}
        }
    }
}

fn document_from_metadata(
    metadata: &BTreeMap<String, String>,
    options: &ImportOptions,
) -> Result<PluDocument, ImportError> {
    let missing: Vec<String> = REQUIRED_METADATA
        .iter()
        .filter(|key| metadata.get(**key).map_or(true, |value| value.is_empty()))
        .filter(|key| !(**key == "typeDoc" && options.default_type_doc.is_some()))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingMetadata(missing));
    }

    let type_doc = match metadata.get("typeDoc").filter(|label| !label.is_empty()) {
        Some(label) => DocType::parse(label).ok_or_else(|| ImportError::InvalidMetadata {
            key: "typeDoc".to_string(),
            message: format!("unknown document type '{}'", label),
        })?,
        None => options
            .default_type_doc
            .expect("missing typeDoc already rejected without a default"),
    };

    let mut doc = PluDocument::new(metadata["idUrba"].clone(), metadata["nom"].clone(), type_doc);
    if let Some(insee) = metadata.get("inseeCommune") {
        doc.insee_commune = insee
            .split([',', ' ', ';'])
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(siren) = metadata.get("sirenEpci") {
        if !siren.is_empty() {
            doc.siren_epci = Some(siren.clone());
        }
    }
    Ok(doc)
}

/// Close titres at the same or deeper level, then open a new one.
fn open_titre(stack: &mut Vec<Titre>, roots: &mut Vec<Titre>, level: u8, intitule: &str) {
    let niveau = level.min(MAX_NIVEAU);
    while stack
        .last()
        .map_or(false, |open| open.niveau >= niveau)
    {
        let closed = stack.pop().expect("stack checked non-empty");
        attach_titre(stack, roots, closed);
    }
    stack.push(Titre::new(String::new(), intitule, niveau));
}

fn attach_titre(stack: &mut [Titre], roots: &mut Vec<Titre>, titre: Titre) {
    match stack.last_mut() {
        Some(parent) => parent.titres.push(titre),
        None => roots.push(titre),
    }
}

/// Append a content node to the innermost open titre's contenu.
fn attach_content(stack: &mut [Titre], node: HtmlNode) {
    let Some(titre) = stack.last_mut() else {
        log::warn!("body content outside any titre skipped");
        return;
    };
    if titre.contenu.is_empty() {
        titre.contenu.push(Contenu::new(String::new(), Vec::new()));
    }
    let contenu = titre.contenu.last_mut().expect("contenu just ensured");
    contenu.html.push(node);
}

/// Convert a body element into zero or more structured-HTML nodes.
fn blocks_from_element(element: &ImportElement) -> Vec<HtmlNode> {
    match element.tag.as_str() {
        "p" => vec![HtmlNode::Element(inline_container("p", element))],
        "ul" | "ol" => vec![HtmlNode::Element(convert_list(element))],
        "table" => vec![HtmlNode::Element(convert_table(element))],
        "img" => convert_img(element).into_iter().collect(),
        "br" => vec![HtmlNode::Element(HtmlElement::void("br"))],
        // DOCX converters wrap runs of content in neutral containers.
        "div" | "section" | "blockquote" => element
            .children
            .iter()
            .flat_map(|child| match child {
                ImportNode::Element(inner) => blocks_from_element(inner),
                ImportNode::Text(text) if !text.trim().is_empty() => {
                    vec![HtmlNode::Text(text.trim().to_string())]
                }
                ImportNode::Text(_) => vec![],
            })
            .collect(),
        other => {
            let text = element.text();
            if text.trim().is_empty() {
                log::warn!("dropping empty '{}' during import", other);
                Vec::new()
            } else {
                log::warn!("'{}' flattened to a paragraph during import", other);
                vec![HtmlNode::Element(HtmlElement::with_text("p", text.trim()))]
            }
        }
    }
}

/// Inline conversion with the same collapse policy as the editor mapping:
/// all-plain content becomes a single text payload.
fn inline_container(tag: &str, element: &ImportElement) -> HtmlElement {
    let (all_plain, nodes) = convert_inline(&element.children);
    if all_plain {
        let joined: String = nodes.iter().map(HtmlNode::plain_text).collect();
        HtmlElement::with_text(tag, joined)
    } else {
        HtmlElement::with_children(tag, nodes)
    }
}

fn convert_inline(children: &[ImportNode]) -> (bool, Vec<HtmlNode>) {
    let mut all_plain = true;
    let mut nodes = Vec::new();
    for child in children {
        match child {
            ImportNode::Text(text) => nodes.push(HtmlNode::Text(text.clone())),
            ImportNode::Element(element) => {
                let wrapper = match element.tag.as_str() {
                    "strong" | "b" => Some("strong"),
                    "em" | "i" => Some("em"),
                    "u" => Some("u"),
                    "a" => Some("a"),
                    _ => None,
                };
                if let Some(tag) = wrapper {
                    all_plain = false;
                    let mut wrapped = inline_container(tag, element);
                    if tag == "a" {
                        if let Some(href) = element.attr("href") {
                            wrapped = wrapped.attr("href", href);
                        }
                    }
                    nodes.push(HtmlNode::Element(wrapped));
                } else if element.tag == "br" {
                    all_plain = false;
                    nodes.push(HtmlNode::Element(HtmlElement::void("br")));
                } else if element.tag == "img" {
                    if let Some(img) = convert_img(element) {
                        all_plain = false;
                        nodes.push(img);
                    }
                } else {
                    // span and anything else: formatting noise, keep the text.
                    let text = element.text();
                    if !text.is_empty() {
                        nodes.push(HtmlNode::Text(text));
                    }
                }
            }
        }
    }
    (all_plain, nodes)
}

fn convert_list(element: &ImportElement) -> HtmlElement {
    let mut items = Vec::new();
    for child in &element.children {
        let ImportNode::Element(item) = child else {
            continue;
        };
        if item.tag != "li" {
            log::warn!("dropping '{}' inside list during import", item.tag);
            continue;
        }
        let nested: Vec<&ImportElement> = item
            .children
            .iter()
            .filter_map(|node| match node {
                ImportNode::Element(inner) if matches!(inner.tag.as_str(), "ul" | "ol") => {
                    Some(inner)
                }
                _ => None,
            })
            .collect();
        if nested.is_empty() {
            items.push(HtmlNode::Element(inline_container("li", item)));
        } else {
            let inline_part: Vec<ImportNode> = item
                .children
                .iter()
                .filter(|node| {
                    !matches!(
                        node,
                        ImportNode::Element(inner) if matches!(inner.tag.as_str(), "ul" | "ol")
                    )
                })
                .cloned()
                .collect();
            let (_, mut children) = convert_inline(&inline_part);
            for list in nested {
                children.push(HtmlNode::Element(convert_list(list)));
            }
            items.push(HtmlNode::Element(HtmlElement::with_children("li", children)));
        }
    }
    HtmlElement::with_children(&element.tag, items)
}

fn convert_table(element: &ImportElement) -> HtmlElement {
    let mut rows = Vec::new();
    collect_table_rows(&element.children, &mut rows);
    HtmlElement::with_children("table", rows)
}

fn collect_table_rows(nodes: &[ImportNode], rows: &mut Vec<HtmlNode>) {
    for node in nodes {
        let ImportNode::Element(element) = node else {
            continue;
        };
        match element.tag.as_str() {
            "thead" | "tbody" => collect_table_rows(&element.children, rows),
            "tr" => {
                let cells = element
                    .children
                    .iter()
                    .filter_map(|cell| match cell {
                        ImportNode::Element(inner)
                            if matches!(inner.tag.as_str(), "td" | "th") =>
                        {
                            Some(HtmlNode::Element(convert_cell(inner)))
                        }
                        _ => None,
                    })
                    .collect();
                rows.push(HtmlNode::Element(HtmlElement::with_children("tr", cells)));
            }
            other => log::warn!("dropping '{}' inside table during import", other),
        }
    }
}

fn convert_cell(cell: &ImportElement) -> HtmlElement {
    // DOCX converters put paragraphs inside cells; a single plain one
    // collapses to a bare text payload.
    let paragraphs: Vec<&ImportElement> = cell
        .children
        .iter()
        .filter_map(|node| match node {
            ImportNode::Element(inner) if inner.tag == "p" => Some(inner),
            _ => None,
        })
        .collect();
    match paragraphs.len() {
        0 => inline_container(&cell.tag, cell),
        1 => {
            let inner = inline_container("p", paragraphs[0]);
            match inner.text {
                Some(text) => HtmlElement::with_text(&cell.tag, text),
                None => HtmlElement::with_children(&cell.tag, vec![HtmlNode::Element(inner)]),
            }
        }
        _ => {
            let children = paragraphs
                .into_iter()
                .map(|p| HtmlNode::Element(inline_container("p", p)))
                .collect();
            HtmlElement::with_children(&cell.tag, children)
        }
    }
}

fn convert_img(element: &ImportElement) -> Option<HtmlNode> {
    let Some(src) = element.attr("src") else {
        log::warn!("dropping image without src during import");
        return None;
    };
    Some(HtmlNode::Element(HtmlElement::img(src, element.attr("alt"))))
}

/// Assign hierarchical ids and propagate communes once the tree is built.
fn finalize(titres: &mut [Titre], parent_id: &str, insee: &[String]) {
    for (index, titre) in titres.iter_mut().enumerate() {
        titre.id_titre = ids::titre_id(parent_id, &titre.intitule, index + 1);
        titre.insee_commune = insee.to_vec();
        for (position, contenu) in titre.contenu.iter_mut().enumerate() {
            contenu.id_contenu = ids::contenu_id(&titre.id_titre, position + 1);
            contenu.id_zone = titre.id_zone.clone();
            contenu.id_prescription = titre.id_prescription.clone();
        }
        let base = titre.id_titre.clone();
        finalize(&mut titre.titres, &base, insee);
    }
}
