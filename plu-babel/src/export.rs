//! Export bundle assembly
//!
//!     Exporting produces the document JSON plus every stored image the
//!     document references under `ressources/`. Archive packaging itself
//!     (ZIP or anything else) is an external concern behind [`ArchiveSink`];
//!     this module only decides what goes into the archive.
//!
//!     The document is prepared on a deep copy: each titre's content list
//!     is prefixed with a synthesized heading block echoing its own
//!     intitule (unless an equivalent block already leads the list), so the
//!     exported règlement reads as a standalone document. The live document
//!     is never touched.

use crate::error::ExportError;
use crate::images::{ImageStore, StoredImage, RESOURCES_PREFIX};
use plu_model::{ids, Contenu, HtmlElement, HtmlNode, PluDocument, Titre};
use std::collections::BTreeSet;

/// Name of the document file inside the bundle.
pub const DOCUMENT_FILE: &str = "reglement.json";

/// Knobs for bundle assembly.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Folder name for image files inside the archive.
    pub resources_dir: String,
    pub pretty_json: bool,
    /// Prefix each titre's content with a heading echoing its intitule.
    pub prefix_headings: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            resources_dir: "ressources".to_string(),
            pretty_json: true,
            prefix_headings: true,
        }
    }
}

/// Everything that goes into an export archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub document: PluDocument,
    pub images: Vec<StoredImage>,
}

/// Receiver for bundle files; the ZIP writer lives outside this crate.
pub trait ArchiveSink {
    fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// Assemble an export bundle from the live document and its image store.
pub fn build_export(
    doc: &PluDocument,
    store: &dyn ImageStore,
    options: &ExportOptions,
) -> ExportBundle {
    let mut document = doc.clone();
    if options.prefix_headings {
        for titre in &mut document.titres {
            prefix_headings(titre);
        }
    }

    let mut names = BTreeSet::new();
    for titre in document.iter_titres() {
        for contenu in &titre.contenu {
            collect_resource_names(&contenu.html, &mut names);
        }
    }
    let images = names
        .into_iter()
        .filter_map(|name| {
            let image = store.get(&doc.id_reglement, &name);
            if image.is_none() {
                log::warn!("referenced image '{}' missing from store", name);
            }
            image
        })
        .collect();

    ExportBundle { document, images }
}

/// Write a bundle through the archive sink.
pub fn write_bundle(
    bundle: &ExportBundle,
    sink: &mut dyn ArchiveSink,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let json = if options.pretty_json {
        bundle.document.to_json_string_pretty()
    } else {
        bundle.document.to_json_string()
    }
    .map_err(|err| ExportError::Serialization(err.to_string()))?;

    sink.add_file(DOCUMENT_FILE, json.as_bytes())?;
    for image in &bundle.images {
        let path = format!("{}/{}", options.resources_dir, image.name);
        sink.add_file(&path, &image.bytes)?;
    }
    Ok(())
}

fn prefix_headings(titre: &mut Titre) {
    let tag = format!("h{}", titre.niveau.clamp(1, 6));
    let already_present = titre
        .contenu
        .first()
        .and_then(|contenu| contenu.html.first())
        .map_or(false, |node| {
            node.as_element().map_or(false, |element| element.is_tag(&tag))
                && node.plain_text() == titre.intitule
        });

    if !already_present {
        let heading = HtmlNode::Element(HtmlElement::with_text(tag, titre.intitule.clone()));
        let block = Contenu::new(String::new(), vec![heading])
            .with_tags(titre.id_zone.clone(), titre.id_prescription.clone());
        titre.contenu.insert(0, block);
        for (position, contenu) in titre.contenu.iter_mut().enumerate() {
            contenu.id_contenu = ids::contenu_id(&titre.id_titre, position + 1);
        }
    }

    for child in &mut titre.titres {
        prefix_headings(child);
    }
}

fn collect_resource_names(nodes: &[HtmlNode], names: &mut BTreeSet<String>) {
    for node in nodes {
        let HtmlNode::Element(element) = node else {
            continue;
        };
        if element.is_tag("img") {
            if let Some(name) = element
                .get_attr("src")
                .and_then(|src| src.strip_prefix(RESOURCES_PREFIX))
            {
                names.insert(name.to_string());
            }
        }
        if let Some(children) = &element.children {
            collect_resource_names(children, names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ImageStore as _, MemoryImageStore};
    use plu_model::ast::document::DocType;

    struct MemorySink {
        files: Vec<(String, Vec<u8>)>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self { files: Vec::new() }
        }
    }

    impl ArchiveSink for MemorySink {
        fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ExportError> {
            self.files.push((path.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    fn sample_doc() -> PluDocument {
        let mut doc = PluDocument::new("14027_PLU_20240101", "Règlement", DocType::Plu);
        let mut titre = Titre::new("14027_PLU_20240101/reglement/titre_1", "Titre I", 1);
        titre.contenu.push(Contenu::new(
            "14027_PLU_20240101/reglement/titre_1/contenu01",
            vec![HtmlNode::Element(HtmlElement::with_text("p", "corps"))],
        ));
        doc.titres.push(titre);
        doc
    }

    #[test]
    fn heading_is_prefixed_and_ids_renumbered() {
        let doc = sample_doc();
        let bundle = build_export(&doc, &MemoryImageStore::new(), &ExportOptions::default());
        let titre = &bundle.document.titres[0];
        assert_eq!(titre.contenu.len(), 2);
        let heading = titre.contenu[0].html[0].as_element().unwrap();
        assert_eq!(heading.tag, "h1");
        assert_eq!(heading.text.as_deref(), Some("Titre I"));
        assert_eq!(
            titre.contenu[0].id_contenu,
            "14027_PLU_20240101/reglement/titre_1/contenu01"
        );
        assert_eq!(
            titre.contenu[1].id_contenu,
            "14027_PLU_20240101/reglement/titre_1/contenu02"
        );
        // The live document was not touched.
        assert_eq!(doc.titres[0].contenu.len(), 1);
    }

    #[test]
    fn existing_equivalent_heading_is_not_duplicated() {
        let mut doc = sample_doc();
        doc.titres[0].contenu.insert(
            0,
            Contenu::new(
                "x",
                vec![HtmlNode::Element(HtmlElement::with_text("h1", "Titre I"))],
            ),
        );
        let bundle = build_export(&doc, &MemoryImageStore::new(), &ExportOptions::default());
        assert_eq!(bundle.document.titres[0].contenu.len(), 2);
    }

    #[test]
    fn referenced_images_are_collected() {
        let mut doc = sample_doc();
        doc.titres[0].contenu[0].html.push(HtmlNode::Element(HtmlElement::img(
            "ressources/plan.png",
            None,
        )));
        let mut store = MemoryImageStore::new();
        store
            .store(&doc.id_reglement, "plan.png", "image/png", &[1, 2])
            .unwrap();
        store
            .store(&doc.id_reglement, "orphan.png", "image/png", &[3])
            .unwrap();

        let bundle = build_export(&doc, &store, &ExportOptions::default());
        assert_eq!(bundle.images.len(), 1);
        assert_eq!(bundle.images[0].name, "plan.png");
    }

    #[test]
    fn missing_referenced_image_is_skipped() {
        let mut doc = sample_doc();
        doc.titres[0].contenu[0].html.push(HtmlNode::Element(HtmlElement::img(
            "ressources/absent.png",
            None,
        )));
        let bundle = build_export(&doc, &MemoryImageStore::new(), &ExportOptions::default());
        assert!(bundle.images.is_empty());
    }

    #[test]
    fn write_bundle_emits_json_and_resources() {
        let mut doc = sample_doc();
        doc.titres[0].contenu[0].html.push(HtmlNode::Element(HtmlElement::img(
            "ressources/plan.png",
            None,
        )));
        let mut store = MemoryImageStore::new();
        store
            .store(&doc.id_reglement, "plan.png", "image/png", &[9])
            .unwrap();

        let bundle = build_export(&doc, &store, &ExportOptions::default());
        let mut sink = MemorySink::new();
        write_bundle(&bundle, &mut sink, &ExportOptions::default()).unwrap();

        assert_eq!(sink.files[0].0, "reglement.json");
        assert!(String::from_utf8(sink.files[0].1.clone())
            .unwrap()
            .contains("\"idReglement\""));
        assert_eq!(sink.files[1].0, "ressources/plan.png");
        assert_eq!(sink.files[1].1, vec![9]);
    }
}
