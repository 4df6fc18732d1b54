//! Round-trip coverage for the rich ⇄ structured mappings.
//!
//! The property holds for documents built from the supported vocabulary
//! outside the documented lossy cases (lone image inside a paragraph,
//! unknown tags). Adjacent unmarked runs in an all-plain paragraph merge
//! through the text collapse, so generators emit plain paragraphs as a
//! single run.

use plu_babel::images::{ImageStore as _, MemoryImageStore};
use plu_babel::rich::nodes::{Mark, RichDoc, RichNode};
use plu_babel::{from_structured, to_structured};
use plu_model::{HtmlElement, HtmlNode};
use proptest::prelude::*;

const SCOPE: &str = "14027_PLU_20240101/reglement";

fn roundtrip(doc: &RichDoc) -> RichDoc {
    let store = MemoryImageStore::new();
    let structured = to_structured(doc, &store, SCOPE);
    from_structured(&structured, &store, SCOPE)
}

#[test]
fn kitchen_sink_roundtrip() {
    let doc = RichDoc::new(vec![
        RichNode::heading(1, vec![RichNode::text("Dispositions générales")]),
        RichNode::paragraph(vec![
            RichNode::text("Les zones "),
            RichNode::text_with_marks("urbaines", vec![Mark::bold()]),
            RichNode::text(" sont définies par "),
            RichNode::text_with_marks(
                "le code",
                vec![Mark::italic(), Mark::bold()],
            ),
            RichNode::text("."),
        ]),
        RichNode::paragraph(vec![
            RichNode::text("premier alinéa"),
            RichNode::hard_break(),
            RichNode::text("second alinéa"),
        ]),
        RichNode::bullet_list(vec![
            RichNode::list_item(vec![RichNode::paragraph(vec![RichNode::text("zone Ua")])]),
            RichNode::list_item(vec![
                RichNode::paragraph(vec![RichNode::text_with_marks(
                    "zone Ub",
                    vec![Mark::underline()],
                )]),
                RichNode::paragraph(vec![RichNode::text("détail")]),
            ]),
        ]),
        RichNode::table(vec![RichNode::table_row(vec![
            RichNode::table_header(vec![RichNode::paragraph(vec![RichNode::text("Zone")])]),
            RichNode::table_cell(vec![RichNode::paragraph(vec![RichNode::text("Emprise")])]),
        ])]),
        RichNode::paragraph(vec![RichNode::text_with_marks(
            "géoportail",
            vec![Mark::link("https://geoportail-urbanisme.gouv.fr")],
        )]),
        RichNode::image("ressources/plan.png", Some("plan de zonage")),
    ]);

    assert_eq!(roundtrip(&doc), doc);
}

#[test]
fn structured_side_roundtrip() {
    let store = MemoryImageStore::new();
    let structured = vec![
        HtmlNode::Element(HtmlElement::with_text("h2", "Chapitre 1")),
        HtmlNode::Element(HtmlElement::with_text("p", "texte simple")),
        HtmlNode::Element(HtmlElement::with_children(
            "p",
            vec![
                HtmlNode::Text("avant ".to_string()),
                HtmlNode::Element(HtmlElement::with_text("strong", "fort")),
            ],
        )),
        HtmlNode::Element(HtmlElement::with_children(
            "ul",
            vec![
                HtmlNode::Element(HtmlElement::with_text("li", "un")),
                HtmlNode::Element(HtmlElement::with_text("li", "deux")),
            ],
        )),
        HtmlNode::Element(HtmlElement::img("ressources/plan.png", Some("plan"))),
    ];
    let rich = from_structured(&structured, &store, SCOPE);
    assert_eq!(to_structured(&rich, &store, SCOPE), structured);
}

#[test]
fn embedded_then_rehydrated_image_is_stable() {
    let mut store = MemoryImageStore::new();
    store
        .store(SCOPE, "plan.png", "image/png", &[137, 80, 78, 71])
        .unwrap();
    let url = plu_babel::images::to_data_url("image/png", &[137, 80, 78, 71]);

    let doc = RichDoc::new(vec![RichNode::image(url, Some("plan"))]);
    let structured = to_structured(&doc, &store, SCOPE);
    assert_eq!(
        structured[0].as_element().unwrap().get_attr("src"),
        Some("ressources/plan.png")
    );

    let back = from_structured(&structured, &store, SCOPE);
    // Rehydration restores the embedded payload the editor needs.
    assert_eq!(back, doc);
}

// ---------------------------------------------------------------------------
// Property: round-trip over generated supported-vocabulary documents
// ---------------------------------------------------------------------------

fn text_strategy() -> impl Strategy<Value = String> {
    // No '<' or '&': embedded markup is covered by its own tests.
    "[a-zA-Z0-9àéèçôû][a-zA-Z0-9 àéèçôû,.':()-]{0,18}"
}

fn marks_strategy() -> impl Strategy<Value = Vec<Mark>> {
    prop_oneof![
        Just(vec![Mark::bold()]),
        Just(vec![Mark::italic()]),
        Just(vec![Mark::underline()]),
        Just(vec![Mark::link("https://exemple.fr")]),
        Just(vec![Mark::italic(), Mark::bold()]),
        Just(vec![Mark::underline(), Mark::italic()]),
    ]
}

#[derive(Debug, Clone)]
enum InlineItem {
    Plain(String),
    Marked(String, Vec<Mark>),
    Break,
}

fn inline_item_strategy() -> impl Strategy<Value = InlineItem> {
    prop_oneof![
        text_strategy().prop_map(InlineItem::Plain),
        (text_strategy(), marks_strategy()).prop_map(|(text, marks)| InlineItem::Marked(text, marks)),
        Just(InlineItem::Break),
    ]
}

fn items_to_runs(items: Vec<InlineItem>) -> Vec<RichNode> {
    items
        .into_iter()
        .map(|item| match item {
            InlineItem::Plain(text) => RichNode::text(text),
            InlineItem::Marked(text, marks) => RichNode::text_with_marks(text, marks),
            InlineItem::Break => RichNode::hard_break(),
        })
        .collect()
}

fn paragraph_strategy() -> impl Strategy<Value = RichNode> {
    prop_oneof![
        // All-plain paragraphs collapse to one text payload, so a single run.
        text_strategy().prop_map(|text| RichNode::paragraph(vec![RichNode::text(text)])),
        proptest::collection::vec(inline_item_strategy(), 1..5)
            .prop_filter("needs a non-plain item to avoid the text collapse", |items| {
                items
                    .iter()
                    .any(|item| !matches!(item, InlineItem::Plain(_)))
            })
            .prop_map(|items| RichNode::paragraph(items_to_runs(items))),
    ]
}

fn heading_strategy() -> impl Strategy<Value = RichNode> {
    (1u8..=6, text_strategy())
        .prop_map(|(level, text)| RichNode::heading(level, vec![RichNode::text(text)]))
}

fn list_strategy() -> impl Strategy<Value = RichNode> {
    let item = prop_oneof![
        paragraph_strategy().prop_map(|p| RichNode::list_item(vec![p])),
        (paragraph_strategy(), paragraph_strategy())
            .prop_map(|(a, b)| RichNode::list_item(vec![a, b])),
    ];
    (proptest::collection::vec(item, 1..4), any::<bool>()).prop_map(|(items, ordered)| {
        if ordered {
            RichNode::ordered_list(items)
        } else {
            RichNode::bullet_list(items)
        }
    })
}

fn table_strategy() -> impl Strategy<Value = RichNode> {
    let cell = (any::<bool>(), paragraph_strategy()).prop_map(|(header, p)| {
        if header {
            RichNode::table_header(vec![p])
        } else {
            RichNode::table_cell(vec![p])
        }
    });
    let row = proptest::collection::vec(cell, 1..4).prop_map(RichNode::table_row);
    proptest::collection::vec(row, 1..3).prop_map(RichNode::table)
}

fn image_strategy() -> impl Strategy<Value = RichNode> {
    ("[a-z]{3,10}\\.png", proptest::option::of("[a-z ]{1,12}")).prop_map(|(name, alt)| {
        RichNode::image(format!("ressources/{}", name), alt.as_deref())
    })
}

fn doc_strategy() -> impl Strategy<Value = RichDoc> {
    let block = prop_oneof![
        4 => paragraph_strategy(),
        2 => heading_strategy(),
        2 => list_strategy(),
        1 => table_strategy(),
        1 => image_strategy(),
    ];
    proptest::collection::vec(block, 0..6).prop_map(RichDoc::new)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn generated_documents_roundtrip(doc in doc_strategy()) {
        prop_assert_eq!(roundtrip(&doc), doc);
    }
}
