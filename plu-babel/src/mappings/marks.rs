//! Mark nesting and inline markup re-parse
//!
//! # The Problem
//!
//! The editor attaches formatting to a text run as a flat list of marks;
//! structured HTML expresses the same thing as a chain of nested
//! single-child wrapper elements (`<strong><em>text</em></strong>`), and
//! legacy content additionally embeds a restricted markup subset directly
//! inside `text` fields.
//!
//! # The Convention
//!
//! Mark lists are ordered innermost first: `[italic, bold]` wraps as
//! `strong(em(text))`: the last mark applied becomes the outermost
//! wrapper. Both directions here and the two mapping modules rely on that
//! single ordering rule.
//!
//! The embedded subset is `<strong>`, `<em>`, `<u>`, `<a href=...>` and
//! `<br>`; any other tag is stripped to bare text.

use crate::rich::nodes::{Mark, RichNode};
use plu_model::{HtmlElement, HtmlNode};

/// Inline style attached to the `span` wrapper for underline marks.
pub const UNDERLINE_STYLE: &str = "text-decoration: underline";

/// One run of inline content recovered from markup.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineRun {
    Text { text: String, marks: Vec<Mark> },
    Break,
}

impl InlineRun {
    pub fn text(text: impl Into<String>) -> Self {
        InlineRun::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    fn push_mark(&mut self, mark: &Mark) {
        if let InlineRun::Text { marks, .. } = self {
            marks.push(mark.clone());
        }
    }
}

/// Convert recovered runs into rich text nodes.
pub fn runs_to_rich(runs: Vec<InlineRun>) -> Vec<RichNode> {
    runs.into_iter()
        .map(|run| match run {
            InlineRun::Text { text, marks } => RichNode::text_with_marks(text, marks),
            InlineRun::Break => RichNode::hard_break(),
        })
        .collect()
}

/// Wrap a text run in its mark chain. An empty mark list yields a bare
/// string node; otherwise the first mark holds the text and each further
/// mark wraps the previous element.
pub fn wrap_marks(text: &str, marks: &[Mark]) -> HtmlNode {
    let mut wrapped: Option<HtmlElement> = None;
    for mark in marks {
        let Some((tag, attrs)) = wrapper_for_mark(mark) else {
            log::warn!("unknown mark kind '{}' dropped", mark.kind);
            continue;
        };
        let mut element = match wrapped.take() {
            None => HtmlElement::with_text(tag, text),
            Some(inner) => HtmlElement::with_children(tag, vec![HtmlNode::Element(inner)]),
        };
        for (name, value) in attrs {
            element = element.attr(name, value);
        }
        wrapped = Some(element);
    }
    match wrapped {
        Some(element) => HtmlNode::Element(element),
        None => HtmlNode::Text(text.to_string()),
    }
}

fn wrapper_for_mark(mark: &Mark) -> Option<(&'static str, Vec<(String, String)>)> {
    match mark.kind.as_str() {
        "bold" => Some(("strong", vec![])),
        "italic" => Some(("em", vec![])),
        "underline" => Some((
            "span",
            vec![("style".to_string(), UNDERLINE_STYLE.to_string())],
        )),
        "link" => {
            let href = mark.href().unwrap_or_default().to_string();
            Some(("a", vec![("href".to_string(), href)]))
        }
        _ => None,
    }
}

/// The mark a wrapper element stands for, if it is one.
pub fn mark_of_element(element: &HtmlElement) -> Option<Mark> {
    match element.tag.as_str() {
        "strong" => Some(Mark::bold()),
        "em" => Some(Mark::italic()),
        "u" => Some(Mark::underline()),
        "span" => {
            let style = element.get_attr("style")?;
            if style.contains("underline") {
                Some(Mark::underline())
            } else {
                None
            }
        }
        "a" => element.get_attr("href").map(Mark::link),
        _ => None,
    }
}

/// Fold a wrapper chain back into marked runs. Returns None when the
/// element is not a mark wrapper at all (the caller then treats it as
/// block content or strips it).
pub fn unwrap_marked_element(element: &HtmlElement) -> Option<Vec<InlineRun>> {
    let mark = mark_of_element(element)?;
    let mut runs = match (&element.text, &element.children) {
        (Some(text), _) => parse_inline_markup(text),
        (None, Some(children)) => {
            let mut runs = Vec::new();
            for child in children {
                match child {
                    HtmlNode::Text(text) => runs.extend(parse_inline_markup(text)),
                    HtmlNode::Element(child_element) => {
                        if child_element.is_tag("br") {
                            runs.push(InlineRun::Break);
                        } else if let Some(child_runs) = unwrap_marked_element(child_element) {
                            runs.extend(child_runs);
                        } else {
                            let text = child.plain_text();
                            if !text.is_empty() {
                                runs.push(InlineRun::text(text));
                            }
                        }
                    }
                }
            }
            runs
        }
        (None, None) => Vec::new(),
    };
    for run in &mut runs {
        run.push_mark(&mark);
    }
    Some(runs)
}

/// Re-parse the restricted markup subset embedded in a text payload into
/// individual marked runs. Tags outside the subset are stripped to bare
/// text; entities of the common five are decoded.
pub fn parse_inline_markup(text: &str) -> Vec<InlineRun> {
    let mut runs: Vec<InlineRun> = Vec::new();
    let mut stack: Vec<Mark> = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with('<') {
            if let Some(end) = rest.find('>') {
                let token = &rest[1..end];
                i += end + 1;
                match classify_token(token) {
                    TagToken::Break => {
                        flush(&mut runs, &mut buf, &stack);
                        runs.push(InlineRun::Break);
                    }
                    TagToken::Open(mark) => {
                        flush(&mut runs, &mut buf, &stack);
                        stack.push(mark);
                    }
                    TagToken::Close(kind) => {
                        if let Some(pos) = stack.iter().rposition(|mark| mark.kind == kind) {
                            flush(&mut runs, &mut buf, &stack);
                            stack.remove(pos);
                        }
                    }
                    TagToken::Stripped => {}
                }
                continue;
            }
            // Lone '<' without a closing '>', keep it literal.
            buf.push('<');
            i += 1;
            continue;
        }
        if rest.starts_with('&') {
            if let Some((decoded, len)) = decode_entity(rest) {
                buf.push_str(decoded);
                i += len;
                continue;
            }
        }
        let c = rest.chars().next().expect("non-empty remainder");
        buf.push(c);
        i += c.len_utf8();
    }

    flush(&mut runs, &mut buf, &stack);
    runs
}

fn flush(runs: &mut Vec<InlineRun>, buf: &mut String, stack: &[Mark]) {
    if buf.is_empty() {
        return;
    }
    // Outermost tag was opened first; run marks are innermost first.
    let marks = stack.iter().rev().cloned().collect();
    runs.push(InlineRun::Text {
        text: std::mem::take(buf),
        marks,
    });
}

enum TagToken {
    Open(Mark),
    Close(String),
    Break,
    Stripped,
}

fn classify_token(token: &str) -> TagToken {
    let token = token.trim();
    if let Some(name) = token.strip_prefix('/') {
        let kind = match name.trim() {
            "strong" => "bold",
            "em" => "italic",
            "u" => "underline",
            "a" => "link",
            _ => return TagToken::Stripped,
        };
        return TagToken::Close(kind.to_string());
    }
    let (name, attrs) = match token.find(char::is_whitespace) {
        Some(pos) => (&token[..pos], &token[pos..]),
        None => (token, ""),
    };
    match name.trim_end_matches('/') {
        "br" => TagToken::Break,
        "strong" => TagToken::Open(Mark::bold()),
        "em" => TagToken::Open(Mark::italic()),
        "u" => TagToken::Open(Mark::underline()),
        "a" => match attr_value(attrs, "href") {
            Some(href) => TagToken::Open(Mark::link(href)),
            None => TagToken::Stripped,
        },
        _ => TagToken::Stripped,
    }
}

fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let idx = attrs.find(name)?;
    let rest = attrs[idx + name.len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

fn decode_entity(rest: &str) -> Option<(&'static str, usize)> {
    const ENTITIES: &[(&str, &str)] = &[
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", "\u{a0}"),
    ];
    for (entity, decoded) in ENTITIES {
        if rest.starts_with(entity) {
            return Some((decoded, entity.len()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_marks_yields_bare_string() {
        assert_eq!(wrap_marks("texte", &[]), HtmlNode::Text("texte".to_string()));
    }

    #[test]
    fn single_mark_holds_text_directly() {
        let node = wrap_marks("gras", &[Mark::bold()]);
        let element = node.as_element().unwrap();
        assert_eq!(element.tag, "strong");
        assert_eq!(element.text.as_deref(), Some("gras"));
    }

    #[test]
    fn last_mark_becomes_outermost() {
        let node = wrap_marks("x", &[Mark::italic(), Mark::bold()]);
        let outer = node.as_element().unwrap();
        assert_eq!(outer.tag, "strong");
        let inner = outer.children.as_ref().unwrap()[0].as_element().unwrap();
        assert_eq!(inner.tag, "em");
        assert_eq!(inner.text.as_deref(), Some("x"));
    }

    #[test]
    fn underline_wraps_as_styled_span() {
        let node = wrap_marks("u", &[Mark::underline()]);
        let element = node.as_element().unwrap();
        assert_eq!(element.tag, "span");
        assert_eq!(element.get_attr("style"), Some(UNDERLINE_STYLE));
    }

    #[test]
    fn unwrap_inverts_wrap() {
        let marks = vec![Mark::italic(), Mark::bold()];
        let node = wrap_marks("x", &marks);
        let runs = unwrap_marked_element(node.as_element().unwrap()).unwrap();
        assert_eq!(
            runs,
            vec![InlineRun::Text {
                text: "x".to_string(),
                marks
            }]
        );
    }

    #[test]
    fn unwrap_handles_mixed_children() {
        // <strong>a <em>b</em></strong>
        let element = HtmlElement::with_children(
            "strong",
            vec![
                HtmlNode::text("a "),
                HtmlNode::Element(HtmlElement::with_text("em", "b")),
            ],
        );
        let runs = unwrap_marked_element(&element).unwrap();
        assert_eq!(
            runs,
            vec![
                InlineRun::Text {
                    text: "a ".to_string(),
                    marks: vec![Mark::bold()]
                },
                InlineRun::Text {
                    text: "b".to_string(),
                    marks: vec![Mark::italic(), Mark::bold()]
                },
            ]
        );
    }

    #[test]
    fn plain_span_is_not_a_mark() {
        let element = HtmlElement::with_text("span", "x");
        assert!(mark_of_element(&element).is_none());
    }

    #[test]
    fn parse_plain_text_is_one_run() {
        assert_eq!(parse_inline_markup("bonjour"), vec![InlineRun::text("bonjour")]);
        assert_eq!(parse_inline_markup(""), vec![]);
    }

    #[test]
    fn parse_nested_markup() {
        let runs = parse_inline_markup("a <strong>b <em>c</em></strong> d");
        assert_eq!(
            runs,
            vec![
                InlineRun::text("a "),
                InlineRun::Text {
                    text: "b ".to_string(),
                    marks: vec![Mark::bold()]
                },
                InlineRun::Text {
                    text: "c".to_string(),
                    marks: vec![Mark::italic(), Mark::bold()]
                },
                InlineRun::Text {
                    text: " d".to_string(),
                    marks: vec![]
                },
            ]
        );
    }

    #[test]
    fn parse_link_keeps_href() {
        let runs = parse_inline_markup(r#"voir <a href="https://example.com">ici</a>"#);
        assert_eq!(
            runs[1],
            InlineRun::Text {
                text: "ici".to_string(),
                marks: vec![Mark::link("https://example.com")]
            }
        );
    }

    #[test]
    fn parse_strips_unknown_tags() {
        let runs = parse_inline_markup("a<code>b</code>c");
        let joined: String = runs
            .iter()
            .map(|run| match run {
                InlineRun::Text { text, .. } => text.as_str(),
                InlineRun::Break => "",
            })
            .collect();
        assert_eq!(joined, "abc");
        assert!(runs
            .iter()
            .all(|run| matches!(run, InlineRun::Text { marks, .. } if marks.is_empty())));
    }

    #[test]
    fn parse_br_becomes_break() {
        let runs = parse_inline_markup("a<br/>b");
        assert_eq!(
            runs,
            vec![InlineRun::text("a"), InlineRun::Break, InlineRun::text("b")]
        );
    }

    #[test]
    fn parse_decodes_entities() {
        assert_eq!(
            parse_inline_markup("3 &lt; 4 &amp; 5 &gt; 2"),
            vec![InlineRun::text("3 < 4 & 5 > 2")]
        );
    }

    #[test]
    fn unmatched_closing_tag_is_ignored() {
        assert_eq!(parse_inline_markup("a</strong>b"), vec![InlineRun::text("ab")]);
    }
}
