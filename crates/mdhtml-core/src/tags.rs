//! HTML tag-name tables, built once at first use and immutable afterwards.

use once_cell::sync::Lazy;
use std::collections::HashSet;

// Span-level and head-of-document elements.
static SPAN_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "title", "link", "script", "style", "object", "meta", "em", "strong", "q", "cite", "dfn",
        "abbr", "acronym", "code", "samp", "kbd", "var", "sub", "sup", "del", "ins", "isindex",
        "a", "img", "br", "map", "area", "param", "applet", "span",
    ]
    .into_iter()
    .collect()
});

static BLOCK_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "address",
        "article",
        "aside",
        "base",
        "basefont",
        "blockquote",
        "body",
        "caption",
        "center",
        "col",
        "colgroup",
        "dd",
        "details",
        "dir",
        "div",
        "dl",
        "dt",
        "fieldset",
        "figcaption",
        "figure",
        "footer",
        "form",
        "frame",
        "frameset",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "head",
        "header",
        "hr",
        "html",
        "iframe",
        "legend",
        "li",
        "link",
        "main",
        "menu",
        "menuitem",
        "meta",
        "nav",
        "noframes",
        "ol",
        "optgroup",
        "option",
        "p",
        "param",
        "section",
        "source",
        "summary",
        "table",
        "tbody",
        "td",
        "tfoot",
        "th",
        "thead",
        "title",
        "tr",
        "track",
        "ul",
    ]
    .into_iter()
    .collect()
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagClass {
    Span,
    Block,
}

/// Classify a tag name, case-insensitively. A few names live in both tables
/// ("link", "meta", "title", "param"); `span_first` decides which table wins
/// for those.
pub fn classify(name: &str, span_first: bool) -> Option<TagClass> {
    let lower = name.to_ascii_lowercase();
    let name = lower.as_str();
    if span_first {
        if SPAN_TAGS.contains(name) {
            Some(TagClass::Span)
        } else if BLOCK_TAGS.contains(name) {
            Some(TagClass::Block)
        } else {
            None
        }
    } else if BLOCK_TAGS.contains(name) {
        Some(TagClass::Block)
    } else if SPAN_TAGS.contains(name) {
        Some(TagClass::Span)
    } else {
        None
    }
}

pub fn is_known(name: &str) -> bool {
    classify(name, false).is_some()
}
