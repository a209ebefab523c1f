//! Minimal reader for the rich-text widget's HTML output.
//!
//! # Responsibility
//! - Parse an HTML fragment into a small element/text tree.
//! - Derive de-tagged text for word counts and plain-text export.
//! - Escape text for HTML output.
//!
//! # Invariants
//! - Parsing never fails: stray closing tags are ignored and unclosed
//!   elements are closed at end of input.
//! - Text nodes hold entity-decoded text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9]*)([^>]*)>|[^<]+|<")
        .expect("valid markup token regex")
});
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid attribute regex")
});
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex"));

const VOID_TAGS: &[&str] = &["br", "img", "hr", "input", "meta", "link", "wbr", "col"];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote", "pre", "tr",
    "table",
];

/// Node of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element(MarkupElement),
}

impl MarkupNode {
    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Element(element) => element.text_content(),
        }
    }
}

/// Element with lowercase tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    fn new(tag: &str, raw_attributes: &str) -> Self {
        let attributes = ATTRIBUTE_RE
            .captures_iter(raw_attributes)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                (name, value)
            })
            .collect();
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes,
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Value of one inline style property, e.g. `color`.
    pub fn style_property(&self, property: &str) -> Option<&str> {
        self.attribute("style")?.split(';').find_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            if name.trim().eq_ignore_ascii_case(property) {
                Some(value.trim()).filter(|value| !value.is_empty())
            } else {
                None
            }
        })
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(MarkupNode::text_content).collect()
    }
}

/// Parses an HTML fragment.
pub fn parse_fragment(html: &str) -> Vec<MarkupNode> {
    let mut root: Vec<MarkupNode> = Vec::new();
    let mut stack: Vec<MarkupElement> = Vec::new();

    for caps in TOKEN_RE.captures_iter(html) {
        let token = &caps[0];
        if token.starts_with("<!--") {
            continue;
        }
        match caps.get(2) {
            Some(tag) => {
                let closing = !caps[1].is_empty();
                let tag = tag.as_str().to_ascii_lowercase();
                if closing {
                    close_element(&mut root, &mut stack, &tag);
                    continue;
                }
                let raw_attributes = caps.get(3).map_or("", |m| m.as_str());
                let element = MarkupElement::new(&tag, raw_attributes.trim_end_matches('/'));
                if VOID_TAGS.contains(&tag.as_str()) || raw_attributes.trim_end().ends_with('/') {
                    attach(&mut root, &mut stack, MarkupNode::Element(element));
                } else {
                    stack.push(element);
                }
            }
            None => {
                attach(&mut root, &mut stack, MarkupNode::Text(decode_entities(token)));
            }
        }
    }

    while let Some(element) = stack.pop() {
        attach(&mut root, &mut stack, MarkupNode::Element(element));
    }
    root
}

fn attach(root: &mut Vec<MarkupNode>, stack: &mut [MarkupElement], node: MarkupNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

fn close_element(root: &mut Vec<MarkupNode>, stack: &mut Vec<MarkupElement>, tag: &str) {
    if !stack.iter().any(|open| open.tag == tag) {
        return;
    }
    while let Some(element) = stack.pop() {
        let done = element.tag == tag;
        attach(root, stack, MarkupNode::Element(element));
        if done {
            break;
        }
    }
}

/// Decodes named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Escapes text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// De-tagged text with one line per block element.
pub fn plain_text(html: &str) -> String {
    let mut out = String::new();
    for node in &parse_fragment(html) {
        push_plain_text(node, &mut out);
    }
    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn push_plain_text(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Text(text) => out.push_str(text),
        MarkupNode::Element(element) if element.tag == "br" => out.push('\n'),
        MarkupNode::Element(element) => {
            for child in &element.children {
                push_plain_text(child, out);
            }
            if BLOCK_TAGS.contains(&element.tag.as_str()) && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}

/// Number of whitespace-separated words in rich content.
pub fn word_count(html: &str) -> usize {
    plain_text(html).split_whitespace().count()
}
