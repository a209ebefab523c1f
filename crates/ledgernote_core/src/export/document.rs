//! Format-independent export representation.
//!
//! # Responsibility
//! - Build, once per export, everything the three renderers need from a note:
//!   header fields, rich-content blocks with run styling, or the ledger table
//!   with its totals.
//!
//! # Invariants
//! - Ledger totals come from `LedgerData::totals`, the same computation the
//!   editor displays.
//! - Building never fails; an unusable ledger payload becomes a one-line
//!   `Notice`.
//! - The source note is never mutated.

use crate::export::markup::{parse_fragment, plain_text, MarkupElement, MarkupNode};
use crate::ledger::migration::{decode_ledger, LedgerSource};
use crate::ledger::numeric::format_total;
use crate::ledger::table::LedgerData;
use crate::model::note::{Note, NoteMode};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

pub const EMPTY_LEDGER_NOTICE: &str = "Empty ledger.";
pub const INVALID_LEDGER_NOTICE: &str = "Invalid ledger data.";

/// Fallback for colors that cannot be parsed.
pub const DEFAULT_COLOR_HEX: &str = "000000";

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+\s*)?\)$")
        .expect("valid rgb regex")
});
static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").expect("valid hex color regex"));

/// Run-level styling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// `RRGGBB`.
    pub color: Option<String>,
    /// `RRGGBB`.
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Numbered,
}

/// Top-level block of rich content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        runs: Vec<StyledRun>,
        alignment: Option<Alignment>,
    },
    Paragraph {
        runs: Vec<StyledRun>,
        alignment: Option<Alignment>,
    },
    ListItem {
        kind: ListKind,
        level: u8,
        text: String,
        alignment: Option<Alignment>,
    },
}

/// Rendered total of one aggregated column.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalLine {
    pub index: usize,
    /// `Total <header>`.
    pub label: String,
    /// Two-decimal grouped display value.
    pub value: String,
    pub amount: f64,
}

/// Ledger body of an export.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub sum_columns: Vec<usize>,
    pub totals: Vec<TotalLine>,
}

impl LedgerTable {
    pub fn from_data(data: &LedgerData) -> Self {
        let totals = data
            .totals()
            .into_iter()
            .map(|total| TotalLine {
                index: total.index,
                label: format!(
                    "Total {}",
                    data.headers.get(total.index).map_or("", String::as_str)
                ),
                value: format_total(total.total),
                amount: total.total,
            })
            .collect();
        Self {
            headers: data.headers.clone(),
            rows: data.rows.iter().map(|row| row.data.clone()).collect(),
            sum_columns: data.sum_column_indices.clone(),
            totals,
        }
    }

    pub fn is_sum_column(&self, index: usize) -> bool {
        self.sum_columns.contains(&index)
    }
}

/// Body of an export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportBody {
    Rich {
        /// Stored markup, passed through by markup renderers.
        html: String,
        blocks: Vec<Block>,
        /// De-tagged text.
        text: String,
    },
    Ledger(LedgerTable),
    /// Placeholder line for an unusable ledger payload.
    Notice(String),
}

/// Snapshot of a note prepared for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub mode: NoteMode,
    pub tags: Vec<String>,
    pub body: ExportBody,
}

impl ExportDocument {
    pub fn from_note(note: &Note) -> Self {
        let body = if note.mode == NoteMode::Ledger {
            ledger_body(note)
        } else {
            ExportBody::Rich {
                html: note.content.clone(),
                blocks: rich_blocks(&note.content),
                text: plain_text(&note.content),
            }
        };
        Self {
            title: note.title.clone(),
            mode: note.mode,
            tags: note.tags.clone(),
            body,
        }
    }

    /// Tags joined for header lines.
    pub fn tag_line(&self) -> String {
        self.tags.join(", ")
    }
}

fn ledger_body(note: &Note) -> ExportBody {
    match decode_ledger(&note.content) {
        Ok((data, _)) => ExportBody::Ledger(LedgerTable::from_data(&data)),
        Err(source) => {
            warn!(
                "event=export_placeholder module=export status=fallback note_id={} reason={}",
                note.id,
                source.as_str()
            );
            let notice = if source == LedgerSource::Missing {
                EMPTY_LEDGER_NOTICE
            } else {
                INVALID_LEDGER_NOTICE
            };
            ExportBody::Notice(notice.to_string())
        }
    }
}

/// Splits rich markup into top-level blocks.
///
/// Paragraphs are kept even when empty; other nodes without text are dropped.
pub fn rich_blocks(html: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for node in parse_fragment(html) {
        match node {
            MarkupNode::Text(text) => {
                if !text.trim().is_empty() {
                    blocks.push(Block::Paragraph {
                        runs: vec![StyledRun::plain(text)],
                        alignment: None,
                    });
                }
            }
            MarkupNode::Element(element) => push_element_blocks(&element, &mut blocks),
        }
    }
    blocks
}

fn push_element_blocks(element: &MarkupElement, blocks: &mut Vec<Block>) {
    let alignment = alignment_of(element);
    match element.tag.as_str() {
        "h1" | "h2" | "h3" | "h4" => blocks.push(Block::Heading {
            level: element.tag[1..].parse().unwrap_or(1),
            runs: runs_of(element),
            alignment,
        }),
        "p" => blocks.push(Block::Paragraph {
            runs: runs_of(element),
            alignment,
        }),
        "ul" | "ol" => {
            let kind = if element.tag == "ol" {
                ListKind::Numbered
            } else {
                ListKind::Bullet
            };
            push_list_items(element, kind, 0, alignment, blocks);
        }
        _ => {
            let text = element.text_content();
            if !text.trim().is_empty() {
                blocks.push(Block::Paragraph {
                    runs: vec![StyledRun::plain(text)],
                    alignment: None,
                });
            }
        }
    }
}

fn push_list_items(
    list: &MarkupElement,
    kind: ListKind,
    level: u8,
    alignment: Option<Alignment>,
    blocks: &mut Vec<Block>,
) {
    for child in &list.children {
        let MarkupNode::Element(item) = child else {
            continue;
        };
        if item.tag != "li" {
            continue;
        }
        let item_kind = match item.attribute("data-list") {
            Some("bullet") => ListKind::Bullet,
            Some("ordered") => ListKind::Numbered,
            _ => kind,
        };
        let text: String = item
            .children
            .iter()
            .filter(|node| !is_list(node))
            .map(MarkupNode::text_content)
            .collect();
        blocks.push(Block::ListItem {
            kind: item_kind,
            level,
            text: text.trim().to_string(),
            alignment: alignment_of(item).or(alignment),
        });
        for nested in &item.children {
            if let MarkupNode::Element(sublist) = nested {
                if sublist.tag == "ul" || sublist.tag == "ol" {
                    let nested_kind = if sublist.tag == "ol" {
                        ListKind::Numbered
                    } else {
                        ListKind::Bullet
                    };
                    push_list_items(sublist, nested_kind, level.saturating_add(1), alignment, blocks);
                }
            }
        }
    }
}

fn is_list(node: &MarkupNode) -> bool {
    matches!(node, MarkupNode::Element(element) if element.tag == "ul" || element.tag == "ol")
}

fn alignment_of(element: &MarkupElement) -> Option<Alignment> {
    if element.has_class("ql-align-center") {
        Some(Alignment::Center)
    } else if element.has_class("ql-align-right") {
        Some(Alignment::Right)
    } else if element.has_class("ql-align-justify") {
        Some(Alignment::Justify)
    } else {
        None
    }
}

fn runs_of(element: &MarkupElement) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    for child in &element.children {
        collect_runs(child, &RunStyle::default(), &mut runs);
    }
    runs
}

fn collect_runs(node: &MarkupNode, inherited: &RunStyle, runs: &mut Vec<StyledRun>) {
    match node {
        MarkupNode::Text(text) => {
            if !text.is_empty() {
                runs.push(StyledRun {
                    text: text.clone(),
                    style: inherited.clone(),
                });
            }
        }
        MarkupNode::Element(element) => {
            let mut style = inherited.clone();
            match element.tag.as_str() {
                "strong" | "b" => style.bold = true,
                "em" | "i" => style.italic = true,
                "u" => style.underline = true,
                "s" | "strike" | "del" => style.strike = true,
                _ => {}
            }
            if let Some(color) = element.style_property("color") {
                style.color = Some(color_to_hex(color));
            }
            if let Some(background) = element.style_property("background-color") {
                style.highlight = Some(color_to_hex(background));
            }
            for child in &element.children {
                collect_runs(child, &style, runs);
            }
        }
    }
}

/// Converts `rgb(r, g, b)` or `#rrggbb` to uppercase `RRGGBB`.
pub fn color_to_hex(value: &str) -> String {
    let value = value.trim();
    if let Some(caps) = RGB_RE.captures(value) {
        let channel = |i: usize| caps[i].parse::<u16>().map_or(0, |c| c.min(255));
        return format!("{:02X}{:02X}{:02X}", channel(1), channel(2), channel(3));
    }
    if let Some(caps) = HEX_RE.captures(value) {
        let digits = &caps[1];
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        return expanded.to_ascii_uppercase();
    }
    DEFAULT_COLOR_HEX.to_string()
}
