//! Word-processor document tree.
//!
//! # Responsibility
//! - Build a paragraph/table hierarchy for the word-processor export.
//! - Hand the tree to `ooxml` to pack it into a `.docx` archive.
//!
//! # Invariants
//! - List paragraphs reference a numbering config that every document
//!   declares, at a level that config defines.
//! - Ledger total rows place the label cell immediately left of the value
//!   cell; a first-column total has no label.

use crate::export::document::{
    Alignment, Block, ExportBody, ExportDocument, LedgerTable, ListKind, StyledRun,
};
use crate::export::{ooxml, ExportError};

pub const DEFAULT_NUMBERING: &str = "default-numbering";
pub const BULLET_NUMBERING: &str = "bullet-numbering";
/// Deepest list level a word-processor numbering definition supports.
pub const MAX_LIST_LEVEL: u8 = 8;
const HEADER_FONT: &str = "Arial";
/// Half-points.
const TITLE_SIZE: u32 = 44;
const META_SIZE: u32 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct DocDocument {
    pub numbering: Vec<NumberingConfig>,
    pub children: Vec<DocNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberingConfig {
    pub reference: String,
    pub levels: Vec<NumberingLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberingLevel {
    pub level: u8,
    pub format: String,
    pub text: String,
    pub alignment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Paragraph(DocParagraph),
    Table(DocTable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Title,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
}

impl HeadingLevel {
    fn from_level(level: u8) -> Self {
        match level {
            1 => Self::Heading1,
            2 => Self::Heading2,
            3 => Self::Heading3,
            _ => Self::Heading4,
        }
    }

    /// Paragraph style id in the package's style sheet.
    pub fn style_id(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Heading1 => "Heading1",
            Self::Heading2 => "Heading2",
            Self::Heading3 => "Heading3",
            Self::Heading4 => "Heading4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingRef {
    pub reference: String,
    pub level: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocParagraph {
    pub runs: Vec<DocRun>,
    pub heading: Option<HeadingLevel>,
    pub alignment: Option<Alignment>,
    pub numbering: Option<NumberingRef>,
}

impl DocParagraph {
    fn text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![DocRun::text(text)],
            ..Self::default()
        }
    }

    /// Concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocRun {
    pub text: String,
    pub bold: bool,
    pub italics: bool,
    pub underline: bool,
    pub strike: bool,
    pub color: Option<String>,
    pub highlight: Option<String>,
    pub size: Option<u32>,
    pub font: Option<String>,
}

impl DocRun {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::text(text)
        }
    }
}

impl From<&StyledRun> for DocRun {
    fn from(run: &StyledRun) -> Self {
        Self {
            text: run.text.clone(),
            bold: run.style.bold,
            italics: run.style.italic,
            underline: run.style.underline,
            strike: run.style.strike,
            color: run.style.color.clone(),
            highlight: run.style.highlight.clone(),
            size: None,
            font: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocTable {
    pub width_percent: u8,
    pub rows: Vec<DocTableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocTableRow {
    pub cells: Vec<DocTableCell>,
    pub table_header: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocTableCell {
    pub children: Vec<DocParagraph>,
}

impl DocTableCell {
    fn single(paragraph: DocParagraph) -> Self {
        Self {
            children: vec![paragraph],
        }
    }

    /// Text of the cell's paragraphs joined by newlines.
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(DocParagraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds the document tree for `document`.
pub fn build_document(document: &ExportDocument) -> DocDocument {
    let header_run = |text: String, size: u32, bold: bool| DocRun {
        bold,
        size: Some(size),
        font: Some(HEADER_FONT.to_string()),
        ..DocRun::text(text)
    };

    let mut children = vec![
        DocNode::Paragraph(DocParagraph {
            runs: vec![header_run(document.title.clone(), TITLE_SIZE, true)],
            heading: Some(HeadingLevel::Title),
            ..DocParagraph::default()
        }),
        DocNode::Paragraph(DocParagraph {
            runs: vec![header_run(format!("Mode: {}", document.mode), META_SIZE, false)],
            ..DocParagraph::default()
        }),
        DocNode::Paragraph(DocParagraph {
            runs: vec![header_run(format!("Tags: {}", document.tag_line()), META_SIZE, false)],
            ..DocParagraph::default()
        }),
        DocNode::Paragraph(DocParagraph::text("")),
    ];

    match &document.body {
        ExportBody::Rich { blocks, .. } => {
            children.extend(blocks.iter().map(|block| DocNode::Paragraph(block_paragraph(block))));
        }
        ExportBody::Ledger(table) => children.push(DocNode::Table(ledger_table(table))),
        ExportBody::Notice(notice) => children.push(DocNode::Paragraph(DocParagraph::text(notice.clone()))),
    }

    DocDocument {
        numbering: vec![
            numbering_config(DEFAULT_NUMBERING, "decimal", |level| format!("%{}.", level + 1)),
            numbering_config(BULLET_NUMBERING, "bullet", |_| "\u{2022}".to_string()),
        ],
        children,
    }
}

/// Builds the document tree for `document` and packs it as `.docx` bytes.
pub fn render_docx(document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    ooxml::write_package(&build_document(document))
}

fn numbering_config(reference: &str, format: &str, text: impl Fn(u8) -> String) -> NumberingConfig {
    NumberingConfig {
        reference: reference.to_string(),
        levels: (0..=MAX_LIST_LEVEL)
            .map(|level| NumberingLevel {
                level,
                format: format.to_string(),
                text: text(level),
                alignment: "left".to_string(),
            })
            .collect(),
    }
}

fn block_paragraph(block: &Block) -> DocParagraph {
    match block {
        Block::Heading {
            level,
            runs,
            alignment,
        } => DocParagraph {
            runs: runs.iter().map(DocRun::from).collect(),
            heading: Some(HeadingLevel::from_level(*level)),
            alignment: *alignment,
            ..DocParagraph::default()
        },
        Block::Paragraph { runs, alignment } => DocParagraph {
            runs: runs.iter().map(DocRun::from).collect(),
            alignment: *alignment,
            ..DocParagraph::default()
        },
        Block::ListItem {
            kind,
            level,
            text,
            alignment,
        } => {
            let reference = match kind {
                ListKind::Bullet => BULLET_NUMBERING,
                ListKind::Numbered => DEFAULT_NUMBERING,
            };
            DocParagraph {
                alignment: *alignment,
                numbering: Some(NumberingRef {
                    reference: reference.to_string(),
                    level: (*level).min(MAX_LIST_LEVEL),
                }),
                ..DocParagraph::text(text.clone())
            }
        }
    }
}

fn ledger_table(table: &LedgerTable) -> DocTable {
    let width = table.headers.len();
    let mut rows = Vec::with_capacity(table.rows.len() + table.totals.len() + 1);

    rows.push(DocTableRow {
        cells: table
            .headers
            .iter()
            .map(|header| {
                DocTableCell::single(DocParagraph {
                    runs: vec![DocRun::bold(header.clone())],
                    ..DocParagraph::default()
                })
            })
            .collect(),
        table_header: true,
    });

    for row in &table.rows {
        rows.push(DocTableRow {
            cells: row
                .iter()
                .enumerate()
                .map(|(index, cell)| {
                    let alignment = if table.is_sum_column(index) {
                        Alignment::Right
                    } else {
                        Alignment::Left
                    };
                    DocTableCell::single(DocParagraph {
                        alignment: Some(alignment),
                        ..DocParagraph::text(cell.clone())
                    })
                })
                .collect(),
            table_header: false,
        });
    }

    for total in &table.totals {
        let mut cells = vec![DocTableCell::single(DocParagraph::text("")); width];
        let right_bold = |text: String| {
            DocTableCell::single(DocParagraph {
                runs: vec![DocRun::bold(text)],
                alignment: Some(Alignment::Right),
                ..DocParagraph::default()
            })
        };
        if total.index > 0 {
            cells[total.index - 1] = right_bold(total.label.clone());
        }
        if let Some(cell) = cells.get_mut(total.index) {
            *cell = right_bold(total.value.clone());
        }
        rows.push(DocTableRow {
            cells,
            table_header: false,
        });
    }

    DocTable {
        width_percent: 100,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        build_document, DocNode, HeadingLevel, BULLET_NUMBERING, DEFAULT_NUMBERING, MAX_LIST_LEVEL,
    };
    use crate::export::document::ExportDocument;
    use crate::model::note::{Note, NoteMode};

    fn note(mode: NoteMode, content: &str) -> Note {
        Note {
            id: 3,
            title: "Weekly".to_string(),
            content: content.to_string(),
            tags: vec!["work".to_string()],
            mode,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn header_paragraphs_precede_the_body() {
        let doc = build_document(&ExportDocument::from_note(&note(NoteMode::Task, "<p>x</p>")));
        assert_eq!(doc.children.len(), 5);
        let DocNode::Paragraph(title) = &doc.children[0] else {
            panic!("expected title paragraph");
        };
        assert_eq!(title.heading, Some(HeadingLevel::Title));
        assert!(title.runs[0].bold);
        let DocNode::Paragraph(tags) = &doc.children[2] else {
            panic!("expected tags paragraph");
        };
        assert_eq!(tags.plain_text(), "Tags: work");
        let DocNode::Paragraph(spacer) = &doc.children[3] else {
            panic!("expected spacer");
        };
        assert_eq!(spacer.plain_text(), "");
    }

    #[test]
    fn list_items_reference_the_declared_numbering() {
        let doc = build_document(&ExportDocument::from_note(&note(
            NoteMode::Note,
            "<ol><li>a</li></ol><ul><li>b</li></ul>",
        )));
        let references: Vec<&str> = doc.numbering.iter().map(|n| n.reference.as_str()).collect();
        assert_eq!(references, vec![DEFAULT_NUMBERING, BULLET_NUMBERING]);
        let DocNode::Paragraph(numbered) = &doc.children[4] else {
            panic!("expected list paragraph");
        };
        assert_eq!(numbered.numbering.as_ref().map(|n| n.reference.as_str()), Some(DEFAULT_NUMBERING));
        let DocNode::Paragraph(bullet) = &doc.children[5] else {
            panic!("expected list paragraph");
        };
        let bullet = bullet.numbering.as_ref().unwrap();
        assert_eq!((bullet.reference.as_str(), bullet.level), (BULLET_NUMBERING, 0));
    }

    #[test]
    fn nested_list_levels_are_declared_by_their_numbering() {
        let mut content = String::from("<ol><li>0");
        for depth in 1..=10 {
            content.push_str(&format!("<ol><li>{depth}"));
        }
        for _ in 0..=10 {
            content.push_str("</li></ol>");
        }
        let doc = build_document(&ExportDocument::from_note(&note(NoteMode::Note, &content)));

        let levels: Vec<u8> = doc.children[4..]
            .iter()
            .filter_map(|node| match node {
                DocNode::Paragraph(p) => p.numbering.as_ref().map(|n| n.level),
                DocNode::Table(_) => None,
            })
            .collect();
        assert_eq!(levels.len(), 11);
        assert_eq!(levels[1], 1);
        assert_eq!(*levels.last().unwrap(), MAX_LIST_LEVEL);
        for config in &doc.numbering {
            let declared: Vec<u8> = config.levels.iter().map(|l| l.level).collect();
            assert!(levels.iter().all(|level| declared.contains(level)));
        }
        assert_eq!(doc.numbering[0].levels[1].text, "%2.");
    }

    #[test]
    fn empty_ledger_notice_becomes_a_body_paragraph() {
        let doc = build_document(&ExportDocument::from_note(&note(NoteMode::Ledger, "null")));
        let DocNode::Paragraph(notice) = &doc.children[4] else {
            panic!("expected notice paragraph");
        };
        assert_eq!(notice.plain_text(), "Empty ledger.");
    }
}
