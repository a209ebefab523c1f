//! Export projection of finalized notes.
//!
//! # Responsibility
//! - Build one intermediate `ExportDocument` per note (`document`).
//! - Render it as markdown text (`text`), a styled HTML page (`html`) or a
//!   `.docx` package (`docx` builds the tree, `ooxml` packs it).
//! - Name export files after the note title.
//!
//! # Invariants
//! - Formats are independent: a failure in one never blocks the others.
//! - Exports never mutate the note.
//!
//! # See also
//! - `ledger::table::LedgerData::totals` for the shared total computation.

pub mod document;
pub mod docx;
pub mod html;
pub mod markup;
pub mod ooxml;
pub mod text;

use crate::export::document::ExportDocument;
use crate::model::note::Note;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const UNTITLED_FILE_STEM: &str = "untitled";

/// Export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Markdown,
    /// Styled page ready for printing to PDF.
    Html,
    /// Word-processor `.docx` package.
    Document,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Markdown, Self::Html, Self::Document];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Document => "docx",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Document => "docx",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an export format name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownExportFormat(pub String);

impl Display for UnknownExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown export format `{}` (expected md, html or docx)", self.0)
    }
}

impl Error for UnknownExportFormat {}

impl FromStr for ExportFormat {
    type Err = UnknownExportFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" | "text" => Ok(Self::Markdown),
            "html" | "pdf" => Ok(Self::Html),
            "docx" | "document" => Ok(Self::Document),
            _ => Err(UnknownExportFormat(value.to_string())),
        }
    }
}

/// Export rendering error.
#[derive(Debug)]
pub enum ExportError {
    Zip(zip::result::ZipError),
    Io(std::io::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zip(err) => write!(f, "document packaging failed: {err}"),
            Self::Io(err) => write!(f, "document write failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Zip(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Zip(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// One rendered export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl ExportFile {
    /// Contents as text, `None` for binary formats.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}

/// File stem for a note title: every whitespace run, leading and trailing
/// ones included, becomes `_`.
pub fn sanitize_file_name(title: &str) -> String {
    let stem = WHITESPACE_RUN_RE
        .replace_all(title, "_")
        .replace(['/', '\\'], "_");
    if stem.is_empty() {
        UNTITLED_FILE_STEM.to_string()
    } else {
        stem
    }
}

/// Renders an already built document in one format.
pub fn render(document: &ExportDocument, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    Ok(match format {
        ExportFormat::Markdown => text::render_markdown(document).into_bytes(),
        ExportFormat::Html => html::render_html(document).into_bytes(),
        ExportFormat::Document => docx::render_docx(document)?,
    })
}

/// Exports `note` in one format.
pub fn export_note(note: &Note, format: ExportFormat) -> Result<ExportFile, ExportError> {
    let document = ExportDocument::from_note(note);
    export_document(note, &document, format)
}

/// Exports `note` in every format; each result stands alone.
pub fn export_all(note: &Note) -> Vec<(ExportFormat, Result<ExportFile, ExportError>)> {
    let document = ExportDocument::from_note(note);
    ExportFormat::ALL
        .into_iter()
        .map(|format| (format, export_document(note, &document, format)))
        .collect()
}

fn export_document(
    note: &Note,
    document: &ExportDocument,
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    match render(document, format) {
        Ok(contents) => {
            info!(
                "event=export module=export status=ok note_id={} format={format} bytes={}",
                note.id,
                contents.len()
            );
            Ok(ExportFile {
                file_name: format!("{}.{}", sanitize_file_name(&note.title), format.extension()),
                contents,
            })
        }
        Err(err) => {
            error!(
                "event=export module=export status=error note_id={} format={format} error={err}",
                note.id
            );
            Err(err)
        }
    }
}
