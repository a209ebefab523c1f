//! WordprocessingML package writer.
//!
//! # Responsibility
//! - Serialize a `DocDocument` into the XML parts of a `.docx` package.
//! - Pack the parts into a zip archive.
//!
//! # Invariants
//! - Every package carries `[Content_Types].xml`, `_rels/.rels`,
//!   `word/document.xml`, `word/numbering.xml` and `word/styles.xml`.
//! - Numbering config `n` in the tree becomes `w:num` id `n + 1`.

use crate::export::document::Alignment;
use crate::export::docx::{DocDocument, DocNode, DocParagraph, DocRun, DocTable};
use crate::export::ExportError;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const NUMBERING_PART: &str = "word/numbering.xml";
pub const STYLES_PART: &str = "word/styles.xml";

const CONTENT_TYPES_XML: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Hanging indent per list level, in twentieths of a point.
const LIST_INDENT_STEP: u32 = 720;
const LIST_HANGING: u32 = 360;
/// `w:tblW` percentages are expressed in fiftieths of a percent.
const PERCENT_UNITS: u32 = 50;
const TABLE_BORDER: &str = r#"w:val="single" w:sz="4" w:space="0" w:color="DDDDDD""#;

/// Packs `document` into `.docx` bytes.
pub fn write_package(document: &DocDocument) -> Result<Vec<u8>, ExportError> {
    let parts = [
        (CONTENT_TYPES_PART, xml_part(CONTENT_TYPES_XML)),
        (ROOT_RELS_PART, xml_part(ROOT_RELS_XML)),
        (DOCUMENT_RELS_PART, xml_part(DOCUMENT_RELS_XML)),
        (DOCUMENT_PART, document_xml(document)),
        (NUMBERING_PART, numbering_xml(document)),
        (STYLES_PART, styles_xml()),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, xml) in parts {
        writer.start_file(name, options)?;
        writer.write_all(xml.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

fn xml_part(body: &str) -> String {
    format!("{XML_DECLARATION}{body}")
}

/// Serializes the body part.
pub fn document_xml(document: &DocDocument) -> String {
    let mut out = format!(
        r#"{XML_DECLARATION}<w:document xmlns:w="{WORD_NS}" xmlns:r="{RELATIONSHIP_NS}"><w:body>"#
    );
    for node in &document.children {
        match node {
            DocNode::Paragraph(paragraph) => push_paragraph(&mut out, document, paragraph),
            DocNode::Table(table) => push_table(&mut out, document, table),
        }
    }
    // A table may not end the body.
    if matches!(document.children.last(), Some(DocNode::Table(_))) {
        out.push_str("<w:p/>");
    }
    out.push_str("<w:sectPr/></w:body></w:document>");
    out
}

/// Serializes one `w:abstractNum` and one `w:num` per numbering config.
pub fn numbering_xml(document: &DocDocument) -> String {
    let mut out = format!(r#"{XML_DECLARATION}<w:numbering xmlns:w="{WORD_NS}">"#);
    for (index, config) in document.numbering.iter().enumerate() {
        out.push_str(&format!(
            r#"<w:abstractNum w:abstractNumId="{index}"><w:multiLevelType w:val="hybridMultilevel"/>"#
        ));
        for level in &config.levels {
            let indent = LIST_INDENT_STEP * (u32::from(level.level) + 1);
            out.push_str(&format!(
                r#"<w:lvl w:ilvl="{}"><w:start w:val="1"/><w:numFmt w:val="{}"/><w:lvlText w:val="{}"/><w:lvlJc w:val="{}"/><w:pPr><w:ind w:left="{indent}" w:hanging="{LIST_HANGING}"/></w:pPr></w:lvl>"#,
                level.level,
                escape_xml(&level.format),
                escape_xml(&level.text),
                escape_xml(&level.alignment),
            ));
        }
        out.push_str("</w:abstractNum>");
    }
    for index in 0..document.numbering.len() {
        out.push_str(&format!(
            r#"<w:num w:numId="{}"><w:abstractNumId w:val="{index}"/></w:num>"#,
            index + 1
        ));
    }
    out.push_str("</w:numbering>");
    out
}

fn styles_xml() -> String {
    let mut out = format!(
        r#"{XML_DECLARATION}<w:styles xmlns:w="{WORD_NS}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="22"/></w:rPr></w:style>"#
    );
    let headings = [
        ("Title", "Title", None, 56),
        ("Heading1", "heading 1", Some(0), 32),
        ("Heading2", "heading 2", Some(1), 28),
        ("Heading3", "heading 3", Some(2), 26),
        ("Heading4", "heading 4", Some(3), 24),
    ];
    for (id, name, outline, size) in headings {
        let outline = outline
            .map(|level| format!(r#"<w:outlineLvl w:val="{level}"/>"#))
            .unwrap_or_default();
        out.push_str(&format!(
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/>{outline}</w:pPr><w:rPr><w:b/><w:sz w:val="{size}"/></w:rPr></w:style>"#
        ));
    }
    out.push_str("</w:styles>");
    out
}

fn push_paragraph(out: &mut String, document: &DocDocument, paragraph: &DocParagraph) {
    out.push_str("<w:p>");

    let mut properties = String::new();
    if let Some(heading) = paragraph.heading {
        properties.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, heading.style_id()));
    }
    if let Some(numbering) = &paragraph.numbering {
        if let Some(index) = document
            .numbering
            .iter()
            .position(|config| config.reference == numbering.reference)
        {
            properties.push_str(&format!(
                r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
                numbering.level,
                index + 1
            ));
        }
    }
    if let Some(alignment) = paragraph.alignment {
        properties.push_str(&format!(r#"<w:jc w:val="{}"/>"#, justification(alignment)));
    }
    if !properties.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(&properties);
        out.push_str("</w:pPr>");
    }

    for run in &paragraph.runs {
        push_run(out, run);
    }
    out.push_str("</w:p>");
}

fn push_run(out: &mut String, run: &DocRun) {
    out.push_str("<w:r>");

    // Child order follows the CT_RPr sequence.
    let mut properties = String::new();
    if let Some(font) = &run.font {
        let font = escape_xml(font);
        properties.push_str(&format!(r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}"/>"#));
    }
    if run.bold {
        properties.push_str("<w:b/>");
    }
    if run.italics {
        properties.push_str("<w:i/>");
    }
    if run.strike {
        properties.push_str("<w:strike/>");
    }
    if let Some(color) = &run.color {
        properties.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape_xml(color)));
    }
    if let Some(size) = run.size {
        properties.push_str(&format!(r#"<w:sz w:val="{size}"/>"#));
    }
    if run.underline {
        properties.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(highlight) = &run.highlight {
        properties.push_str(&format!(
            r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
            escape_xml(highlight)
        ));
    }
    if !properties.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&properties);
        out.push_str("</w:rPr>");
    }

    out.push_str(r#"<w:t xml:space="preserve">"#);
    out.push_str(&escape_xml(&run.text));
    out.push_str("</w:t></w:r>");
}

fn push_table(out: &mut String, document: &DocDocument, table: &DocTable) {
    let columns = table.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);

    out.push_str(&format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="{}" w:type="pct"/><w:tblBorders>"#,
        u32::from(table.width_percent) * PERCENT_UNITS
    ));
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        out.push_str(&format!("<w:{edge} {TABLE_BORDER}/>"));
    }
    out.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        out.push_str("<w:gridCol/>");
    }
    out.push_str("</w:tblGrid>");

    for row in &table.rows {
        out.push_str("<w:tr>");
        if row.table_header {
            out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
        }
        for cell in &row.cells {
            out.push_str("<w:tc>");
            if cell.children.is_empty() {
                out.push_str("<w:p/>");
            }
            for paragraph in &cell.children {
                push_paragraph(out, document, paragraph);
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

fn justification(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

/// Escapes markup characters and drops characters XML 1.0 cannot carry.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            c if u32::from(c) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{document_xml, escape_xml, numbering_xml};
    use crate::export::document::ExportDocument;
    use crate::export::docx::build_document;
    use crate::model::note::{Note, NoteMode};

    fn note(content: &str) -> Note {
        Note {
            id: 9,
            title: "Q&A <draft>".to_string(),
            content: content.to_string(),
            tags: Vec::new(),
            mode: NoteMode::Note,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn text_is_escaped_and_whitespace_preserved() {
        assert_eq!(escape_xml("a & <b> \"c\"\u{1}"), "a &amp; &lt;b&gt; &quot;c&quot;");

        let doc = build_document(&ExportDocument::from_note(&note("<p>x</p>")));
        let xml = document_xml(&doc);
        assert!(xml.contains(r#"<w:t xml:space="preserve">Q&amp;A &lt;draft&gt;</w:t>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.ends_with("<w:sectPr/></w:body></w:document>"));
    }

    #[test]
    fn list_paragraphs_point_at_declared_numbering_instances() {
        let doc = build_document(&ExportDocument::from_note(&note(
            "<ol><li>one<ol><li>two</li></ol></li></ol><ul><li>dot</li></ul>",
        )));

        let body = document_xml(&doc);
        assert!(body.contains(r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr>"#));
        assert!(body.contains(r#"<w:numPr><w:ilvl w:val="1"/><w:numId w:val="1"/></w:numPr>"#));
        assert!(body.contains(r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="2"/></w:numPr>"#));

        let numbering = numbering_xml(&doc);
        assert!(numbering.contains(r#"<w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%2."/>"#));
        assert!(numbering.contains(r#"<w:lvl w:ilvl="8">"#));
        assert!(numbering.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>"#));
    }

    #[test]
    fn trailing_table_is_followed_by_a_paragraph() {
        let ledger = Note {
            mode: NoteMode::Ledger,
            content: r#"{"headers":["A"],"rows":[{"id":"r","data":["1"]}],"sumColumnIndices":[0]}"#
                .to_string(),
            ..note("")
        };
        let xml = document_xml(&build_document(&ExportDocument::from_note(&ledger)));
        assert!(xml.contains("<w:trPr><w:tblHeader/></w:trPr>"));
        assert!(xml.contains(r#"<w:tblW w:w="5000" w:type="pct"/>"#));
        assert!(xml.contains("</w:tbl><w:p/><w:sectPr/>"));
    }
}
