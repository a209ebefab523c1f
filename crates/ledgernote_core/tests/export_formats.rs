use ledgernote_core::export::docx::{build_document, render_docx, DocNode};
use ledgernote_core::export::document::{ExportBody, ExportDocument};
use ledgernote_core::export::html::render_html;
use ledgernote_core::export::text::render_markdown;
use ledgernote_core::{export_all, export_note, ExportFormat, Note, NoteMode};
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn docx_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

fn ledger_note(content: &str) -> Note {
    Note {
        id: 21,
        title: "March  expenses".to_string(),
        content: content.to_string(),
        tags: vec!["money".to_string()],
        mode: NoteMode::Ledger,
        created_at: 0,
        updated_at: 0,
    }
}

const DATE_AMOUNT: &str = r#"{"headers":["Date","Amount"],"rows":[{"id":"a","data":["2024-01-01","10.5"]},{"id":"b","data":["2024-01-02","-2.5"]}],"sumColumnIndices":[1]}"#;

#[test]
fn every_format_shows_the_same_total() {
    let document = ExportDocument::from_note(&ledger_note(DATE_AMOUNT));

    let markdown = render_markdown(&document);
    assert!(markdown.ends_with("| **Total Amount** | **8.00** |"));

    let html = render_html(&document);
    assert!(html.contains(">Total Amount</th><th style=\"padding: 8px; border: 1px solid #ddd; text-align: right;\">8.00</th></tr>"));
    assert!(html.contains(">10.50</td>"));
    assert!(html.contains(">-2.50</td>"));

    let tree = build_document(&document);
    let DocNode::Table(table) = tree.children.last().unwrap() else {
        panic!("expected a ledger table");
    };
    assert_eq!(table.rows.len(), 4);
    assert!(table.rows[0].table_header);
    let total_row = &table.rows[3];
    assert_eq!(total_row.cells[0].plain_text(), "Total Amount");
    assert_eq!(total_row.cells[1].plain_text(), "8.00");
    assert!(total_row.cells[1].children[0].runs[0].bold);
}

#[test]
fn docx_archive_carries_the_package_parts_and_total_run() {
    let note = ledger_note(DATE_AMOUNT);
    let file = export_note(&note, ExportFormat::Document).unwrap();

    assert_eq!(file.file_name, "March_expenses.docx");
    assert!(file.contents.starts_with(b"PK"));
    assert!(file.text().is_none());

    let archive = ZipArchive::new(Cursor::new(file.contents.as_slice())).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "word/document.xml",
        "word/numbering.xml",
    ] {
        assert!(names.contains(&part), "missing {part} in {names:?}");
    }

    let content_types = docx_part(&file.contents, "[Content_Types].xml");
    assert!(content_types.contains("wordprocessingml.document.main+xml"));

    let document = docx_part(&file.contents, "word/document.xml");
    assert!(document.contains(
        r#"<w:jc w:val="right"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">8.00</w:t></w:r>"#
    ));
    assert!(document.contains(r#"<w:t xml:space="preserve">Total Amount</w:t>"#));
    assert!(document.contains(r#"<w:t xml:space="preserve">10.50</w:t>"#));
}

#[test]
fn docx_numbering_part_declares_nested_list_levels() {
    let note = Note {
        mode: NoteMode::Note,
        content: "<ol><li>outer<ol><li>inner</li></ol></li></ol>".to_string(),
        ..ledger_note("")
    };
    let bytes = render_docx(&ExportDocument::from_note(&note)).unwrap();

    let document = docx_part(&bytes, "word/document.xml");
    assert!(document.contains(r#"<w:ilvl w:val="1"/><w:numId w:val="1"/>"#));
    let numbering = docx_part(&bytes, "word/numbering.xml");
    assert!(numbering.contains(r#"<w:abstractNum w:abstractNumId="0">"#));
    assert!(numbering.contains(r#"<w:lvl w:ilvl="1">"#));
}

#[test]
fn legacy_payload_exports_through_the_migration_mapping() {
    let note = ledger_note(r#"[{"description":"Coffee","quantity":2,"price":3},{"label":"Discount","price":1,"operation":"-"}]"#);

    let file = export_note(&note, ExportFormat::Markdown).unwrap();
    let markdown = file.text().unwrap();

    assert!(markdown.contains("| Description | Value |\n|---|---:|"));
    assert!(markdown.contains("| Coffee | 6 |"));
    assert!(markdown.ends_with("| **Total Value** | **5.00** |"));
}

#[test]
fn malformed_ledger_exports_a_placeholder_in_every_format() {
    let note = ledger_note("{not json");

    let files = export_all(&note);

    assert_eq!(files.len(), 3);
    for (format, file) in files {
        let file = file.unwrap();
        let text = match format {
            ExportFormat::Document => docx_part(&file.contents, "word/document.xml"),
            _ => file.text().unwrap().to_string(),
        };
        assert!(
            text.contains("Invalid ledger data."),
            "format {format} did not carry the placeholder"
        );
    }
    assert!(matches!(
        ExportDocument::from_note(&note).body,
        ExportBody::Notice(_)
    ));
}

#[test]
fn file_names_follow_the_title() {
    let note = ledger_note(DATE_AMOUNT);
    let names: Vec<String> = export_all(&note)
        .into_iter()
        .map(|(_, file)| file.unwrap().file_name)
        .collect();

    assert_eq!(
        names,
        vec![
            "March_expenses.md",
            "March_expenses.html",
            "March_expenses.docx"
        ]
    );
}

#[test]
fn rich_note_exports_text_markup_and_styled_runs() {
    let note = Note {
        mode: NoteMode::Thesis,
        content: r#"<h1>Intro</h1><p>Plain <u>under</u> <s>gone</s> <span style="color: rgb(0, 128, 255);">blue</span></p>"#.to_string(),
        ..ledger_note("")
    };
    let document = ExportDocument::from_note(&note);

    let markdown = render_markdown(&document);
    assert!(markdown.ends_with("---\n\nIntro\nPlain under gone blue"));

    let html = render_html(&document);
    assert!(html.contains(&note.content));

    let tree = build_document(&document);
    let DocNode::Paragraph(paragraph) = &tree.children[5] else {
        panic!("expected a paragraph");
    };
    let styled: Vec<(&str, bool, bool, Option<&str>)> = paragraph
        .runs
        .iter()
        .map(|run| (run.text.as_str(), run.underline, run.strike, run.color.as_deref()))
        .collect();
    assert_eq!(
        styled,
        vec![
            ("Plain ", false, false, None),
            ("under", true, false, None),
            (" ", false, false, None),
            ("gone", false, true, None),
            (" ", false, false, None),
            ("blue", false, false, Some("0080FF")),
        ]
    );
}

#[test]
fn overflowing_total_renders_as_zero() {
    let note = ledger_note(
        r#"{"headers":["Date","Amount"],"rows":[{"id":"a","data":["x","1e308"]},{"id":"b","data":["y","1e308"]}],"sumColumnIndices":[1]}"#,
    );
    let document = ExportDocument::from_note(&note);

    let markdown = render_markdown(&document);
    assert!(markdown.ends_with("| **Total Amount** | **0.00** |"), "{markdown}");
    assert!(!markdown.contains("inf"));
    assert!(!render_html(&document).contains("inf."));
}
