use chrono::NaiveDate;
use ledgernote_core::{
    ContentReconciler, EditorState, LedgerError, Note, NoteMode, ReconcileError, RichTextSurface,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SurfaceEvent {
    Render(String),
    Enable,
    Disable,
}

#[derive(Default)]
struct RecordingSurface {
    events: Vec<SurfaceEvent>,
}

impl RichTextSurface for RecordingSurface {
    fn render(&mut self, html: &str) {
        self.events.push(SurfaceEvent::Render(html.to_string()));
    }

    fn enable(&mut self) {
        self.events.push(SurfaceEvent::Enable);
    }

    fn disable(&mut self) {
        self.events.push(SurfaceEvent::Disable);
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn note(mode: NoteMode, content: &str) -> Note {
    Note {
        id: 11,
        title: "Errands".to_string(),
        content: content.to_string(),
        tags: vec!["home".to_string()],
        mode,
        created_at: 1,
        updated_at: 2,
    }
}

#[test]
fn rich_note_enables_and_renders_the_surface() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());

    let outcome = reconciler.open(note(NoteMode::Task, "<p>buy milk</p>"), today());

    assert_eq!(outcome.state, EditorState::RichEditing);
    assert!(!outcome.content_rewritten);
    assert_eq!(
        reconciler.surface().events,
        vec![
            SurfaceEvent::Enable,
            SurfaceEvent::Render("<p>buy milk</p>".to_string())
        ]
    );
    assert_eq!(reconciler.word_count(), 2);
}

#[test]
fn json_object_in_rich_content_is_cleared_on_load() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());

    let outcome = reconciler.open(
        note(NoteMode::Note, r#"{"headers":["A"],"rows":[]}"#),
        today(),
    );

    assert!(outcome.content_rewritten);
    assert_eq!(reconciler.note().map(|n| n.content.as_str()), Some(""));
    assert_eq!(
        reconciler.surface().events.last(),
        Some(&SurfaceEvent::Render(String::new()))
    );
}

#[test]
fn ledger_note_disables_the_surface() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());

    let outcome = reconciler.open(note(NoteMode::Ledger, ""), today());

    assert_eq!(outcome.state, EditorState::LedgerEditing);
    assert!(outcome.content_rewritten);
    assert_eq!(
        reconciler.surface().events.last(),
        Some(&SurfaceEvent::Disable)
    );
    assert_eq!(reconciler.row_count(), 1);
    assert_eq!(reconciler.word_count(), 0);
}

#[test]
fn ledger_round_trip_through_rich_mode_resets_content() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());
    reconciler.open(note(NoteMode::Ledger, ""), today());
    reconciler.set_cell(0, 2, "99").unwrap();
    reconciler.add_column("Extra").unwrap();

    assert!(reconciler.set_mode(NoteMode::Note, today()).unwrap());
    assert_eq!(reconciler.state(), Some(EditorState::RichEditing));
    assert_eq!(reconciler.note().map(|n| n.content.as_str()), Some(""));
    assert!(reconciler.ledger().is_none());

    assert!(reconciler.set_mode(NoteMode::Ledger, today()).unwrap());
    let ledger = reconciler.ledger().unwrap();
    assert_eq!(ledger.headers.len(), 5);
    assert_eq!(ledger.rows[0].data[2], "");
    assert_eq!(ledger.sum_column_indices, vec![2, 3]);
}

#[test]
fn switching_between_rich_modes_keeps_content() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());
    reconciler.open(note(NoteMode::Note, "<p>draft</p>"), today());

    assert!(reconciler.set_mode(NoteMode::Thesis, today()).unwrap());
    assert!(!reconciler.set_mode(NoteMode::Thesis, today()).unwrap());

    assert_eq!(reconciler.note().map(|n| n.content.as_str()), Some("<p>draft</p>"));
}

#[test]
fn ledger_edits_are_serialized_into_content() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());
    reconciler.open(note(NoteMode::Ledger, ""), today());

    reconciler.set_cell(0, 2, "4.5").unwrap();
    let row = reconciler.add_row(today()).unwrap();
    reconciler.set_cell(1, 2, "1").unwrap();

    let content = reconciler.note().unwrap().content.clone();
    assert!(content.contains(&row));
    assert!(content.contains("\"4.5\""));
    assert_eq!(reconciler.totals()[0].total, 5.5);

    reconciler.remove_row(&row).unwrap();
    assert_eq!(reconciler.totals()[0].total, 4.5);
    assert!(!reconciler.toggle_sum_column(2).unwrap());
    assert_eq!(reconciler.totals().len(), 1);
}

#[test]
fn operations_in_the_wrong_mode_are_rejected() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());
    assert_eq!(
        reconciler.set_title("x"),
        Err(ReconcileError::NoOpenNote)
    );

    reconciler.open(note(NoteMode::Note, ""), today());
    assert_eq!(
        reconciler.add_column("x"),
        Err(ReconcileError::NotLedgerMode)
    );

    reconciler.set_mode(NoteMode::Ledger, today()).unwrap();
    assert_eq!(
        reconciler.handle_surface_change("<p>late</p>"),
        Err(ReconcileError::NotRichMode)
    );
    assert_eq!(
        reconciler.set_cell(3, 0, "x"),
        Err(ReconcileError::Ledger(LedgerError::RowOutOfRange { index: 3, len: 1 }))
    );
}

#[test]
fn empty_document_marker_is_stored_as_empty_content() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());
    reconciler.open(note(NoteMode::Diary, "<p>x</p>"), today());

    assert!(reconciler.handle_surface_change("<p><br></p>").unwrap());
    assert_eq!(reconciler.note().map(|n| n.content.as_str()), Some(""));
    assert!(!reconciler.handle_surface_change("").unwrap());
}

#[test]
fn tag_input_is_trimmed_and_deduplicated() {
    let mut reconciler = ContentReconciler::new(RecordingSurface::default());
    reconciler.open(note(NoteMode::Note, ""), today());

    reconciler.set_tags_input(" work , ,urgent,work").unwrap();

    assert_eq!(reconciler.note().unwrap().tags, vec!["work", "urgent"]);
    let closed = reconciler.close().unwrap();
    assert_eq!(closed.id, 11);
    assert!(reconciler.note().is_none());
}
