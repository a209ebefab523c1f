use ledgernote_core::{
    AutoSaveConfig, AutoSaveScheduler, EditorSession, ManualClock, NewNote, Note, NoteId,
    NoteMode, NoteRepository, RepoError, RepoResult, RichTextSurface, SaveOutcome,
};
use std::cell::{Cell, RefCell};

#[derive(Default)]
struct RecordingRepo {
    updates: RefCell<Vec<Note>>,
    attempts: Cell<usize>,
    failing: Cell<bool>,
}

impl NoteRepository for RecordingRepo {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        Ok(self.updates.borrow().clone())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        Ok(self.updates.borrow().iter().rev().find(|n| n.id == id).cloned())
    }

    fn add_note(&self, _note: &NewNote) -> RepoResult<NoteId> {
        Ok(1)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        self.attempts.set(self.attempts.get() + 1);
        if self.failing.get() {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        self.updates.borrow_mut().push(note.clone());
        Ok(())
    }

    fn delete_note(&self, _id: NoteId) -> RepoResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct NullSurface;

impl RichTextSurface for NullSurface {
    fn render(&mut self, _html: &str) {}
    fn enable(&mut self) {}
    fn disable(&mut self) {}
}

const START_MS: i64 = 1_700_000_000_000;

fn stored(id: NoteId, mode: NoteMode, content: &str) -> Note {
    Note {
        id,
        title: format!("note {id}"),
        content: content.to_string(),
        tags: Vec::new(),
        mode,
        created_at: START_MS - 10_000,
        updated_at: START_MS - 10_000,
    }
}

fn session<'a>(
    repo: &'a RecordingRepo,
    clock: &'a ManualClock,
) -> EditorSession<NullSurface, &'a RecordingRepo, &'a ManualClock> {
    EditorSession::new(NullSurface, repo, clock, AutoSaveConfig::default())
}

#[test]
fn single_edit_is_saved_once_after_quiescence() {
    let repo = RecordingRepo::default();
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);
    session.open(stored(1, NoteMode::Note, "<p>A</p>"));

    assert!(session.surface_changed("<p>AB</p>").unwrap());
    clock.advance(999);
    assert_eq!(
        session.tick(),
        SaveOutcome::Waiting {
            deadline_ms: START_MS + 1_000
        }
    );
    clock.advance(1);
    assert!(matches!(session.tick(), SaveOutcome::Saved { note_id: 1, .. }));
    clock.advance(5_000);
    assert_eq!(session.tick(), SaveOutcome::Idle);

    let updates = repo.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].content, "<p>AB</p>");
    assert_eq!(updates[0].updated_at, START_MS + 1_000);
}

#[test]
fn edits_inside_the_window_reset_the_timer() {
    let repo = RecordingRepo::default();
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);
    session.open(stored(1, NoteMode::Diary, "<p>A</p>"));

    session.surface_changed("<p>AB</p>").unwrap();
    clock.advance(400);
    session.surface_changed("<p>ABC</p>").unwrap();
    clock.advance(600);
    assert!(matches!(session.tick(), SaveOutcome::Waiting { .. }));
    clock.advance(400);
    assert!(matches!(session.tick(), SaveOutcome::Saved { .. }));

    let updates = repo.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].content, "<p>ABC</p>");
}

#[test]
fn reverting_to_the_persisted_value_skips_the_write() {
    let repo = RecordingRepo::default();
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);
    session.open(stored(1, NoteMode::Note, "<p>A</p>"));

    session.surface_changed("<p>AB</p>").unwrap();
    session.surface_changed("<p>A</p>").unwrap();
    clock.advance(1_000);

    assert_eq!(session.tick(), SaveOutcome::Unchanged);
    assert_eq!(repo.attempts.get(), 0);
}

#[test]
fn switching_notes_discards_the_pending_save() {
    let repo = RecordingRepo::default();
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);
    session.open(stored(1, NoteMode::Note, "<p>first</p>"));
    session.surface_changed("<p>first edited</p>").unwrap();
    clock.advance(500);

    session.open(stored(2, NoteMode::Note, "<p>second</p>"));
    clock.advance(2_000);

    assert_eq!(session.tick(), SaveOutcome::Idle);
    assert!(repo.updates.borrow().is_empty());

    session.set_title("renamed").unwrap();
    clock.advance(1_000);
    assert!(matches!(session.tick(), SaveOutcome::Saved { note_id: 2, .. }));
    assert_eq!(repo.updates.borrow()[0].content, "<p>second</p>");
}

#[test]
fn failed_write_is_not_retried_until_the_next_edit() {
    let repo = RecordingRepo::default();
    repo.failing.set(true);
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);
    session.open(stored(1, NoteMode::Note, "<p>A</p>"));

    session.surface_changed("<p>AB</p>").unwrap();
    clock.advance(1_000);
    assert_eq!(session.tick(), SaveOutcome::Failed { note_id: 1 });
    clock.advance(10_000);
    assert_eq!(session.tick(), SaveOutcome::Idle);
    assert_eq!(repo.attempts.get(), 1);

    repo.failing.set(false);
    session.surface_changed("<p>ABC</p>").unwrap();
    clock.advance(1_000);
    assert!(matches!(session.tick(), SaveOutcome::Saved { .. }));
    assert_eq!(repo.attempts.get(), 2);
    assert_eq!(session.autosave().baseline().map(|n| n.content.as_str()), Some("<p>ABC</p>"));
}

#[test]
fn migrated_ledger_content_is_saved_after_load() {
    let repo = RecordingRepo::default();
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);

    let outcome = session.open(stored(
        4,
        NoteMode::Ledger,
        r#"[{"description":"Coffee","quantity":2,"price":3}]"#,
    ));
    assert!(outcome.content_rewritten);
    clock.advance(1_000);

    assert!(matches!(session.tick(), SaveOutcome::Saved { note_id: 4, .. }));
    let saved = &repo.updates.borrow()[0];
    assert!(saved.content.starts_with(r#"{"headers":["Description","Value"]"#));
}

#[test]
fn flush_writes_without_waiting() {
    let repo = RecordingRepo::default();
    let clock = ManualClock::new(START_MS);
    let mut session = session(&repo, &clock);
    session.open(stored(1, NoteMode::Note, ""));
    session.edit(|r, _| r.set_tags_input("a, b, a")).unwrap();

    assert!(matches!(session.flush(), SaveOutcome::Saved { .. }));
    assert_eq!(repo.updates.borrow()[0].tags, vec!["a", "b"]);
    assert_eq!(session.flush(), SaveOutcome::Idle);
}

#[test]
fn saved_timestamp_never_moves_backwards() {
    let repo = RecordingRepo::default();
    let mut scheduler = AutoSaveScheduler::new(&repo, AutoSaveConfig { debounce_ms: 10 });
    let mut baseline = stored(1, NoteMode::Note, "a");
    baseline.updated_at = START_MS + 60_000;
    scheduler.load(&baseline);

    let mut edited = baseline.clone();
    edited.content = "b".to_string();
    assert!(scheduler.observe(&edited, START_MS));

    assert_eq!(
        scheduler.poll(START_MS + 10),
        SaveOutcome::Saved {
            note_id: 1,
            updated_at: START_MS + 60_000
        }
    );
}

#[test]
fn snapshots_of_other_notes_are_ignored() {
    let repo = RecordingRepo::default();
    let mut scheduler = AutoSaveScheduler::new(&repo, AutoSaveConfig::default());
    scheduler.load(&stored(1, NoteMode::Note, "a"));

    let mut foreign = stored(2, NoteMode::Note, "b");
    foreign.title = "other".to_string();

    assert!(!scheduler.observe(&foreign, START_MS));
    assert!(!scheduler.has_pending());
    assert_eq!(scheduler.poll(START_MS + 5_000), SaveOutcome::Idle);
}
