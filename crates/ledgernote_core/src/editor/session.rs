//! Editing session: reconciler, autosave and clock wired together.
//!
//! # Responsibility
//! - Route every successful edit of the open note into the autosave
//!   scheduler as a fresh snapshot.
//! - Drive the debounce with the injected clock.
//!
//! # Invariants
//! - The autosave baseline is the persisted copy, never the migrated working
//!   copy. A load-time rewrite is therefore saved by the next tick.
//! - Closing or switching notes discards unsaved snapshots of the previous
//!   note; call `flush` first to keep them.

use crate::autosave::scheduler::{AutoSaveConfig, AutoSaveScheduler, SaveOutcome};
use crate::clock::Clock;
use crate::editor::reconciler::{
    ContentReconciler, EditorState, LoadOutcome, ReconcileResult,
};
use crate::editor::surface::RichTextSurface;
use crate::model::note::{Note, NoteMode};
use crate::repo::note_repo::NoteRepository;
use chrono::NaiveDate;

/// One editor window bound to a repository.
pub struct EditorSession<S: RichTextSurface, R: NoteRepository, C: Clock> {
    reconciler: ContentReconciler<S>,
    autosave: AutoSaveScheduler<R>,
    clock: C,
}

impl<S: RichTextSurface, R: NoteRepository, C: Clock> EditorSession<S, R, C> {
    pub fn new(surface: S, repo: R, clock: C, config: AutoSaveConfig) -> Self {
        Self {
            reconciler: ContentReconciler::new(surface),
            autosave: AutoSaveScheduler::new(repo, config),
            clock,
        }
    }

    pub fn reconciler(&self) -> &ContentReconciler<S> {
        &self.reconciler
    }

    pub fn autosave(&self) -> &AutoSaveScheduler<R> {
        &self.autosave
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn note(&self) -> Option<&Note> {
        self.reconciler.note()
    }

    pub fn state(&self) -> Option<EditorState> {
        self.reconciler.state()
    }

    /// Opens `note` (as read from storage) for editing.
    pub fn open(&mut self, note: Note) -> LoadOutcome {
        self.autosave.load(&note);
        let outcome = self.reconciler.open(note, self.clock.today());
        if outcome.content_rewritten {
            self.observe();
        }
        outcome
    }

    /// Closes the open note without saving pending edits.
    pub fn close(&mut self) -> Option<Note> {
        self.autosave.close();
        self.reconciler.close()
    }

    /// Runs an edit against the reconciler and schedules a save on success.
    pub fn edit<T>(
        &mut self,
        op: impl FnOnce(&mut ContentReconciler<S>, NaiveDate) -> ReconcileResult<T>,
    ) -> ReconcileResult<T> {
        let today = self.clock.today();
        let value = op(&mut self.reconciler, today)?;
        self.observe();
        Ok(value)
    }

    /// Forwards a user edit reported by the rich-text surface.
    pub fn surface_changed(&mut self, html: &str) -> ReconcileResult<bool> {
        let changed = self.reconciler.handle_surface_change(html)?;
        if changed {
            self.observe();
        }
        Ok(changed)
    }

    pub fn set_title(&mut self, title: &str) -> ReconcileResult<()> {
        self.edit(|reconciler, _| reconciler.set_title(title))
    }

    pub fn set_mode(&mut self, mode: NoteMode) -> ReconcileResult<bool> {
        self.edit(|reconciler, today| reconciler.set_mode(mode, today))
    }

    /// Lets the autosave fire if its window has elapsed.
    pub fn tick(&mut self) -> SaveOutcome {
        self.autosave.poll(self.clock.now_ms())
    }

    /// Writes any pending snapshot now.
    pub fn flush(&mut self) -> SaveOutcome {
        self.autosave.flush(self.clock.now_ms())
    }

    fn observe(&mut self) {
        if let Some(note) = self.reconciler.note() {
            self.autosave.observe(note, self.clock.now_ms());
        }
    }
}

