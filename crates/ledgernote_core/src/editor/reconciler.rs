//! Reconciliation between the open note and its editing representation.
//!
//! # Responsibility
//! - Own the in-memory working copy of the open note.
//! - Keep exactly one live representation: the rich-text surface or the
//!   ledger table.
//! - Handle mode transitions and ledger migration on load.
//!
//! # Invariants
//! - In `LedgerEditing` the surface is disabled and `note.content` is the
//!   serialization of the live `LedgerData`.
//! - In `RichEditing` the surface is enabled and `note.content` is the last
//!   HTML it reported.
//! - Switching into ledger mode starts from the default schema; switching out
//!   of it starts from an empty document. Content is not translated across
//!   representations.
//! - `updated_at` is never touched here.

use crate::editor::surface::{normalize_surface_html, RichTextSurface};
use crate::export::markup::word_count;
use crate::ledger::migration::migrate_ledger;
use crate::ledger::table::{ColumnTotal, LedgerData, LedgerError};
use crate::model::note::{parse_tag_input, Note, NoteMode};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Editing-state of the open note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    RichEditing,
    LedgerEditing,
}

/// Reconciler operation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    NoOpenNote,
    /// A ledger operation was requested while the rich surface is live.
    NotLedgerMode,
    /// A surface change arrived while the ledger is live.
    NotRichMode,
    Ledger(LedgerError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOpenNote => write!(f, "no note is open"),
            Self::NotLedgerMode => write!(f, "open note is not in ledger mode"),
            Self::NotRichMode => write!(f, "open note is not in a rich-text mode"),
            Self::Ledger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LedgerError> for ReconcileError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

/// Summary of loading a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub state: EditorState,
    /// Content was rewritten during load (ledger migration or corruption
    /// clearing) and differs from the persisted copy.
    pub content_rewritten: bool,
}

struct OpenNote {
    note: Note,
    state: EditorState,
    ledger: Option<LedgerData>,
}

/// Mediates between the open note and the editing surfaces.
pub struct ContentReconciler<S: RichTextSurface> {
    surface: S,
    open: Option<OpenNote>,
}

impl<S: RichTextSurface> ContentReconciler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            open: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Loads `note` as the open note, replacing any previous one.
    ///
    /// Ledger notes are migrated synchronously. Rich notes whose content is a
    /// JSON object are treated as corrupt and cleared.
    pub fn open(&mut self, note: Note, today: NaiveDate) -> LoadOutcome {
        let note_id = note.id;
        let mut open = OpenNote {
            note,
            state: EditorState::Loading,
            ledger: None,
        };

        let content_rewritten = if open.note.mode == NoteMode::Ledger {
            let migration = migrate_ledger(&open.note.content, today);
            if migration.rewrite {
                open.note.content = migration.data.to_content();
            }
            open.ledger = Some(migration.data);
            open.state = EditorState::LedgerEditing;
            self.surface.render("");
            self.surface.disable();
            migration.rewrite
        } else {
            let corrupt = looks_like_json_object(&open.note.content);
            if corrupt {
                warn!(
                    "event=note_load module=editor status=error note_id={note_id} reason=json_in_rich_content action=clear"
                );
                open.note.content.clear();
            }
            open.state = EditorState::RichEditing;
            self.surface.enable();
            self.surface.render(&open.note.content);
            corrupt
        };

        info!(
            "event=note_load module=editor status=ok note_id={note_id} mode={} rewritten={content_rewritten}",
            open.note.mode
        );
        let state = open.state;
        self.open = Some(open);
        LoadOutcome {
            state,
            content_rewritten,
        }
    }

    /// Closes the open note and returns its working copy.
    pub fn close(&mut self) -> Option<Note> {
        let closed = self.open.take().map(|open| open.note);
        if let Some(note) = &closed {
            info!("event=note_close module=editor status=ok note_id={}", note.id);
        }
        closed
    }

    pub fn note(&self) -> Option<&Note> {
        self.open.as_ref().map(|open| &open.note)
    }

    pub fn state(&self) -> Option<EditorState> {
        self.open.as_ref().map(|open| open.state)
    }

    /// Live ledger table while in `LedgerEditing`.
    pub fn ledger(&self) -> Option<&LedgerData> {
        self.open.as_ref().and_then(|open| open.ledger.as_ref())
    }

    /// Live totals of the ledger; empty outside ledger mode.
    pub fn totals(&self) -> Vec<ColumnTotal> {
        self.ledger().map(LedgerData::totals).unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.ledger().map_or(0, |ledger| ledger.rows.len())
    }

    /// Words in the rich content; zero for ledger notes.
    pub fn word_count(&self) -> usize {
        match self.open.as_ref() {
            Some(open) if open.state == EditorState::RichEditing => word_count(&open.note.content),
            _ => 0,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> ReconcileResult<()> {
        self.open_mut()?.note.title = title.into();
        Ok(())
    }

    pub fn set_tags(&mut self, tags: Vec<String>) -> ReconcileResult<()> {
        self.open_mut()?.note.tags = tags;
        Ok(())
    }

    /// Replaces tags from comma-separated user input.
    pub fn set_tags_input(&mut self, input: &str) -> ReconcileResult<()> {
        self.set_tags(parse_tag_input(input))
    }

    /// Switches the open note to `mode`.
    ///
    /// Returns `false` when the mode is unchanged.
    pub fn set_mode(&mut self, mode: NoteMode, today: NaiveDate) -> ReconcileResult<bool> {
        let open = self.open.as_mut().ok_or(ReconcileError::NoOpenNote)?;
        let previous = open.note.mode;
        if previous == mode {
            return Ok(false);
        }
        open.note.mode = mode;

        match (previous == NoteMode::Ledger, mode == NoteMode::Ledger) {
            (false, true) => {
                let data = LedgerData::default_schema(today);
                open.note.content = data.to_content();
                open.ledger = Some(data);
                open.state = EditorState::LedgerEditing;
                self.surface.render("");
                self.surface.disable();
            }
            (true, false) => {
                open.note.content.clear();
                open.ledger = None;
                open.state = EditorState::RichEditing;
                self.surface.enable();
                self.surface.render("");
            }
            _ => {}
        }

        info!(
            "event=mode_switch module=editor status=ok note_id={} from={previous} to={mode}",
            open.note.id
        );
        Ok(true)
    }

    /// Applies HTML reported by the surface after a user edit.
    ///
    /// Returns `false` when the content did not change.
    pub fn handle_surface_change(&mut self, html: &str) -> ReconcileResult<bool> {
        let open = self.open.as_mut().ok_or(ReconcileError::NoOpenNote)?;
        if open.state != EditorState::RichEditing {
            warn!(
                "event=surface_change module=editor status=skipped note_id={} reason=ledger_mode",
                open.note.id
            );
            return Err(ReconcileError::NotRichMode);
        }
        let content = normalize_surface_html(html);
        if open.note.content == content {
            return Ok(false);
        }
        open.note.content = content.to_string();
        Ok(true)
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: &str) -> ReconcileResult<()> {
        self.with_ledger(|ledger| ledger.set_cell(row, column, value))
    }

    /// Appends a row and returns its id.
    pub fn add_row(&mut self, today: NaiveDate) -> ReconcileResult<String> {
        self.with_ledger(|ledger| Ok(ledger.add_row(today)))
    }

    pub fn remove_row(&mut self, row_id: &str) -> ReconcileResult<()> {
        self.with_ledger(|ledger| ledger.remove_row(row_id))
    }

    /// Appends a column and returns its index.
    pub fn add_column(&mut self, name: &str) -> ReconcileResult<usize> {
        self.with_ledger(|ledger| Ok(ledger.add_column(name)))
    }

    pub fn rename_column(&mut self, index: usize, name: &str) -> ReconcileResult<()> {
        self.with_ledger(|ledger| ledger.rename_column(index, name))
    }

    pub fn remove_column(&mut self, index: usize) -> ReconcileResult<()> {
        self.with_ledger(|ledger| ledger.remove_column(index))
    }

    /// Toggles aggregation of a column; returns whether it is now aggregated.
    pub fn toggle_sum_column(&mut self, index: usize) -> ReconcileResult<bool> {
        self.with_ledger(|ledger| ledger.toggle_sum_column(index))
    }

    fn open_mut(&mut self) -> ReconcileResult<&mut OpenNote> {
        self.open.as_mut().ok_or(ReconcileError::NoOpenNote)
    }

    fn with_ledger<T>(
        &mut self,
        mutate: impl FnOnce(&mut LedgerData) -> Result<T, LedgerError>,
    ) -> ReconcileResult<T> {
        let open = self.open_mut()?;
        let ledger = open.ledger.as_mut().ok_or(ReconcileError::NotLedgerMode)?;
        let value = mutate(ledger)?;
        open.note.content = ledger.to_content();
        Ok(value)
    }
}

fn looks_like_json_object(content: &str) -> bool {
    content.trim_start().starts_with('{')
        && serde_json::from_str::<serde_json::Value>(content)
            .map(|value| value.is_object())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::looks_like_json_object;

    #[test]
    fn json_detection_requires_a_parsable_object() {
        assert!(looks_like_json_object(r#" {"headers":[],"rows":[]}"#));
        assert!(!looks_like_json_object("{ not json"));
        assert!(!looks_like_json_object("[1,2]"));
        assert!(!looks_like_json_object("<p>{}</p>"));
    }
}
