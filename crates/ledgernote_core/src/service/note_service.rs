//! Note use-case service.
//!
//! # Responsibility
//! - Create notes with mode-independent defaults.
//! - Expose list/get/delete passthroughs.
//! - Derive the recent-activity series shown on the dashboard.
//!
//! # Invariants
//! - New notes start with empty content; ledger notes receive their schema on
//!   first load through ledger migration.
//! - `created_at == updated_at` for a freshly created note.

use crate::clock::{local_date, Clock};
use crate::model::note::{NewNote, Note, NoteId, NoteMode};
use crate::repo::note_repo::{NoteRepository, RepoError, RepoResult};
use chrono::{Days, NaiveDate};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    NoteNotFound(NoteId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Number of notes updated on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub count: usize,
}

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: NoteRepository, C: Clock> NoteService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates an empty note and returns it as stored.
    pub fn create_note(
        &self,
        title: impl Into<String>,
        mode: NoteMode,
    ) -> Result<Note, NoteServiceError> {
        let draft = NewNote::empty(title, mode, self.clock.now_ms());
        let id = self.repo.add_note(&draft)?;
        info!("event=note_create module=service status=ok note_id={id} mode={mode}");
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Lists notes, most recently updated first.
    pub fn list_notes(&self) -> Result<Vec<Note>, NoteServiceError> {
        Ok(self.repo.list_notes()?)
    }

    pub fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get_note(id)
    }

    pub fn delete_note(&self, id: NoteId) -> Result<(), NoteServiceError> {
        self.repo.delete_note(id)?;
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    /// Per-day update counts for the last `days` days ending today.
    pub fn recent_activity(&self, days: u32) -> Result<Vec<DayActivity>, NoteServiceError> {
        let notes = self.repo.list_notes()?;
        Ok(activity_by_day(&notes, self.clock.today(), days))
    }
}

/// Counts notes by the local date of `updated_at`, oldest day first.
///
/// The window covers `days` calendar days ending with `today`; notes outside
/// it are ignored.
pub fn activity_by_day(notes: &[Note], today: NaiveDate, days: u32) -> Vec<DayActivity> {
    let mut series: Vec<DayActivity> = (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| DayActivity { date, count: 0 })
        .collect();

    for note in notes {
        let date = local_date(note.updated_at);
        if let Some(day) = series.iter_mut().find(|day| day.date == date) {
            day.count += 1;
        }
    }
    series
}
