//! Debounced autosave.
//!
//! # Responsibility
//! - Track the last persisted copy of the open note (the baseline).
//! - Hold the latest working snapshot until the edit stream is quiet for the
//!   debounce window, then persist it once if it differs from the baseline.
//!
//! # Invariants
//! - Every observed edit re-arms the timer; nothing fires while edits keep
//!   arriving inside the window.
//! - The baseline and timer are keyed by note id. Loading another note
//!   discards the pending snapshot and any armed deadline.
//! - A failed write keeps the old baseline, so the next differing snapshot
//!   is written again. A failed snapshot is not retried on its own.
//! - `updated_at` of a written note never decreases.

use crate::autosave::timer::DebounceTimer;
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use log::{debug, error, info, warn};

/// Reference quiescence window.
pub const DEFAULT_DEBOUNCE_MS: i64 = 1_000;

/// Autosave tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveConfig {
    pub debounce_ms: i64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Result of one scheduler poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing pending.
    Idle,
    /// A snapshot is pending until `deadline_ms`.
    Waiting { deadline_ms: i64 },
    /// The window elapsed but the snapshot matched the baseline.
    Unchanged,
    /// The snapshot was written.
    Saved { note_id: NoteId, updated_at: i64 },
    /// The write failed; the baseline is unchanged.
    Failed { note_id: NoteId },
}

/// Debounced persistence of the open note.
pub struct AutoSaveScheduler<R: NoteRepository> {
    repo: R,
    config: AutoSaveConfig,
    baseline: Option<Note>,
    pending: Option<Note>,
    timer: DebounceTimer<NoteId>,
}

impl<R: NoteRepository> AutoSaveScheduler<R> {
    pub fn new(repo: R, config: AutoSaveConfig) -> Self {
        Self {
            repo,
            config,
            baseline: None,
            pending: None,
            timer: DebounceTimer::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Last known persisted copy of the open note.
    pub fn baseline(&self) -> Option<&Note> {
        self.baseline.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resets the baseline to a freshly loaded note.
    ///
    /// Any pending snapshot of a previously open note is discarded.
    pub fn load(&mut self, note: &Note) {
        if let Some(stale) = self.pending.take() {
            if stale.id != note.id {
                debug!(
                    "event=autosave module=autosave status=skipped note_id={} reason=note_switched",
                    stale.id
                );
            }
        }
        self.timer.cancel();
        self.baseline = Some(note.clone());
    }

    /// Stops tracking the open note and discards any pending snapshot.
    pub fn close(&mut self) {
        self.timer.cancel();
        self.pending = None;
        self.baseline = None;
    }

    /// Records the latest working snapshot and re-arms the timer.
    ///
    /// Returns `false` when the snapshot does not belong to the loaded note.
    pub fn observe(&mut self, snapshot: &Note, now_ms: i64) -> bool {
        let Some(baseline) = self.baseline.as_ref() else {
            return false;
        };
        if baseline.id != snapshot.id {
            warn!(
                "event=autosave module=autosave status=skipped note_id={} loaded_id={} reason=foreign_snapshot",
                snapshot.id, baseline.id
            );
            return false;
        }
        self.pending = Some(snapshot.clone());
        self.timer.arm(snapshot.id, now_ms + self.config.debounce_ms);
        true
    }

    /// Writes the pending snapshot once the debounce window has elapsed.
    pub fn poll(&mut self, now_ms: i64) -> SaveOutcome {
        let Some(note_id) = self.pending.as_ref().map(|note| note.id) else {
            return SaveOutcome::Idle;
        };
        if !self.timer.fire(&note_id, now_ms) {
            return match self.timer.deadline() {
                Some(deadline_ms) => SaveOutcome::Waiting { deadline_ms },
                None => {
                    self.pending = None;
                    SaveOutcome::Idle
                }
            };
        }
        self.write_pending(now_ms)
    }

    /// Writes the pending snapshot immediately, ignoring the window.
    pub fn flush(&mut self, now_ms: i64) -> SaveOutcome {
        if self.pending.is_none() {
            return SaveOutcome::Idle;
        }
        self.timer.cancel();
        self.write_pending(now_ms)
    }

    fn write_pending(&mut self, now_ms: i64) -> SaveOutcome {
        let (Some(mut snapshot), Some(baseline)) = (self.pending.take(), self.baseline.as_ref())
        else {
            return SaveOutcome::Idle;
        };
        if !snapshot.differs_for_save(baseline) {
            return SaveOutcome::Unchanged;
        }

        snapshot.updated_at = now_ms.max(baseline.updated_at);
        let note_id = snapshot.id;
        match self.repo.update_note(&snapshot) {
            Ok(()) => {
                info!(
                    "event=autosave module=autosave status=ok note_id={note_id} mode={}",
                    snapshot.mode
                );
                let updated_at = snapshot.updated_at;
                self.baseline = Some(snapshot);
                SaveOutcome::Saved {
                    note_id,
                    updated_at,
                }
            }
            Err(err) => {
                error!("event=autosave module=autosave status=error note_id={note_id} error={err}");
                SaveOutcome::Failed { note_id }
            }
        }
    }
}
