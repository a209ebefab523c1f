//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its content modes.
//! - Provide the field-level change comparison used by autosave.
//!
//! # Invariants
//! - `tags` keeps insertion order and holds no duplicates.
//! - `updated_at` is refreshed by the autosave path only.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned note identity.
pub type NoteId = i64;

/// Title used when a note is created without one.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Content mode of a note.
///
/// Serialized with the display names used by the backup interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NoteMode {
    #[default]
    Note,
    Diary,
    Task,
    Thesis,
    Ledger,
}

impl NoteMode {
    /// Every supported mode, in menu order.
    pub const ALL: [NoteMode; 5] = [
        NoteMode::Note,
        NoteMode::Diary,
        NoteMode::Task,
        NoteMode::Thesis,
        NoteMode::Ledger,
    ];

    /// Stable name used in storage, exports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Diary => "Diary",
            Self::Task => "Task",
            Self::Thesis => "Thesis",
            Self::Ledger => "Ledger",
        }
    }

    /// Returns whether content in this mode is rich markup.
    pub fn is_rich_text(self) -> bool {
        self != Self::Ledger
    }
}

impl Display for NoteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNoteMode(pub String);

impl Display for UnknownNoteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown note mode `{}`; expected Note|Diary|Task|Thesis|Ledger",
            self.0
        )
    }
}

impl Error for UnknownNoteMode {}

impl FromStr for NoteMode {
    type Err = UnknownNoteMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        NoteMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownNoteMode(trimmed.to_string()))
    }
}

/// Canonical persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Opaque, mode-dependent encoding.
    pub content: String,
    pub tags: Vec<String>,
    pub mode: NoteMode,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Returns whether any autosave-relevant field differs from `other`.
    ///
    /// Compares `content`, `title`, `mode` and the tag sequence by value.
    /// Timestamps and identity are ignored.
    pub fn differs_for_save(&self, other: &Note) -> bool {
        self.content != other.content
            || self.title != other.title
            || self.mode != other.mode
            || self.tags != other.tags
    }
}

/// Note payload without a storage identity.
///
/// Used for inserts and for backup restore, where `id` is stripped so storage
/// can assign a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mode: NoteMode,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewNote {
    /// Creates an empty note payload stamped with `now_ms`.
    pub fn empty(title: impl Into<String>, mode: NoteMode, now_ms: i64) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_NOTE_TITLE.to_string()
        } else {
            title
        };
        Self {
            title,
            content: String::new(),
            tags: Vec::new(),
            mode,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Attaches a storage identity.
    pub fn with_id(self, id: NoteId) -> Note {
        Note {
            id,
            title: self.title,
            content: self.content,
            tags: self.tags,
            mode: self.mode,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Parses comma-separated tag input.
///
/// Entries are trimmed, empty entries dropped and duplicates removed while
/// keeping first-seen order.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let tag = raw.trim();
        if tag.is_empty() || tags.iter().any(|existing| existing == tag) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}
