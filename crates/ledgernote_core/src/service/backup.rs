//! JSON backup interchange.
//!
//! # Responsibility
//! - Serialize every stored note as a JSON array.
//! - Restore a backup atomically, letting storage assign fresh ids.
//!
//! # Invariants
//! - Restore either replaces the whole store or changes nothing.
//! - Any `id` field in the backup is ignored.

use crate::model::note::NewNote;
use crate::repo::note_repo::{NoteRepository, RepoError, SqliteNoteRepository};
use chrono::NaiveDate;
use log::{error, info};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backup/restore failure.
#[derive(Debug)]
pub enum BackupError {
    Json(serde_json::Error),
    NotAnArray,
    InvalidEntry { index: usize, details: String },
    Repo(RepoError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid backup file: {err}"),
            Self::NotAnArray => write!(f, "invalid backup file format: not an array"),
            Self::InvalidEntry { index, details } => {
                write!(f, "invalid note at backup index {index}: {details}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BackupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Serializes all stored notes as a pretty-printed JSON array.
pub fn backup_json(repo: &impl NoteRepository) -> Result<String, BackupError> {
    let notes = repo.list_notes()?;
    let text = serde_json::to_string_pretty(&notes)?;
    info!("event=backup module=backup status=ok notes={}", notes.len());
    Ok(text)
}

/// File name for a backup taken on `today`.
pub fn backup_file_name(today: NaiveDate) -> String {
    format!("notes_backup_{}.json", today.format("%Y-%m-%d"))
}

/// Parses backup text into id-less notes.
///
/// Fails on malformed JSON, a non-array payload, or any entry that is not a
/// valid note.
pub fn parse_backup(text: &str) -> Result<Vec<NewNote>, BackupError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(entries) = value else {
        return Err(BackupError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, mut entry)| {
            if let Some(fields) = entry.as_object_mut() {
                fields.remove("id");
            }
            serde_json::from_value::<NewNote>(entry).map_err(|err| BackupError::InvalidEntry {
                index,
                details: err.to_string(),
            })
        })
        .collect()
}

/// Replaces the whole store with the notes in `text`.
///
/// Returns the number of restored notes.
pub fn restore_json(repo: &mut SqliteNoteRepository<'_>, text: &str) -> Result<usize, BackupError> {
    let notes = match parse_backup(text) {
        Ok(notes) => notes,
        Err(err) => {
            error!("event=restore module=backup status=error stage=parse error={err}");
            return Err(err);
        }
    };
    if let Err(err) = repo.replace_all(&notes) {
        error!("event=restore module=backup status=error stage=write error={err}");
        return Err(err.into());
    }
    info!("event=restore module=backup status=ok notes={}", notes.len());
    Ok(notes.len())
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, parse_backup, BackupError};
    use chrono::NaiveDate;

    #[test]
    fn parse_strips_ids_and_defaults_optional_fields() {
        let text = r#"[{"id":9,"title":"A","mode":"Ledger","createdAt":1,"updatedAt":2},
                       {"title":"B","content":"<p>x</p>","tags":["t"],"mode":"Note","createdAt":3,"updatedAt":4}]"#;
        let notes = parse_backup(text).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].content, "");
        assert_eq!(notes[1].tags, vec!["t"]);
    }

    #[test]
    fn parse_rejects_non_array_and_bad_entries() {
        assert!(matches!(
            parse_backup(r#"{"title":"A"}"#),
            Err(BackupError::NotAnArray)
        ));
        assert!(matches!(parse_backup("not json"), Err(BackupError::Json(_))));
        assert!(matches!(
            parse_backup(r#"[{"title":"A","mode":"Poem","createdAt":1,"updatedAt":1}]"#),
            Err(BackupError::InvalidEntry { index: 0, .. })
        ));
    }

    #[test]
    fn file_name_carries_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(backup_file_name(date), "notes_backup_2024-12-31.json");
    }
}
