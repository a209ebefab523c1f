//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/get/add/update/delete over mode-agnostic `Note` values.
//! - Provide an atomic whole-store replacement for backup restore.
//!
//! # Invariants
//! - `list_notes` is ordered by `updated_at DESC, id DESC`.
//! - `update_note` and `delete_note` report missing ids as `NotFound`.
//! - Tags are stored as a JSON array and keep their order.

use crate::db::DbError;
use crate::model::note::{NewNote, Note, NoteId, NoteMode};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    tags,
    mode,
    created_at,
    updated_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator for notes.
pub trait NoteRepository {
    /// Lists all notes, most recently updated first.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Inserts a note and returns its storage-assigned id.
    fn add_note(&self, note: &NewNote) -> RepoResult<NoteId>;
    /// Replaces every stored field of an existing note.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Hard-deletes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
}

impl<R: NoteRepository + ?Sized> NoteRepository for &R {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        (**self).list_notes()
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get_note(id)
    }

    fn add_note(&self, note: &NewNote) -> RepoResult<NoteId> {
        (**self).add_note(note)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        (**self).update_note(note)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        (**self).delete_note(id)
    }
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'notes'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable("notes"));
        }
        Ok(Self { conn })
    }

    /// Deletes every stored note and inserts `notes` in one transaction.
    ///
    /// Either all notes are replaced or storage is left untouched.
    pub fn replace_all(&mut self, notes: &[NewNote]) -> RepoResult<Vec<NoteId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM notes;", [])?;
        let mut ids = Vec::with_capacity(notes.len());
        for note in notes {
            ids.push(insert_note(&tx, note)?);
        }
        tx.commit()?;
        Ok(ids)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY updated_at DESC, id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn add_note(&self, note: &NewNote) -> RepoResult<NoteId> {
        insert_note(self.conn, note)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                tags = ?4,
                mode = ?5,
                created_at = ?6,
                updated_at = ?7
             WHERE id = ?1;",
            params![
                note.id,
                note.title.as_str(),
                note.content.as_str(),
                encode_tags(&note.tags)?,
                note.mode.as_str(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn insert_note(conn: &Connection, note: &NewNote) -> RepoResult<NoteId> {
    conn.execute(
        "INSERT INTO notes (title, content, tags, mode, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            note.title.as_str(),
            note.content.as_str(),
            encode_tags(&note.tags)?,
            note.mode.as_str(),
            note.created_at,
            note.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: NoteId = row.get("id")?;

    let tags_text: String = row.get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid tags value in notes.tags for id {id}"))
    })?;

    let mode_text: String = row.get("mode")?;
    let mode: NoteMode = mode_text
        .parse()
        .map_err(|err| RepoError::InvalidData(format!("{err} in notes.mode for id {id}")))?;

    Ok(Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        tags,
        mode,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn encode_tags(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode tags: {err}")))
}
