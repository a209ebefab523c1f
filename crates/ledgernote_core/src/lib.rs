//! Core domain logic for LedgerNote.
//! Mode-aware notes, the ledger sub-engine, autosave and export projection.

pub mod autosave;
pub mod clock;
pub mod db;
pub mod editor;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use autosave::scheduler::{AutoSaveConfig, AutoSaveScheduler, SaveOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{open_db, open_db_in_memory, DbError};
pub use editor::reconciler::{ContentReconciler, EditorState, ReconcileError, ReconcileResult};
pub use editor::session::EditorSession;
pub use editor::surface::RichTextSurface;
pub use export::{export_all, export_note, ExportError, ExportFile, ExportFormat};
pub use ledger::migration::{migrate_ledger, LedgerMigration, LedgerSource};
pub use ledger::table::{ColumnTotal, LedgerData, LedgerError, LedgerRow};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{NewNote, Note, NoteId, NoteMode};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::backup::{backup_file_name, backup_json, restore_json, BackupError};
pub use service::note_service::{DayActivity, NoteService, NoteServiceError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
