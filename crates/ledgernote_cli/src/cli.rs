use clap::{Parser, Subcommand};
use ledgernote_core::{ExportFormat, NoteMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ledgernote", version, about = "Mode-aware notes with ledger tables")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "ledgernote.db")]
    pub db: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check core linkage
    Ping,
    /// Create an empty note
    New {
        /// Title (defaults to "Untitled Note")
        #[arg(long, default_value = "")]
        title: String,
        /// Note, Diary, Task, Thesis or Ledger
        #[arg(long, default_value = "Note")]
        mode: NoteMode,
    },
    /// List notes, most recently updated first
    List,
    /// Show per-day update counts
    Activity {
        /// Number of days ending today
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Delete a note
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Export a note to files
    Export {
        #[arg(long)]
        id: i64,
        /// md, html or docx; all formats when omitted
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write every note to a JSON backup file
    Backup {
        /// Output file (defaults to notes_backup_<date>.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all notes with the contents of a backup file
    Restore {
        #[arg(long)]
        file: PathBuf,
    },
}

impl Command {
    /// Subcommand name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::New { .. } => "new",
            Self::List => "list",
            Self::Activity { .. } => "activity",
            Self::Delete { .. } => "delete",
            Self::Export { .. } => "export",
            Self::Backup { .. } => "backup",
            Self::Restore { .. } => "restore",
        }
    }
}
