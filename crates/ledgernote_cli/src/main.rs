//! LedgerNote command-line front end.
//!
//! # Responsibility
//! - Parse arguments, initialize logging and dispatch to core use-cases.
//! - Report failures with context at the process boundary.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use ledgernote_core::{core_version, default_log_level, init_logging};
use log::info;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = if log_dir.is_absolute() {
            log_dir.clone()
        } else {
            std::env::current_dir()?.join(log_dir)
        };
        if let Err(err) = init_logging(level, &log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }
    info!(
        "event=cli_start module=cli status=ok version={} command={}",
        core_version(),
        args.command.name()
    );

    let db = args.db.as_path();
    match args.command {
        cli::Command::Ping => commands::ping_core(),
        cli::Command::New { title, mode } => commands::new_note(db, title, mode),
        cli::Command::List => commands::list(db),
        cli::Command::Activity { days } => commands::activity(db, days),
        cli::Command::Delete { id } => commands::delete(db, id),
        cli::Command::Export { id, format, out_dir } => commands::export(db, id, format, out_dir),
        cli::Command::Backup { out } => commands::backup(db, out),
        cli::Command::Restore { file } => commands::restore(db, &file),
    }
}
