use anyhow::{anyhow, Context, Result};
use ledgernote_core::clock::{format_date, local_date};
use ledgernote_core::{
    backup_file_name, backup_json, core_version, export_all, export_note, open_db, ping,
    restore_json, Clock, ExportFile, ExportFormat, NoteMode, NoteRepository, NoteService,
    SqliteNoteRepository, SystemClock,
};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub fn ping_core() -> Result<()> {
    println!("ledgernote_core ping={}", ping());
    println!("ledgernote_core version={}", core_version());
    Ok(())
}

pub fn new_note(db: &Path, title: String, mode: NoteMode) -> Result<()> {
    let mut conn = connect(db)?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn)?, SystemClock);
    let note = service.create_note(title, mode)?;
    println!("created {} [{}] {}", note.id, note.mode, note.title);
    Ok(())
}

pub fn list(db: &Path) -> Result<()> {
    let mut conn = connect(db)?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn)?, SystemClock);
    let notes = service.list_notes()?;
    if notes.is_empty() {
        println!("(no notes)");
    }
    for note in notes {
        let updated = format_date(local_date(note.updated_at));
        let tags = if note.tags.is_empty() {
            String::new()
        } else {
            format!(" #{}", note.tags.join(" #"))
        };
        println!(
            "{:>5}  {:<7} {}  {}{}",
            note.id, note.mode, updated, note.title, tags
        );
    }
    Ok(())
}

pub fn activity(db: &Path, days: u32) -> Result<()> {
    let mut conn = connect(db)?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn)?, SystemClock);
    for day in service.recent_activity(days)? {
        println!("{}  {}", format_date(day.date), day.count);
    }
    Ok(())
}

pub fn delete(db: &Path, id: i64) -> Result<()> {
    let mut conn = connect(db)?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn)?, SystemClock);
    service.delete_note(id)?;
    println!("deleted {id}");
    Ok(())
}

pub fn export(db: &Path, id: i64, format: Option<ExportFormat>, out_dir: PathBuf) -> Result<()> {
    let mut conn = connect(db)?;
    let repo = SqliteNoteRepository::try_new(&mut conn)?;
    let note = repo
        .get_note(id)?
        .ok_or_else(|| anyhow!("note {id} not found"))?;
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let results = match format {
        Some(format) => vec![(format, export_note(&note, format))],
        None => export_all(&note),
    };

    let mut failures = 0;
    for (format, result) in results {
        match result.map_err(anyhow::Error::from).and_then(|file| write_export(&out_dir, &file)) {
            Ok(path) => println!("{format}: {}", path.display()),
            Err(err) => {
                failures += 1;
                eprintln!("{format}: export failed: {err:#}");
            }
        }
    }
    if failures > 0 {
        return Err(anyhow!("{failures} export format(s) failed"));
    }
    Ok(())
}

pub fn backup(db: &Path, out: Option<PathBuf>) -> Result<()> {
    let mut conn = connect(db)?;
    let repo = SqliteNoteRepository::try_new(&mut conn)?;
    let text = backup_json(&repo)?;
    let path = out.unwrap_or_else(|| PathBuf::from(backup_file_name(SystemClock.today())));
    fs::write(&path, text).with_context(|| format!("cannot write {}", path.display()))?;
    println!("backup written to {}", path.display());
    Ok(())
}

pub fn restore(db: &Path, file: &Path) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    let mut conn = connect(db)?;
    let mut repo = SqliteNoteRepository::try_new(&mut conn)?;
    let restored = restore_json(&mut repo, &text)
        .with_context(|| format!("restore from {} failed", file.display()))?;
    println!("restored {restored} notes");
    Ok(())
}

fn connect(db: &Path) -> Result<Connection> {
    open_db(db).with_context(|| format!("cannot open database {}", db.display()))
}

fn write_export(out_dir: &Path, file: &ExportFile) -> Result<PathBuf> {
    let path = out_dir.join(&file.file_name);
    fs::write(&path, &file.contents).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}
