//! Persistence contracts and the SQLite reference implementation.
//!
//! # Responsibility
//! - Define the storage collaborator consumed by autosave, service and backup.
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - Repositories never inspect or rewrite note content.

pub mod note_repo;
