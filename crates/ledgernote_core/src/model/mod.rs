//! Domain model for mode-aware notes.
//!
//! # Responsibility
//! - Define the persisted `Note` shape shared by editor, storage and export.
//! - Keep content opaque at this layer; its encoding is decided by `NoteMode`.
//!
//! # Invariants
//! - `Note::id` is assigned by storage and never reused.
//! - Ledger-mode content is a serialized `LedgerData`; every other mode
//!   stores rich markup.

pub mod note;
