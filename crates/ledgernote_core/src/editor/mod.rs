//! Editor-side state of the open note.
//!
//! # Responsibility
//! - `surface`: capability interface of the rich-text widget.
//! - `reconciler`: working copy, mode transitions and ledger edits.
//! - `session`: reconciler plus debounced autosave.

pub mod reconciler;
pub mod session;
pub mod surface;
