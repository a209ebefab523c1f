//! Use-case services over the storage collaborator.
//!
//! # Responsibility
//! - Note creation/listing/deletion and dashboard activity (`note_service`).
//! - JSON backup and atomic restore (`backup`).

pub mod backup;
pub mod note_service;
