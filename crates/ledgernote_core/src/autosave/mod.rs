//! Debounced persistence of editor snapshots.
//!
//! # Responsibility
//! - Keyed, cancellable debounce deadline (`timer`).
//! - Field-level change detection and the single write per quiet period
//!   (`scheduler`).

pub mod scheduler;
pub mod timer;
