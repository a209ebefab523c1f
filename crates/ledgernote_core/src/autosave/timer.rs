//! Cancellable, keyed debounce timer.
//!
//! # Invariants
//! - At most one deadline is armed at a time; arming replaces it.
//! - A deadline only fires for the key it was armed with.

/// Single-slot deadline keyed by owner identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceTimer<K> {
    armed: Option<(K, i64)>,
}

impl<K> Default for DebounceTimer<K> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<K: PartialEq> DebounceTimer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) the timer for `key` at `deadline_ms`.
    pub fn arm(&mut self, key: K, deadline_ms: i64) {
        self.armed = Some((key, deadline_ms));
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<i64> {
        self.armed.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Disarms and returns `true` when armed for `key` and `now_ms` reached
    /// the deadline.
    ///
    /// A timer armed for a different key is discarded without firing.
    pub fn fire(&mut self, key: &K, now_ms: i64) -> bool {
        match &self.armed {
            Some((armed_key, _)) if armed_key != key => {
                self.armed = None;
                false
            }
            Some((_, deadline)) if now_ms >= *deadline => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}
