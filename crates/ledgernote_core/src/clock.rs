//! Time source abstraction.
//!
//! # Responsibility
//! - Provide wall-clock milliseconds and the local calendar date to editor,
//!   ledger and autosave code without hard-wiring the system clock.
//!
//! # Invariants
//! - `now_ms` is Unix epoch milliseconds.

use chrono::{DateTime, Local, NaiveDate};
use std::cell::Cell;

/// Injected time source.
pub trait Clock {
    /// Current time as Unix epoch milliseconds.
    fn now_ms(&self) -> i64;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        local_date(self.now_ms())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually advanced clock for deterministic replay and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<i64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Converts epoch milliseconds to the local calendar date.
///
/// Out-of-range timestamps map to the Unix epoch date.
pub fn local_date(epoch_ms: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|utc| utc.with_timezone(&Local).date_naive())
        .unwrap_or_default()
}
