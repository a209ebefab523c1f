//! Tabular ledger sub-engine.
//!
//! # Responsibility
//! - Numeric coercion for aggregation and total display (`numeric`).
//! - Dynamic table model with row/column CRUD and totals (`table`).
//! - Upgrade of legacy stored payloads into the current schema (`migration`).
//!
//! # Invariants
//! - Totals are computed in one place (`LedgerData::totals`) for the editor
//!   and every export.

pub mod migration;
pub mod numeric;
pub mod table;
