//! Dynamic ledger table model.
//!
//! # Responsibility
//! - Own headers, rows and the ordered set of aggregated columns.
//! - Provide row/column CRUD that keeps the table rectangular.
//! - Compute per-column totals shared by the editor and every export.
//!
//! # Invariants
//! - Every `row.data.len()` equals `headers.len()` after each mutation.
//! - Every entry in `sum_column_indices` is a valid header index and appears
//!   at most once; order is the order in which columns were flagged.
//! - Row ids are stable and independent of row position.

use crate::clock::format_date;
use crate::ledger::numeric::coerce_number;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Header names of a freshly created ledger.
pub const DEFAULT_HEADERS: [&str; 5] = ["Date", "Name", "Transport", "Work Result", "Notes"];
/// Aggregated columns of a freshly created ledger.
pub const DEFAULT_SUM_COLUMNS: [usize; 2] = [2, 3];

const DATE_HEADER_NAMES: &[&str] = &["date", "day", "tgl", "tanggal"];

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger mutation error.
///
/// Out-of-range indices indicate a caller bug; they are reported instead of
/// being silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    RowOutOfRange { index: usize, len: usize },
    ColumnOutOfRange { index: usize, len: usize },
    RowNotFound(String),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowOutOfRange { index, len } => {
                write!(f, "ledger row index {index} out of range (rows={len})")
            }
            Self::ColumnOutOfRange { index, len } => {
                write!(f, "ledger column index {index} out of range (columns={len})")
            }
            Self::RowNotFound(id) => write!(f, "ledger row not found: {id}"),
        }
    }
}

impl Error for LedgerError {}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub id: String,
    pub data: Vec<String>,
}

impl LedgerRow {
    /// Creates a row with a fresh stable id.
    pub fn new(data: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data,
        }
    }
}

/// Total of one aggregated column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnTotal {
    pub index: usize,
    pub total: f64,
}

/// Serialized ledger-mode note content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerData {
    pub headers: Vec<String>,
    pub rows: Vec<LedgerRow>,
    #[serde(default)]
    pub sum_column_indices: Vec<usize>,
}

impl LedgerData {
    /// Default schema with one row dated `today`.
    pub fn default_schema(today: NaiveDate) -> Self {
        let headers: Vec<String> = DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect();
        let mut data = vec![String::new(); headers.len()];
        data[0] = format_date(today);
        Self {
            headers,
            rows: vec![LedgerRow::new(data)],
            sum_column_indices: DEFAULT_SUM_COLUMNS.to_vec(),
        }
    }

    /// Serializes to the note content encoding.
    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("null"))
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Returns whether `index` is flagged for aggregation.
    pub fn is_sum_column(&self, index: usize) -> bool {
        self.sum_column_indices.contains(&index)
    }

    /// Returns whether column 0 follows the date convention.
    pub fn has_date_column(&self) -> bool {
        self.headers
            .first()
            .map(|name| is_date_header(name))
            .unwrap_or(false)
    }

    /// Replaces one cell.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> LedgerResult<()> {
        let column_count = self.headers.len();
        let row_count = self.rows.len();
        let target = self.rows.get_mut(row).ok_or(LedgerError::RowOutOfRange {
            index: row,
            len: row_count,
        })?;
        let cell = target
            .data
            .get_mut(column)
            .ok_or(LedgerError::ColumnOutOfRange {
                index: column,
                len: column_count,
            })?;
        *cell = value.into();
        Ok(())
    }

    /// Appends an empty row and returns its id.
    ///
    /// When column 0 is a date column it is pre-filled with `today`.
    pub fn add_row(&mut self, today: NaiveDate) -> String {
        let mut data = vec![String::new(); self.headers.len()];
        if self.has_date_column() {
            data[0] = format_date(today);
        }
        let row = LedgerRow::new(data);
        let id = row.id.clone();
        self.rows.push(row);
        id
    }

    /// Removes the row with `id`.
    pub fn remove_row(&mut self, id: &str) -> LedgerResult<()> {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        if self.rows.len() == before {
            return Err(LedgerError::RowNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Appends a column and extends every row with one empty cell.
    pub fn add_column(&mut self, name: impl Into<String>) -> usize {
        self.headers.push(name.into());
        for row in &mut self.rows {
            row.data.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Renames one header.
    pub fn rename_column(&mut self, index: usize, name: impl Into<String>) -> LedgerResult<()> {
        let len = self.headers.len();
        let header = self
            .headers
            .get_mut(index)
            .ok_or(LedgerError::ColumnOutOfRange { index, len })?;
        *header = name.into();
        Ok(())
    }

    /// Removes a column and re-indexes the aggregated columns.
    ///
    /// The removed index is dropped from `sum_column_indices` and every index
    /// to its right shifts left by one.
    pub fn remove_column(&mut self, index: usize) -> LedgerResult<()> {
        let len = self.headers.len();
        if index >= len {
            return Err(LedgerError::ColumnOutOfRange { index, len });
        }
        self.headers.remove(index);
        for row in &mut self.rows {
            if index < row.data.len() {
                row.data.remove(index);
            }
        }
        self.sum_column_indices = self
            .sum_column_indices
            .iter()
            .filter(|&&flagged| flagged != index)
            .map(|&flagged| if flagged > index { flagged - 1 } else { flagged })
            .collect();
        Ok(())
    }

    /// Flips aggregation membership of one column.
    ///
    /// Returns `true` when the column is aggregated afterwards.
    pub fn toggle_sum_column(&mut self, index: usize) -> LedgerResult<bool> {
        let len = self.headers.len();
        if index >= len {
            return Err(LedgerError::ColumnOutOfRange { index, len });
        }
        if let Some(position) = self.sum_column_indices.iter().position(|&i| i == index) {
            self.sum_column_indices.remove(position);
            Ok(false)
        } else {
            self.sum_column_indices.push(index);
            Ok(true)
        }
    }

    /// Sums each aggregated column, in flag order.
    pub fn totals(&self) -> Vec<ColumnTotal> {
        self.sum_column_indices
            .iter()
            .map(|&index| ColumnTotal {
                index,
                total: self
                    .rows
                    .iter()
                    .map(|row| row.data.get(index).map_or(0.0, |cell| coerce_number(cell)))
                    .sum(),
            })
            .collect()
    }

    /// Returns whether the table satisfies the shape invariants.
    pub fn is_well_formed(&self) -> bool {
        let width = self.headers.len();
        let rows_ok = self.rows.iter().all(|row| row.data.len() == width);
        let sums_ok = self
            .sum_column_indices
            .iter()
            .enumerate()
            .all(|(position, &index)| {
                index < width && !self.sum_column_indices[..position].contains(&index)
            });
        rows_ok && sums_ok
    }
}

/// Returns whether a header name follows the date-column convention.
pub fn is_date_header(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    DATE_HEADER_NAMES.contains(&normalized.as_str()) || normalized.contains("date")
}
