//! Read-time upgrade of stored ledger payloads.
//!
//! # Responsibility
//! - Detect the shape of a stored ledger payload (current, single-sum-column,
//!   legacy item list, missing, corrupt).
//! - Produce a well-formed `LedgerData` plus a flag telling the caller whether
//!   the note content must be rewritten.
//!
//! # Invariants
//! - Migration never fails; unusable payloads fall back to the default schema.
//! - Migration is idempotent: feeding back the serialized result yields the
//!   same table with `rewrite == false`.
//! - Legacy shapes are never written back.
//! - Decoded row ids are unique: a missing or repeated id is replaced by a
//!   fresh UUID.

use crate::ledger::numeric::{format_cell_number, parse_number};
use crate::ledger::table::{LedgerData, LedgerRow};
use chrono::NaiveDate;
use log::{info, warn};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// Header names assigned to migrated legacy item lists.
pub const LEGACY_HEADERS: [&str; 2] = ["Description", "Value"];

const LEGACY_SUM_COLUMN: usize = 1;
const SINGLE_SUM_KEY: &str = "sumColumnIndex";
const SUM_KEY: &str = "sumColumnIndices";

/// Detected shape of a stored ledger payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSource {
    /// Empty content or JSON `null`.
    Missing,
    /// Content is not valid JSON.
    Unparsable,
    /// Valid JSON that matches no known ledger shape.
    UnknownShape,
    /// Current shape, already well formed.
    Current,
    /// Current shape that needed cell/index repair.
    CurrentRepaired,
    /// Current shape carrying the singular `sumColumnIndex` key.
    SingleSumColumn,
    /// Legacy list of `{description|label, quantity, price, operation}` items.
    LegacyItems,
}

impl LedgerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Unparsable => "unparsable",
            Self::UnknownShape => "unknown_shape",
            Self::Current => "current",
            Self::CurrentRepaired => "current_repaired",
            Self::SingleSumColumn => "single_sum_column",
            Self::LegacyItems => "legacy_items",
        }
    }

    /// Returns whether a table decoded from this source must be persisted.
    pub fn requires_rewrite(self) -> bool {
        self != Self::Current
    }
}

/// Result of migrating one stored payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerMigration {
    pub data: LedgerData,
    pub rewrite: bool,
    pub source: LedgerSource,
}

/// Decodes a stored payload without falling back.
///
/// Returns the decoded table and its source shape, or the reason no table
/// could be produced (`Missing`, `Unparsable` or `UnknownShape`).
pub fn decode_ledger(content: &str) -> Result<(LedgerData, LedgerSource), LedgerSource> {
    if content.trim().is_empty() {
        return Err(LedgerSource::Missing);
    }
    let value: Value = serde_json::from_str(content).map_err(|_| LedgerSource::Unparsable)?;
    match value {
        Value::Null => Err(LedgerSource::Missing),
        Value::Array(items) => Ok((legacy_items_to_ledger(&items), LedgerSource::LegacyItems)),
        Value::Object(map) if map.contains_key("headers") && map.contains_key("rows") => {
            decode_current(&map).ok_or(LedgerSource::UnknownShape)
        }
        _ => Err(LedgerSource::UnknownShape),
    }
}

/// Migrates a stored payload into the current schema.
///
/// `today` seeds the date cell of the default schema.
pub fn migrate_ledger(content: &str, today: NaiveDate) -> LedgerMigration {
    let migration = match decode_ledger(content) {
        Ok((data, source)) => LedgerMigration {
            data,
            rewrite: source.requires_rewrite(),
            source,
        },
        Err(source) => {
            if source != LedgerSource::Missing {
                warn!(
                    "event=ledger_migrate module=ledger status=error source={} action=reset_default",
                    source.as_str()
                );
            }
            LedgerMigration {
                data: LedgerData::default_schema(today),
                rewrite: true,
                source,
            }
        }
    };

    info!(
        "event=ledger_migrate module=ledger status=ok source={} rewrite={} columns={} rows={}",
        migration.source.as_str(),
        migration.rewrite,
        migration.data.headers.len(),
        migration.data.rows.len()
    );
    migration
}

/// Converts a legacy item list into a two-column ledger.
///
/// Each item contributes `sign * quantity * price`, where `quantity` defaults
/// to 1 and `price` to 0 when non-numeric, and `sign` is negative only for
/// the `-` operation.
pub fn legacy_items_to_ledger(items: &[Value]) -> LedgerData {
    let mut seen = HashSet::new();
    let rows = items
        .iter()
        .map(|item| {
            let empty = Map::new();
            let fields = item.as_object().unwrap_or(&empty);
            let description = ["description", "label"]
                .iter()
                .filter_map(|key| fields.get(*key).and_then(Value::as_str))
                .find(|text| !text.is_empty())
                .unwrap_or_default();
            let quantity = fields.get("quantity").and_then(legacy_number).unwrap_or(1.0);
            let price = fields.get("price").and_then(legacy_number).unwrap_or(0.0);
            let sign = match fields.get("operation").and_then(Value::as_str) {
                Some("-") => -1.0,
                _ => 1.0,
            };
            let (id, _) = unique_row_id(fields.get("id"), &mut seen);
            LedgerRow {
                id,
                data: vec![
                    description.to_string(),
                    format_cell_number(sign * quantity * price),
                ],
            }
        })
        .collect();

    LedgerData {
        headers: LEGACY_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows,
        sum_column_indices: vec![LEGACY_SUM_COLUMN],
    }
}

fn decode_current(map: &Map<String, Value>) -> Option<(LedgerData, LedgerSource)> {
    let raw_headers = map.get("headers")?.as_array()?;
    let raw_rows = map.get("rows")?.as_array()?;
    let mut repaired = false;

    let headers: Vec<String> = raw_headers
        .iter()
        .map(|header| match header {
            Value::String(text) => text.clone(),
            other => {
                repaired = true;
                scalar_text(other).unwrap_or_default()
            }
        })
        .collect();
    let width = headers.len();

    let mut seen = HashSet::new();
    let rows = raw_rows
        .iter()
        .map(|raw_row| {
            let (id, generated) = unique_row_id(raw_row.get("id"), &mut seen);
            repaired |= generated;
            let mut data: Vec<String> = match raw_row.get("data").and_then(Value::as_array) {
                Some(cells) => cells
                    .iter()
                    .map(|cell| match cell {
                        Value::String(text) => text.clone(),
                        other => {
                            repaired = true;
                            scalar_text(other).unwrap_or_default()
                        }
                    })
                    .collect(),
                None => {
                    repaired = true;
                    Vec::new()
                }
            };
            if data.len() != width {
                repaired = true;
                data.resize(width, String::new());
            }
            LedgerRow { id, data }
        })
        .collect();

    let (sum_column_indices, source) = if map.contains_key(SINGLE_SUM_KEY) {
        let single = map
            .get(SINGLE_SUM_KEY)
            .and_then(Value::as_u64)
            .map(|index| index as usize);
        (single.into_iter().collect(), LedgerSource::SingleSumColumn)
    } else {
        let raw = map.get(SUM_KEY).and_then(Value::as_array);
        if map.contains_key(SUM_KEY) && raw.is_none() {
            repaired = true;
        }
        let mut indices = Vec::new();
        for value in raw.into_iter().flatten() {
            match value.as_u64().map(|index| index as usize) {
                Some(index) if !indices.contains(&index) => indices.push(index),
                _ => repaired = true,
            }
        }
        let source = if repaired {
            LedgerSource::CurrentRepaired
        } else {
            LedgerSource::Current
        };
        (indices, source)
    };

    let mut data = LedgerData {
        headers,
        rows,
        sum_column_indices,
    };
    let before = data.sum_column_indices.len();
    data.sum_column_indices.retain(|&index| index < width);
    let source = if data.sum_column_indices.len() != before && source == LedgerSource::Current {
        LedgerSource::CurrentRepaired
    } else {
        source
    };

    Some((data, source))
}

/// Returns the stored id when it is non-empty and not yet in `seen`, or a
/// fresh UUID plus `true` otherwise.
fn unique_row_id(raw: Option<&Value>, seen: &mut HashSet<String>) -> (String, bool) {
    match raw.and_then(scalar_text).filter(|id| !id.is_empty()) {
        Some(id) if seen.insert(id.clone()) => (id, false),
        _ => {
            let id = Uuid::new_v4().to_string();
            seen.insert(id.clone());
            (id, true)
        }
    }
}

fn legacy_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_number(text),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
