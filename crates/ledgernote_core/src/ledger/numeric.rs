//! Numeric coercion for ledger aggregation and total display.
//!
//! # Invariants
//! - Aggregation parsing is locale-agnostic: `.` is the only decimal mark and
//!   no grouping separators are recognized.
//! - Empty or unparsable input coerces to `0`.

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number regex")
});

/// Parses the leading decimal number of `value`.
///
/// Leading whitespace is skipped and trailing garbage is ignored, so `"12kg"`
/// parses as `12`. Returns `None` when no number prefix exists or the
/// result is not finite.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let matched = LEADING_NUMBER_RE.find(trimmed)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Coerces free-form cell text into a number for aggregation.
pub fn coerce_number(value: &str) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// Renders a number the way it is stored back into a ledger cell.
///
/// Integral values carry no fraction (`6`, `-1`). Negative zero and
/// non-finite values are stored as `0`.
pub fn format_cell_number(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    format!("{value}")
}

/// Renders a total with two fixed decimals and `,` thousands grouping.
///
/// `8` renders as `8.00`, `-1234.5` as `-1,234.50`. Values that round to zero
/// render unsigned. A sum that overflowed to infinity (or NaN) renders as
/// `0.00`.
pub fn format_total(value: f64) -> String {
    if !value.is_finite() {
        return format_total(0.0);
    }
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (position, digit) in integer.chars().enumerate() {
        if position > 0 && (integer.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = integer.chars().all(|c| c == '0') && fraction.chars().all(|c| c == '0');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
