//! Cell-to-type coercion. Never fails: callers get `None` or a default.

use crate::domain::grid::{Cell, format_number};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

/// Timestamp layouts seen in report exports, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &["%Y.%m.%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

static NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d*\.\d+|\d+)").expect("numeral pattern is valid")
});

fn strip_separators(s: &str) -> String {
    s.chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

/// Direct numeric parse, then first numeral substring ("$1,234.50 USD", "0.10 / 0.10").
pub fn parse_decimal(text: &str) -> Option<f64> {
    let compact = strip_separators(text);
    if compact.is_empty() {
        return None;
    }
    if let Ok(v) = compact.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    NUMERAL
        .find(&compact)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Float-then-truncate so `"100.0"` and `100.0` both yield `100`.
pub fn to_integer(cell: &Cell) -> Option<i64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => strip_separators(s).parse::<f64>().ok()?,
        Cell::Empty | Cell::DateTime(_) => return None,
    };
    value.is_finite().then(|| value.trunc() as i64)
}

pub fn to_decimal(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_decimal(s),
        _ => None,
    }
}

pub fn to_decimal_or_zero(cell: &Cell) -> f64 {
    to_decimal(cell).unwrap_or(0.0)
}

pub fn to_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Text(s) => parse_timestamp(s),
        _ => None,
    }
}

pub fn to_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => format_number(*n),
        Cell::DateTime(dt) => dt.format("%Y.%m.%d %H:%M:%S").to_string(),
    }
}
