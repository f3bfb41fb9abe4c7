//! Classifies a column's sampled values as numeric, date, or text.
//!
//! The rule is all-or-nothing: every sample must parse for a class to win,
//! and a single miss falls through to the next check. An empty sample is
//! classified as text, the safe default.

use chrono::{DateTime, NaiveDate};

use crate::catalog::ColumnType;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

pub fn infer_column_type(samples: &[String]) -> ColumnType {
    if samples.is_empty() {
        return ColumnType::Text;
    }

    if samples.iter().all(|value| is_numeric(value)) {
        return ColumnType::Numeric;
    }

    if samples.iter().all(|value| is_date(value)) {
        return ColumnType::Date;
    }

    ColumnType::Text
}

/// Permissive numeric check: integers, decimals, scientific notation, and
/// surrounding whitespace all pass. The empty string does not.
fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

/// Permissive date check: a handful of common calendar formats plus
/// RFC 3339 datetimes.
fn is_date(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    if DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
    {
        return true;
    }
    DateTime::parse_from_rfc3339(trimmed).is_ok()
}
