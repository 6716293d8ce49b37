//! Display formatting shared by the live view and both exporters.
//!
//! Every cell that reaches a screen, a CSV file or a document passes through
//! [`render`], so the three outputs cannot drift apart. Parsing helpers here are
//! also what the filter engine uses; a value that fails to parse is treated as
//! absent everywhere.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for missing, null, blank or malformed values.
pub const PLACEHOLDER: &str = "\u{2014}";

/// How an attribute's raw value is interpreted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    Text,
    Number,
    Date,
    Timestamp,
}

/// Render a raw field value for display. `None` means "show the placeholder".
pub fn render(value: &Value, class: ValueClass) -> Option<String> {
    match class {
        ValueClass::Text => text_of(value),
        ValueClass::Number => number_of(value).map(format_number),
        ValueClass::Date => text_of(value)
            .and_then(|s| parse_date(&s))
            .map(format_date),
        ValueClass::Timestamp => text_of(value).and_then(|s| {
            parse_timestamp(&s)
                .map(format_timestamp)
                .or_else(|| parse_date(&s).map(format_date))
        }),
    }
}

/// Like [`render`] but substitutes the placeholder.
pub fn render_or_placeholder(value: &Value, class: ValueClass) -> String {
    render(value, class).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Plain-text view of a scalar. Blank strings and null are absent.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        // Nested values are not part of any entity schema
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric view of a scalar. Numeric strings (thousands separators allowed) parse.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Parse a calendar date from the formats the data service emits.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some(dt) = parse_timestamp(s) {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}

/// Parse a timestamp. RFC 3339 values keep the wall-clock time of their own offset.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Integral values print without decimals; others keep up to four, trailing zeros trimmed.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let fixed = format!("{:.4}", n);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `M/D/YYYY`
pub fn format_date(d: NaiveDate) -> String {
    d.format("%-m/%-d/%Y").to_string()
}

/// `M/D/YYYY, h:mm AM/PM`
pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format("%-m/%-d/%Y, %-I:%M %p").to_string()
}

/// `YYYY-MM-DD`, used in export filenames.
pub fn file_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
