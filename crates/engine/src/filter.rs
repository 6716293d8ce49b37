//! Filter engine - per-entity predicates over fetched rows.
//!
//! A [`FilterCriteria`] is entity-agnostic: it names filter keys, and the entity's
//! [`EntitySchema`](crate::registry::EntitySchema) decides which fields each key
//! reads and how it matches. Keys the entity does not declare impose no constraint.
//!
//! Invariants:
//! - An empty criteria value is the identity transform
//! - Output is always a subsequence of the input (order preserved)
//! - All active predicates combine with AND
//! - Malformed numbers/dates never raise; they read as absent

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::format;
use crate::registry::{schema, FilterClass};
use crate::row::Row;

/// Inclusive numeric bounds. `None` on a side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| min <= value) && self.max.map_or(true, |max| value <= max)
    }
}

/// Inclusive date bounds `[from, to]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| from <= date) && self.to.map_or(true, |to| date <= to)
    }
}

/// Filter values for one report. Absent or blank entries mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Text fragments and enumerated selections, keyed by filter key.
    pub values: BTreeMap<String, String>,
    /// Numeric bounds keyed by filter key.
    pub ranges: BTreeMap<String, NumericRange>,
    pub dates: DateRange,
}

impl FilterCriteria {
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_range(mut self, key: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.ranges.insert(key.to_string(), NumericRange { min, max });
        self
    }

    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.dates = DateRange { from, to };
        self
    }

    /// True when no entry would constrain any entity.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
            && self.ranges.values().all(|r| !r.is_active())
            && !self.dates.is_active()
    }

    /// Keys that `kind` does not declare; they are ignored when filtering.
    pub fn unrecognised_keys(&self, kind: EntityKind) -> Vec<String> {
        let schema = schema(kind);
        self.values
            .keys()
            .chain(self.ranges.keys())
            .filter(|key| schema.filter_field(key).is_none())
            .cloned()
            .collect()
    }
}

/// One active predicate, resolved against an entity schema.
#[derive(Debug)]
enum Predicate<'a> {
    Fragment { needle: String, fields: &'static [&'static str] },
    Choice { value: &'a str, field: &'static str },
    Range { range: NumericRange, field: &'static str },
    Dates { range: DateRange, fields: &'static [&'static str] },
}

impl Predicate<'_> {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Fragment { needle, fields } => fields.iter().any(|field| {
                format::text_of(row.get(field))
                    .map_or(false, |text| text.to_lowercase().contains(needle.as_str()))
            }),
            Predicate::Choice { value, field } => {
                format::text_of(row.get(field)).map_or(false, |text| text == *value)
            }
            // Unparsable or missing values fail an active bound
            Predicate::Range { range, field } => {
                format::number_of(row.get(field)).map_or(false, |n| range.contains(n))
            }
            Predicate::Dates { range, fields } => {
                let mut dates = fields
                    .iter()
                    .filter_map(|field| format::text_of(row.get(field)))
                    .filter_map(|text| format::parse_date(&text))
                    .peekable();
                // No parsable date: the filter does not apply to this row
                if dates.peek().is_none() {
                    return true;
                }
                dates.any(|d| range.contains(d))
            }
        }
    }
}

fn compile(kind: EntityKind, filters: &FilterCriteria) -> Vec<Predicate<'_>> {
    let schema = schema(kind);
    let mut predicates = Vec::new();

    for (key, value) in &filters.values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let Some(field) = schema.filter_field(key) else {
            continue;
        };
        match field.class {
            FilterClass::Fragment => predicates.push(Predicate::Fragment {
                needle: value.to_lowercase(),
                fields: field.fields,
            }),
            FilterClass::Choice => predicates.push(Predicate::Choice {
                value,
                field: field.fields[0],
            }),
            // A plain value on a range key pins both bounds
            FilterClass::Range => {
                if let Some(n) = format::parse_number(value) {
                    predicates.push(Predicate::Range {
                        range: NumericRange { min: Some(n), max: Some(n) },
                        field: field.fields[0],
                    });
                }
            }
        }
    }

    for (key, range) in &filters.ranges {
        if !range.is_active() {
            continue;
        }
        if let Some(field) = schema.filter_field(key) {
            if field.class == FilterClass::Range {
                predicates.push(Predicate::Range { range: *range, field: field.fields[0] });
            }
        }
    }

    if filters.dates.is_active() && !schema.date_fields.is_empty() {
        predicates.push(Predicate::Dates { range: filters.dates, fields: schema.date_fields });
    }

    predicates
}

/// Does `row` satisfy every active predicate of `filters` for `kind`?
pub fn matches(kind: EntityKind, row: &Row, filters: &FilterCriteria) -> bool {
    compile(kind, filters).iter().all(|p| p.matches(row))
}

/// Keep the rows of `kind` that satisfy `filters`, preserving order.
pub fn apply(kind: EntityKind, mut rows: Vec<Row>, filters: &FilterCriteria) -> Vec<Row> {
    let predicates = compile(kind, filters);
    if predicates.is_empty() {
        return rows;
    }
    let before = rows.len();
    rows.retain(|row| predicates.iter().all(|p| p.matches(row)));
    log::debug!(
        "{kind}: {} predicate(s) kept {} of {before} rows",
        predicates.len(),
        rows.len()
    );
    rows
}
