// --filter / --from / --to parsing into FilterCriteria

use beantrack_engine::{format, FilterCriteria};
use chrono::NaiveDate;

use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Text fragment, enumerated choice, or exact number on a range key
    Eq,
    /// Inclusive lower bound
    Ge,
    /// Inclusive upper bound
    Le,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub key: String,
    pub op: FilterOp,
    pub value: String,
}

/// Parse `key=value`, `key>=n` or `key<=n`.
pub fn parse_filter(expr: &str) -> Result<FilterClause, CliError> {
    // The operator is the first '=', with a '>' or '<' in front of it for
    // bounds. Anything after it belongs to the value.
    let Some(pos) = expr.find('=') else {
        if expr.contains('<') || expr.contains('>') {
            return Err(strict_bound(expr));
        }
        return Err(CliError::args(format!("no operator found in --filter {:?}", expr))
            .with_hint("syntax: 'gender=Female', 'age>=18', 'hectares<=2.5'"));
    };
    let (key, op) = match expr[..pos].strip_suffix('>') {
        Some(key) => (key, FilterOp::Ge),
        None => match expr[..pos].strip_suffix('<') {
            Some(key) => (key, FilterOp::Le),
            None => (&expr[..pos], FilterOp::Eq),
        },
    };
    if key.contains('<') || key.contains('>') {
        return Err(strict_bound(expr));
    }
    let raw_value = &expr[pos + 1..];

    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::args(format!("empty filter key in --filter {:?}", expr)));
    }

    // Strip one layer of surrounding quotes from value
    let value = raw_value.trim();
    let value = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    };

    Ok(FilterClause { key: key.to_string(), op, value: value.to_string() })
}

fn strict_bound(expr: &str) -> CliError {
    CliError::args(format!("unsupported operator in --filter {:?}", expr))
        .with_hint("bounds are inclusive: use 'key>=n' or 'key<=n'")
}

/// Fold clauses and the date bounds into one criteria value.
///
/// Repeated `=` on a key keeps the last value; `>=` and `<=` on the same key
/// combine into one range.
pub fn build_criteria(
    exprs: &[String],
    from: Option<&str>,
    to: Option<&str>,
) -> Result<FilterCriteria, CliError> {
    let mut criteria = FilterCriteria::default();
    for expr in exprs {
        let clause = parse_filter(expr)?;
        match clause.op {
            FilterOp::Eq => {
                criteria.values.insert(clause.key, clause.value);
            }
            FilterOp::Ge | FilterOp::Le => {
                let bound = format::parse_number(&clause.value).ok_or_else(|| {
                    CliError::args(format!("--filter {:?}: {:?} is not a number", expr, clause.value))
                })?;
                let range = criteria.ranges.entry(clause.key).or_default();
                if clause.op == FilterOp::Ge {
                    range.min = Some(bound);
                } else {
                    range.max = Some(bound);
                }
            }
        }
    }

    criteria.dates.from = from.map(|s| parse_date_arg("--from", s)).transpose()?;
    criteria.dates.to = to.map(|s| parse_date_arg("--to", s)).transpose()?;
    if let (Some(from), Some(to)) = (criteria.dates.from, criteria.dates.to) {
        if from > to {
            return Err(CliError::args(format!("--from {} is after --to {}", from, to)));
        }
    }
    Ok(criteria)
}

fn parse_date_arg(flag: &str, s: &str) -> Result<NaiveDate, CliError> {
    format::parse_date(s).ok_or_else(|| {
        CliError::args(format!("{} {:?} is not a date", flag, s)).with_hint("use YYYY-MM-DD")
    })
}
