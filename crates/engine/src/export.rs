//! `ExportSpec` - the entity-agnostic table both exporters and the live view consume.
//!
//! Header/row construction lives here and nowhere else:
//! - selected attributes (unknown ids dropped) in selection order, or the entity's
//!   default columns when nothing usable was selected
//! - a leading 1-based `#` column numbering rows in their filtered/searched order
//! - in merged reports a cell is only filled when the row's source entity owns
//!   the attribute

use serde::Serialize;

use crate::catalog::{self, Accessor, AttributeDescriptor};
use crate::entity::EntityKind;
use crate::format::{self, ValueClass};
use crate::query::ReportRows;
use crate::registry::schema;
use crate::row::ReportRow;

pub const ROW_NUMBER_HEADER: &str = "#";

/// One table cell, before display formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Display string; the single formatting path for every output.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format::format_number(*n),
            Cell::Missing => format::PLACEHOLDER.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSpec {
    pub headers: Vec<String>,
    /// Every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<Cell>>,
    pub filename_base: String,
    /// Entity the report was built from; `None` for merged reports.
    pub entity: Option<EntityKind>,
}

impl ExportSpec {
    /// Build from query results. `filename_base` defaults to the report's name.
    pub fn from_report<S: AsRef<str>>(
        report: &ReportRows,
        selected_ids: &[S],
        filename_base: Option<&str>,
    ) -> Self {
        let base = filename_base
            .map(str::to_string)
            .unwrap_or_else(|| report.report_name().to_string());
        match report {
            ReportRows::Single { kind, rows } => build(rows, Some(*kind), selected_ids, base),
            ReportRows::Merged(rows) => build(rows, None, selected_ids, base),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Whether the columns are the entity's default set (document width tables key on this).
    pub fn uses_default_columns(&self) -> bool {
        let Some(kind) = self.entity else {
            return false;
        };
        let defaults = default_columns(kind);
        self.headers.len() == defaults.len() + 1
            && self.headers[1..]
                .iter()
                .zip(&defaults)
                .all(|(header, attr)| header == attr.label)
    }

    /// Display strings for every cell, row by row.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Cell::display).collect())
            .collect()
    }
}

fn default_columns(kind: EntityKind) -> Vec<&'static AttributeDescriptor> {
    catalog::resolve(schema(kind).default_columns)
}

/// Build an [`ExportSpec`] from rows. `context` is the report entity for untagged rows.
pub fn build<R, S>(
    rows: &[R],
    context: Option<EntityKind>,
    selected_ids: &[S],
    filename_base: String,
) -> ExportSpec
where
    R: ReportRow,
    S: AsRef<str>,
{
    let mut columns = catalog::resolve(selected_ids);
    if columns.is_empty() {
        if let Some(kind) = context {
            columns = default_columns(kind);
        }
    }

    let mut headers = Vec::with_capacity(columns.len() + 1);
    headers.push(ROW_NUMBER_HEADER.to_string());
    headers.extend(columns.iter().map(|attr| attr.label.to_string()));

    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let owner = row.source_entity().or(context);
            let mut cells = Vec::with_capacity(headers.len());
            cells.push(Cell::Number((i + 1) as f64));
            cells.extend(columns.iter().map(|attr| cell_for(attr, row, owner)));
            cells
        })
        .collect();

    ExportSpec { headers, rows, filename_base, entity: context }
}

fn cell_for<R: ReportRow>(attr: &AttributeDescriptor, row: &R, owner: Option<EntityKind>) -> Cell {
    if owner.is_some_and(|kind| kind != attr.entity) {
        return Cell::Missing;
    }
    let row = row.row();
    match (attr.class, attr.accessor) {
        (ValueClass::Number, Accessor::Field(field)) => format::number_of(row.get(field))
            .map(Cell::Number)
            .unwrap_or(Cell::Missing),
        _ => attr.display(row).map(Cell::Text).unwrap_or(Cell::Missing),
    }
}
