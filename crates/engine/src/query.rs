//! Report queries: fetch, filter, search, or fetch-and-merge.

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::entity::EntityKind;
use crate::error::ReportError;
use crate::filter::{self, FilterCriteria};
use crate::merge::{self, EntityDataSource};
use crate::row::{Row, TaggedRow};
use crate::search;

/// Everything the operator chose on the reports screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub entity_kind: EntityKind,
    #[serde(default)]
    pub selected_attribute_ids: Vec<String>,
    #[serde(default)]
    pub filters: FilterCriteria,
    #[serde(default)]
    pub search_text: String,
}

/// How a query will be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPlan {
    /// One entity: fetch, filter, search.
    Single(EntityKind),
    /// Two or more entities behind the selection: union of full row sets.
    Merged(Vec<EntityKind>),
}

impl ReportQuery {
    pub fn new(entity_kind: EntityKind) -> Self {
        Self {
            entity_kind,
            selected_attribute_ids: Vec::new(),
            filters: FilterCriteria::default(),
            search_text: String::new(),
        }
    }

    pub fn with_attributes<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.selected_attribute_ids = ids.iter().map(|id| id.as_ref().to_string()).collect();
        self
    }

    pub fn with_filters(mut self, filters: FilterCriteria) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_search(mut self, text: &str) -> Self {
        self.search_text = text.to_string();
        self
    }

    /// The selection decides the entity: a selection spanning several entities
    /// is a merge, a selection within one entity reports on that entity, and an
    /// empty (or entirely unknown) selection falls back to `entity_kind`.
    pub fn plan(&self) -> ReportPlan {
        let mut kinds = catalog::involved_entities(&self.selected_attribute_ids);
        match kinds.len() {
            0 => ReportPlan::Single(self.entity_kind),
            1 => ReportPlan::Single(kinds.remove(0)),
            _ => ReportPlan::Merged(kinds),
        }
    }
}

/// Rows produced by a query, ready for [`crate::export::ExportSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRows {
    Single { kind: EntityKind, rows: Vec<Row> },
    Merged(Vec<TaggedRow>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Single { rows, .. } => rows.len(),
            ReportRows::Merged(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single entity reported on, `None` for a merge.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            ReportRows::Single { kind, .. } => Some(*kind),
            ReportRows::Merged(_) => None,
        }
    }

    /// Default report title and filename base.
    pub fn report_name(&self) -> &'static str {
        match self {
            ReportRows::Single { kind, .. } => kind.label(),
            ReportRows::Merged(_) => "Merged Report",
        }
    }
}

/// Narrow already-fetched rows: filters first, then search.
pub fn evaluate(kind: EntityKind, rows: Vec<Row>, query: &ReportQuery) -> Vec<Row> {
    for key in query.filters.unrecognised_keys(kind) {
        log::debug!("filter key {key:?} does not apply to {kind}; ignored");
    }
    let filtered = filter::apply(kind, rows, &query.filters);
    search::apply(kind, filtered, &query.search_text)
}

/// Run a query against `source`.
///
/// Filters only apply to single-entity reports; merged reports are the full
/// union narrowed by search alone, each row searched against its own entity.
pub fn run<S: EntityDataSource + ?Sized>(
    query: &ReportQuery,
    source: &S,
) -> Result<ReportRows, ReportError> {
    match query.plan() {
        ReportPlan::Single(kind) => {
            let rows = source.fetch_all(kind)?;
            let fetched = rows.len();
            let rows = evaluate(kind, rows, query);
            log::info!("{kind}: {} of {fetched} rows after filters and search", rows.len());
            Ok(ReportRows::Single { kind, rows })
        }
        ReportPlan::Merged(kinds) => {
            if !query.filters.is_empty() {
                log::debug!("filters ignored for merged report over {} entities", kinds.len());
            }
            let merged = merge::merge(&query.selected_attribute_ids, source)?;
            let fetched = merged.len();
            let rows = search::apply_tagged(merged, &query.search_text);
            log::info!("merged report: {} of {fetched} rows after search", rows.len());
            Ok(ReportRows::Merged(rows))
        }
    }
}
