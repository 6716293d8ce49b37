//! Cross-entity merge and the data source seam.
//!
//! A merged report is a union of independently fetched rows, each tagged with
//! its source entity. No correlation by beneficiary or plot is attempted.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::catalog;
use crate::entity::EntityKind;
use crate::row::{Row, TaggedRow};

/// The entity data service failed for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch {entity}: {message}")]
pub struct FetchError {
    pub entity: EntityKind,
    pub message: String,
}

impl FetchError {
    pub fn new(entity: EntityKind, message: impl Into<String>) -> Self {
        Self { entity, message: message.into() }
    }
}

/// Supplies the full row set for one entity kind. No filtering is pushed down.
///
/// Implementations are shared across fetch threads during a merge.
pub trait EntityDataSource: Sync {
    fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Row>, FetchError>;
}

impl<T: EntityDataSource + ?Sized> EntityDataSource for &T {
    fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Row>, FetchError> {
        (**self).fetch_all(kind)
    }
}

/// Fetch every kind in `kinds` in parallel and join. Results come back in the
/// order of `kinds`.
pub fn fetch_many<S: EntityDataSource + ?Sized>(
    source: &S,
    kinds: &[EntityKind],
) -> Vec<(EntityKind, Result<Vec<Row>, FetchError>)> {
    if kinds.len() <= 1 {
        return kinds.iter().map(|&kind| (kind, source.fetch_all(kind))).collect();
    }
    thread::scope(|scope| {
        let handles: Vec<_> = kinds
            .iter()
            .map(|&kind| (kind, scope.spawn(move || source.fetch_all(kind))))
            .collect();
        handles
            .into_iter()
            .map(|(kind, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(FetchError::new(kind, "fetch thread panicked")));
                (kind, result)
            })
            .collect()
    })
}

/// Union the rows of every entity involved in `selected_ids`, tagged by source.
///
/// Rows are concatenated in entity declaration order, each entity's native order
/// preserved. The first failing entity (in declaration order) is returned; every
/// failure is logged.
pub fn merge<S, I>(selected_ids: &[I], source: &S) -> Result<Vec<TaggedRow>, FetchError>
where
    S: EntityDataSource + ?Sized,
    I: AsRef<str>,
{
    let kinds = catalog::involved_entities(selected_ids);
    if kinds.len() < 2 {
        log::debug!("merge requested for {} entity kind(s)", kinds.len());
    }

    let mut merged = Vec::new();
    let mut first_error = None;
    for (kind, result) in fetch_many(source, &kinds) {
        match result {
            Ok(rows) => merged.extend(rows.into_iter().map(|row| TaggedRow::new(kind, row))),
            Err(err) => {
                log::warn!("{err}");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(merged),
    }
}

/// In-memory data source, used by tests and by callers that already hold rows.
#[derive(Debug, Default)]
pub struct InMemorySource {
    rows: HashMap<EntityKind, Vec<Row>>,
    failing: HashSet<EntityKind>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, kind: EntityKind, rows: Vec<Row>) -> Self {
        self.rows.insert(kind, rows);
        self
    }

    /// Make every fetch of `kind` fail.
    pub fn failing(mut self, kind: EntityKind) -> Self {
        self.failing.insert(kind);
        self
    }

    /// Number of `fetch_all` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl EntityDataSource for InMemorySource {
    fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Row>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&kind) {
            return Err(FetchError::new(kind, "data service unavailable"));
        }
        Ok(self.rows.get(&kind).cloned().unwrap_or_default())
    }
}
