//! Stale-result guard for overlapping queries.
//!
//! The operator may change filters while an earlier fetch is still running.
//! Each query takes a ticket; only the newest ticket's results are accepted.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ReportError;
use crate::merge::EntityDataSource;
use crate::query::{self, ReportQuery, ReportRows};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

#[derive(Debug, Default)]
pub struct ReportSession {
    generation: AtomicU64,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query. Any earlier ticket becomes stale.
    pub fn begin(&self) -> QueryTicket {
        QueryTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Hand back `value` only if `ticket` is still the newest.
    pub fn accept<T>(&self, ticket: QueryTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            log::debug!("discarding stale result for query #{}", ticket.0);
            None
        }
    }

    /// Run `query` under a fresh ticket. `Ok(None)` means a newer query superseded it.
    pub fn run<S: EntityDataSource + ?Sized>(
        &self,
        query: &ReportQuery,
        source: &S,
    ) -> Result<Option<ReportRows>, ReportError> {
        let ticket = self.begin();
        let rows = query::run(query, source)?;
        Ok(self.accept(ticket, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::merge::{FetchError, InMemorySource};
    use crate::row::Row;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_only_newest_ticket_is_accepted() {
        let session = ReportSession::new();
        let first = session.begin();
        let second = session.begin();
        assert!(!session.is_current(first));
        assert_eq!(session.accept(first, 1), None);
        assert_eq!(session.accept(second, 2), Some(2));
    }

    #[test]
    fn test_run_returns_rows_when_uncontested() {
        let session = ReportSession::new();
        let src = InMemorySource::new()
            .with_rows(EntityKind::ActivityLog, vec![Row::default().with("action", "Login")]);
        let rows = session.run(&ReportQuery::new(EntityKind::ActivityLog), &src).unwrap();
        assert_eq!(rows.map(|r| r.len()), Some(1));
    }

    /// Blocks inside `fetch_all` until released, so a second query can start meanwhile.
    struct GatedSource {
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
    }

    impl EntityDataSource for GatedSource {
        fn fetch_all(&self, _kind: EntityKind) -> Result<Vec<Row>, FetchError> {
            self.entered.wait();
            self.release.wait();
            Ok(vec![Row::default()])
        }
    }

    #[test]
    fn test_superseded_query_is_discarded() {
        let session = Arc::new(ReportSession::new());
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let src = GatedSource { entered: Arc::clone(&entered), release: Arc::clone(&release) };

        let slow = {
            let session = Arc::clone(&session);
            thread::spawn(move || session.run(&ReportQuery::new(EntityKind::FarmLocation), &src))
        };
        entered.wait();
        let newer = session.begin();
        release.wait();

        let stale = slow.join().unwrap().unwrap();
        assert!(stale.is_none());
        assert!(session.is_current(newer));
    }
}
