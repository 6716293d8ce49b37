use crate::merge::FetchError;

/// Errors surfaced to the caller of a report query.
///
/// Filtering, searching and building the export table cannot fail; only the data
/// service can.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("data fetch failed: {0}")]
    DataFetch(#[from] FetchError),
}
