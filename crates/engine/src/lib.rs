//! Reporting engine for the coffee-program beneficiary dashboard.
//!
//! Rows come from an [`EntityDataSource`], are narrowed by [`filter`] and
//! [`search`] (or unioned by [`merge`] when the selection spans entities), and
//! are shaped into an [`ExportSpec`] that every output renders from.

pub mod catalog;
pub mod entity;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod merge;
pub mod query;
pub mod registry;
pub mod row;
pub mod search;
pub mod session;

pub use catalog::AttributeDescriptor;
pub use entity::{EntityKind, UnknownEntityKind};
pub use error::ReportError;
pub use export::{Cell, ExportSpec};
pub use filter::{DateRange, FilterCriteria, NumericRange};
pub use merge::{EntityDataSource, FetchError, InMemorySource};
pub use query::{ReportPlan, ReportQuery, ReportRows};
pub use row::{rows_from_listing, ReportRow, Row, TaggedRow};
pub use session::{QueryTicket, ReportSession};
