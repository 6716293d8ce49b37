//! Dashboard API client - the remote `EntityDataSource`.
//!
//! One endpoint per entity kind, `GET <api_base>/<slug>`, returning the full
//! listing. No filtering or paging is pushed to the server.

mod client;

pub use client::{HttpSource, SourceError, DEFAULT_TIMEOUT};
