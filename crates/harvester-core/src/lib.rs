//! Core engine behind the content-harvester CLI.
//!
//! - [`orchestrator`] — `ingest_all`/`ingest_source`, the per-source
//!   failure-isolated fetch-and-store loop, and the run report it produces.
//! - [`query`] — `query_by_source`/`query_by_keyword`/`query_by_archive_date`,
//!   each preferring the relational index and falling back to a filesystem
//!   scan when it isn't present.
//! - [`reporter`] — the `Reporter` trait the CLI implements for progress
//!   narration.

pub mod orchestrator;
pub mod query;
pub mod reporter;

pub use orchestrator::{ingest_all, ingest_source, RunReport, SourceFailure, SourceSuccess};
pub use query::{query_by_archive_date, query_by_keyword, query_by_source, ArchiveRange};
pub use reporter::{NullReporter, Reporter};
