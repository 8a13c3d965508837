//! Domain types shared across the harvester workspace.
//!
//! - [`item`] — `BlogItem` / `AggregationItem` / `AggregationComment`, and the
//!   tagged `Item` union an adapter returns.
//! - [`record`] — the unified `Record` shape used by storage, the index, and
//!   the query engine.
//! - [`source`] — `SourceKind`, `Transport`, and the static `SourceDescriptor`.
//! - [`error`] — the `HarvestError` taxonomy.
//! - [`time`] — the `iso_now`/`iso_date_today` stamp format and lenient
//!   timestamp parsing shared by adapters, storage, and the query engine.

pub mod error;
pub mod item;
pub mod record;
pub mod source;
pub mod time;

pub use error::HarvestError;
pub use item::{AggregationComment, AggregationItem, BlogItem, ExtraMap, Item, Scalar};
pub use record::Record;
pub use source::{SourceDescriptor, SourceKind, Transport};
pub use time::{iso_date_today, iso_now, parse_date, parse_datetime, run_id_now};

pub type Result<T> = std::result::Result<T, HarvestError>;
