//! Durable storage for harvested content: a filesystem manifest/snapshot
//! layer that's the source of truth, and a relational index rebuilt from it
//! on demand for fast querying.
//!
//! - [`paths`] — every path the store touches, rooted at a data directory.
//! - [`placeholder`] — detects paywall/signup stand-in content for refills.
//! - [`fs_store`] — manifests, item content, daily snapshots, run reports.
//! - [`index`] — the `index.sqlite` relational mirror.

pub mod fs_store;
pub mod index;
pub mod paths;
pub mod placeholder;

pub use fs_store::FsStore;
pub use index::SqliteIndex;
pub use paths::DataPaths;
pub use placeholder::looks_like_placeholder;
