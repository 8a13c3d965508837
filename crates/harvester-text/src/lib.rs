//! Text-shaping helpers shared by adapters and storage.
//!
//! - [`markdown`] — HTML -> Markdown conversion and whitespace normalization.
//! - [`extract`] — readability-style main-content extraction with a length
//!   floor, layered on top of [`markdown`].
//! - [`blocked`] — anti-bot / interstitial page detection.
//! - [`slug`] — deterministic `item_id` / `record_id` derivation.
//! - [`url_canon`] — URL canonicalization for de-duplication.

pub mod blocked;
pub mod extract;
pub mod markdown;
pub mod slug;
pub mod url_canon;

pub use blocked::detect_blocked;
pub use extract::extract_main_content;
pub use markdown::{extract_and_convert, html_to_markdown, normalize};
pub use slug::{item_id, record_id, slugify};
pub use url_canon::canonicalize;
