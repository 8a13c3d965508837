use serde::{Deserialize, Serialize};

use crate::item::ExtraMap;
use crate::source::SourceKind;

/// The unified view over blog and aggregation items used by queries and the
/// relational index. Computed on demand from manifests/snapshots, or read
/// back from the index when it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub source_id: String,
    pub source_name: String,
    pub kind: SourceKind,
    pub title: String,
    pub url: String,
    pub archived_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default)]
    pub extra: ExtraMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
}
