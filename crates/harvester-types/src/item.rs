use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A small scalar value, used for the free-form `extra` bag on aggregation
/// items and records. Mirrors the original Python `str | int | None` union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Null,
}

pub type ExtraMap = BTreeMap<String, Scalar>;

/// A full article or post produced by a blog-kind source. Immutable once an
/// adapter returns it; `url` is the identity key within a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_markdown: Option<String>,
}

/// A single comment on an aggregation item, HTML already stripped to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationComment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub text: String,
}

/// One ranked link from an aggregation source (link aggregator, trending
/// list, release feed), with its comment thread if the adapter collected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion_url: Option<String>,
    #[serde(default)]
    pub comments: Vec<AggregationComment>,
    #[serde(default)]
    pub extra: ExtraMap,
}

/// Tagged union of the two item shapes an adapter can produce, so the
/// orchestrator can treat an adapter's output uniformly regardless of the
/// source's `kind` before branching on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Blog(BlogItem),
    Aggregation(AggregationItem),
}

impl Item {
    pub fn as_blog(&self) -> Option<&BlogItem> {
        match self {
            Item::Blog(item) => Some(item),
            Item::Aggregation(_) => None,
        }
    }

    pub fn as_aggregation(&self) -> Option<&AggregationItem> {
        match self {
            Item::Aggregation(item) => Some(item),
            Item::Blog(_) => None,
        }
    }
}
