use harvester_types::{AggregationItem, HarvestError, Item, Result, SourceDescriptor, SourceKind, Transport};
use serde_json::Value;

use harvester_http::FetchContext;

/// Where a [`JsonListAdapter`] gets the URL to fetch: a fixed string, or one
/// computed from the run's [`FetchContext`] (a rolling search window, say).
enum UrlSource {
    Static(String),
    Dynamic(fn(&FetchContext) -> String),
}

/// Adapts a flat JSON array (or an array nested one level under a top-level
/// object key) into ranked [`AggregationItem`]s. Covers link aggregators
/// whose API returns one object per story with no comment tree to walk —
/// Lobsters' `hottest.json`, GitHub's search results, and similar.
pub struct JsonListAdapter {
    descriptor: SourceDescriptor,
    url: UrlSource,
    /// Key holding the array, when the payload root is an object rather
    /// than the array itself (e.g. GitHub search's `{"items": [...]}`).
    array_key: Option<&'static str>,
    limit: usize,
    map_entry: fn(usize, &Value) -> Option<AggregationItem>,
}

impl JsonListAdapter {
    pub fn new(
        id: &str,
        name: &str,
        url: &str,
        limit: usize,
        map_entry: fn(usize, &Value) -> Option<AggregationItem>,
    ) -> Self {
        Self::build(id, name, UrlSource::Static(url.to_string()), limit, map_entry)
    }

    /// Like [`new`](Self::new), but the URL is recomputed from the run's
    /// [`FetchContext`] on every `fetch`, instead of being baked in once at
    /// registration time.
    pub fn new_dynamic(
        id: &str,
        name: &str,
        url_for: fn(&FetchContext) -> String,
        limit: usize,
        map_entry: fn(usize, &Value) -> Option<AggregationItem>,
    ) -> Self {
        Self::build(id, name, UrlSource::Dynamic(url_for), limit, map_entry)
    }

    fn build(
        id: &str,
        name: &str,
        url: UrlSource,
        limit: usize,
        map_entry: fn(usize, &Value) -> Option<AggregationItem>,
    ) -> Self {
        Self {
            descriptor: SourceDescriptor {
                id: id.to_string(),
                name: name.to_string(),
                kind: SourceKind::Aggregation,
                transport: Transport::Api,
                enabled: true,
            },
            url,
            array_key: None,
            limit,
            map_entry,
        }
    }

    pub fn with_array_key(mut self, key: &'static str) -> Self {
        self.array_key = Some(key);
        self
    }
}

impl crate::adapter::Adapter for JsonListAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Item>> {
        let url = match &self.url {
            UrlSource::Static(url) => url.clone(),
            UrlSource::Dynamic(url_for) => url_for(ctx),
        };
        let payload: Value = ctx.session.get_json(&url)?;
        let array = match self.array_key {
            Some(key) => payload.get(key).and_then(Value::as_array),
            None => payload.as_array(),
        }
        .ok_or_else(|| HarvestError::Fetch(format!("{} payload invalid", self.descriptor.id)))?;

        let items: Vec<Item> = array
            .iter()
            .take(self.limit)
            .enumerate()
            .filter_map(|(i, entry)| (self.map_entry)(i, entry))
            .map(Item::Aggregation)
            .collect();

        if items.is_empty() {
            return Err(HarvestError::Fetch(format!("{} list empty", self.descriptor.id)));
        }

        Ok(items)
    }
}

/// Builds the Lobsters `hottest.json` variant.
pub fn lobsters(url: &str, limit: usize) -> JsonListAdapter {
    JsonListAdapter::new("lobsters", "Lobsters", url, limit, |rank, entry| {
        let title = entry.get("title")?.as_str()?.to_string();
        let url = entry
            .get("url")
            .and_then(Value::as_str)
            .or_else(|| entry.get("comments_url").and_then(Value::as_str))?
            .to_string();
        let url = harvester_text::canonicalize(&url).unwrap_or(url);
        let author = entry
            .get("submitter_user")
            .and_then(|s| s.get("username").or(Some(s)))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(AggregationItem {
            title,
            url,
            published_at: entry.get("created_at").and_then(Value::as_str).map(str::to_string),
            author,
            score: entry.get("score").and_then(Value::as_i64),
            comments_count: entry.get("comments_count").and_then(Value::as_i64),
            rank: Some(rank as i64 + 1),
            discussion_url: entry.get("comments_url").and_then(Value::as_str).map(str::to_string),
            comments: Vec::new(),
            extra: Default::default(),
        })
    })
}

/// Rolling 7-day cutoff for the GitHub trending search, recomputed from the
/// run's `now` each fetch rather than baked into a static URL.
fn github_trending_url(ctx: &FetchContext) -> String {
    let since = (ctx.now - chrono::Duration::days(7)).date_naive();
    format!(
        "https://api.github.com/search/repositories?q=created%3A%3E{since}&sort=stars&order=desc&per_page=20"
    )
}

/// Builds the GitHub trending-repos variant over the search API's
/// `{"items": [...]}` envelope.
pub fn github_trending(limit: usize) -> JsonListAdapter {
    JsonListAdapter::new_dynamic("github-trending", "GitHub Trending", github_trending_url, limit, |rank, entry| {
        let title = entry.get("full_name")?.as_str()?.to_string();
        let url = entry.get("html_url")?.as_str()?.to_string();
        let url = harvester_text::canonicalize(&url).unwrap_or(url);
        let author = entry
            .get("owner")
            .and_then(|o| o.get("login"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut extra = harvester_types::ExtraMap::new();
        if let Some(language) = entry.get("language").and_then(Value::as_str) {
            extra.insert("language".to_string(), harvester_types::Scalar::Str(language.to_string()));
        }
        if let Some(description) = entry.get("description").and_then(Value::as_str) {
            extra.insert(
                "description".to_string(),
                harvester_types::Scalar::Str(description.to_string()),
            );
        }

        Some(AggregationItem {
            title,
            url,
            published_at: entry.get("created_at").and_then(Value::as_str).map(str::to_string),
            author,
            score: entry.get("stargazers_count").and_then(Value::as_i64),
            comments_count: None,
            rank: Some(rank as i64 + 1),
            discussion_url: None,
            comments: Vec::new(),
            extra,
        })
    })
    .with_array_key("items")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lobsters_map_entry_prefers_url_over_comments_url() {
        let adapter = lobsters("https://lobste.rs/hottest.json", 25);
        let entry = json!({
            "title": "Some Story",
            "url": "https://example.com/story",
            "comments_url": "https://lobste.rs/s/abc",
            "score": 42,
            "comments_count": 3,
            "submitter_user": {"username": "alice"},
        });
        let item = (adapter.map_entry)(0, &entry).expect("maps");
        assert_eq!(item.url, "https://example.com/story");
        assert_eq!(item.author.as_deref(), Some("alice"));
        assert_eq!(item.rank, Some(1));
    }

    #[test]
    fn github_trending_extracts_language_and_description() {
        let adapter = github_trending(20);
        let entry = json!({
            "full_name": "rust-lang/rust",
            "html_url": "https://github.com/rust-lang/rust",
            "owner": {"login": "rust-lang"},
            "stargazers_count": 90000,
            "language": "Rust",
            "description": "The Rust compiler",
        });
        let item = (adapter.map_entry)(4, &entry).expect("maps");
        assert_eq!(item.rank, Some(5));
        assert_eq!(item.author.as_deref(), Some("rust-lang"));
    }

    #[test]
    fn github_trending_url_uses_a_rolling_seven_day_cutoff() {
        let now = chrono::DateTime::parse_from_rfc3339("2026-07-31T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let ctx = FetchContext::new(harvester_http::Session::with_default_timeout(), "run".to_string(), now);
        let url = github_trending_url(&ctx);
        assert!(url.contains("created%3A%3E2026-07-24"), "unexpected url: {url}");
    }
}
