use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use harvester_http::FetchContext;
use harvester_types::{
    AggregationComment, AggregationItem, HarvestError, Item, Result, SourceDescriptor, SourceKind,
    Transport,
};
use serde_json::Value;

/// Hacker-News-shaped link aggregator: a `topstories`-like id list, one fetch
/// per story, then a bounded breadth-first walk of each story's comment
/// thread. Stories are re-ranked by comment count (not API order) before the
/// top `limit` survive.
pub struct CommentSiteAdapter {
    descriptor: SourceDescriptor,
    api_base: String,
    item_path: fn(&str, u64) -> String,
    list_path: String,
    discussion_url: fn(&str, u64) -> String,
    seed_limit: usize,
    rank_limit: usize,
    comment_limit: usize,
    comment_budget: Duration,
}

impl CommentSiteAdapter {
    /// Builds the Hacker News variant: `topstories.json` seed list, one
    /// `item/<id>.json` fetch per story, `kids` BFS for comments.
    pub fn hacker_news(api_base: &str) -> Self {
        Self {
            descriptor: SourceDescriptor {
                id: "hn".to_string(),
                name: "Hacker News".to_string(),
                kind: SourceKind::Aggregation,
                transport: Transport::Api,
                enabled: true,
            },
            api_base: api_base.to_string(),
            item_path: |base, id| format!("{base}/item/{id}.json"),
            list_path: "/topstories.json".to_string(),
            discussion_url: |_base, id| format!("https://news.ycombinator.com/item?id={id}"),
            seed_limit: 20,
            rank_limit: 10,
            comment_limit: 20,
            comment_budget: Duration::from_secs(30),
        }
    }

    pub fn with_comment_budget(mut self, budget: Duration) -> Self {
        self.comment_budget = budget;
        self
    }

    pub fn with_comment_limit(mut self, limit: usize) -> Self {
        self.comment_limit = limit;
        self
    }

    fn fetch_story(&self, ctx: &FetchContext, story_id: u64) -> Option<(AggregationItem, Vec<u64>)> {
        let payload: Value = ctx
            .session
            .get_json((self.item_path)(&self.api_base, story_id).as_str())
            .ok()?;
        let obj = payload.as_object()?;
        if obj.get("type").and_then(Value::as_str) != Some("story") {
            return None;
        }
        let title = obj.get("title").and_then(Value::as_str)?.to_string();
        let discussion_url = (self.discussion_url)(&self.api_base, story_id);
        let url = obj
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| discussion_url.clone());
        let url = harvester_text::canonicalize(&url).unwrap_or(url);
        let kids: Vec<u64> = obj
            .get("kids")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default();

        let item = AggregationItem {
            title,
            url,
            published_at: obj.get("time").and_then(Value::as_i64).and_then(iso_from_unix),
            author: obj.get("by").and_then(Value::as_str).map(str::to_string),
            score: obj.get("score").and_then(Value::as_i64),
            comments_count: obj.get("descendants").and_then(Value::as_i64).or(Some(0)),
            rank: None,
            discussion_url: Some(discussion_url),
            comments: Vec::new(),
            extra: Default::default(),
        };
        Some((item, kids))
    }

    fn fetch_comments(&self, ctx: &FetchContext, root_ids: Vec<u64>) -> Vec<AggregationComment> {
        let mut comments = Vec::new();
        let mut queue: VecDeque<u64> = root_ids.into_iter().collect();
        let deadline = Instant::now() + self.comment_budget;

        while let Some(comment_id) = queue.pop_front() {
            if comments.len() >= self.comment_limit || Instant::now() >= deadline {
                break;
            }
            let Ok(payload) = ctx
                .session
                .get_json::<Value>((self.item_path)(&self.api_base, comment_id).as_str())
            else {
                continue;
            };
            let Some(obj) = payload.as_object() else {
                continue;
            };
            if obj.get("type").and_then(Value::as_str) != Some("comment") {
                continue;
            }
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .map(strip_html_entities)
                .unwrap_or_else(|| "[deleted]".to_string());
            comments.push(AggregationComment {
                author: obj.get("by").and_then(Value::as_str).map(str::to_string),
                published_at: obj.get("time").and_then(Value::as_i64).and_then(iso_from_unix),
                text,
            });
            if let Some(kids) = obj.get("kids").and_then(Value::as_array) {
                for kid in kids.iter().filter_map(Value::as_u64) {
                    if comments.len() + queue.len() >= self.comment_limit {
                        break;
                    }
                    queue.push_back(kid);
                }
            }
        }
        comments
    }
}

impl crate::adapter::Adapter for CommentSiteAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Item>> {
        let seed_url = format!("{}{}", self.api_base, self.list_path);
        let top_ids: Vec<u64> = ctx.session.get_json(&seed_url)?;

        let mut candidates: Vec<(AggregationItem, Vec<u64>)> = Vec::new();
        for story_id in top_ids.into_iter().take(self.seed_limit) {
            if let Some(candidate) = self.fetch_story(ctx, story_id) {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            return Err(HarvestError::Fetch(format!("{} list empty", self.descriptor.id)));
        }

        candidates.sort_by(|a, b| {
            b.0.comments_count
                .unwrap_or(0)
                .cmp(&a.0.comments_count.unwrap_or(0))
        });

        let mut ranked = Vec::new();
        for (rank, (mut item, kids)) in candidates.into_iter().take(self.rank_limit).enumerate() {
            item.rank = Some(rank as i64 + 1);
            item.comments = self.fetch_comments(ctx, kids);
            ranked.push(Item::Aggregation(item));
        }

        Ok(ranked)
    }
}

fn iso_from_unix(seconds: i64) -> Option<String> {
    match Utc.timestamp_opt(seconds, 0) {
        chrono::LocalResult::Single(dt) => Some(dt.to_rfc3339()),
        _ => None,
    }
}

/// HN comment bodies are pre-escaped HTML fragments without full markup, so
/// a small entity/tag strip is enough — no need to pull in a full parser.
fn strip_html_entities(value: &str) -> String {
    let without_tags: String = {
        let mut out = String::with_capacity(value.len());
        let mut in_tag = false;
        for ch in value.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => out.push(ch),
                _ => {}
            }
        }
        out
    };
    without_tags
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_entities_removes_tags_and_decodes() {
        let input = "<p>Hello &amp; welcome</p>";
        assert_eq!(strip_html_entities(input), "Hello & welcome");
    }

    #[test]
    fn iso_from_unix_formats_rfc3339() {
        let formatted = iso_from_unix(0).unwrap();
        assert!(formatted.starts_with("1970-01-01"));
    }
}
