use harvester_types::SourceDescriptor;

use crate::adapter::Adapter;
use crate::adapters::{comment_site, html_list, json_list, releasebot, rss, AgentAdapter};

/// The complete, ordered set of sources the harvester knows about. Kept as
/// a fixed list rather than something dynamically discovered — adding a
/// source is a code change, not a config change, since each one needs an
/// adapter wired to it.
pub fn build_sources() -> Vec<Box<dyn Adapter>> {
    vec![
        Box::new(comment_site::CommentSiteAdapter::hacker_news("https://hacker-news.firebaseio.com/v0")),
        Box::new(json_list::lobsters("https://lobste.rs/hottest.json", 25)),
        Box::new(json_list::github_trending(20)),
        Box::new(releasebot::ReleasebotAdapter::new()),
        Box::new(html_list::HtmlListAdapter::new(
            "product-hunt-html",
            "Product Hunt (listing)",
            "https://www.producthunt.com/",
            "[data-test^=\"post-item\"]",
            "[data-test=\"post-name\"]",
            "a[href]",
            20,
        )),
        Box::new(rss::RssAdapter::new(
            "simon-willison",
            "Simon Willison's Weblog",
            "https://simonwillison.net/atom/everything/",
        )),
        Box::new(rss::RssAdapter::new("antirez", "antirez weblog", "http://antirez.com/rss")),
        Box::new(rss::RssAdapter::new(
            "paul-graham",
            "Paul Graham: Essays",
            "http://www.aaronsw.com/2002/feeds/pgessays.rss",
        )),
        Box::new(AgentAdapter::new(
            "alphasignal-last-email",
            "AlphaSignal Last Email",
            "https://alphasignal.ai/last-email",
        )),
    ]
}

/// Returns the descriptors of every registered source, in registration
/// order, regardless of `enabled`.
pub fn list_sources(sources: &[Box<dyn Adapter>]) -> Vec<SourceDescriptor> {
    sources.iter().map(|s| s.descriptor().clone()).collect()
}

/// Looks up a source's adapter by id.
pub fn get_source<'a>(sources: &'a [Box<dyn Adapter>], source_id: &str) -> Option<&'a dyn Adapter> {
    sources
        .iter()
        .find(|s| s.descriptor().id == source_id)
        .map(|b| b.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_sources_has_unique_ids() {
        let sources = build_sources();
        let mut ids: Vec<&str> = sources.iter().map(|s| s.descriptor().id.as_str()).collect();
        ids.sort();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len(), "duplicate source ids: {ids:?}");
    }

    #[test]
    fn get_source_finds_known_and_rejects_unknown() {
        let sources = build_sources();
        assert!(get_source(&sources, "hn").is_some());
        assert!(get_source(&sources, "does-not-exist").is_none());
    }
}
