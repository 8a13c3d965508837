use feed_rs::parser;
use harvester_http::FetchContext;
use harvester_text::{canonicalize, detect_blocked, html_to_markdown};
use harvester_types::{BlogItem, HarvestError, Item, Result, SourceDescriptor, SourceKind, Transport};

use crate::adapter::Adapter;

/// Generic RSS/Atom feed adapter, used by blog sources and RSS-flavored
/// aggregation sources (e.g. a product-launch feed) alike. `html_to_markdown`
/// is overridable per source for feeds whose bodies need bespoke cleanup;
/// it falls back to the shared converter.
pub struct RssAdapter {
    descriptor: SourceDescriptor,
    feed_url: String,
    limit: Option<usize>,
    html_to_markdown: fn(&str) -> String,
}

impl RssAdapter {
    pub fn new(id: &str, name: &str, feed_url: &str) -> Self {
        Self {
            descriptor: SourceDescriptor {
                id: id.to_string(),
                name: name.to_string(),
                kind: SourceKind::Blog,
                transport: Transport::Rss,
                enabled: true,
            },
            feed_url: feed_url.to_string(),
            limit: None,
            html_to_markdown: html_to_markdown,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_converter(mut self, converter: fn(&str) -> String) -> Self {
        self.html_to_markdown = converter;
        self
    }
}

impl Adapter for RssAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Item>> {
        let bytes = ctx.session.get_bytes(&self.feed_url)?;
        let feed = parser::parse(bytes.as_slice())
            .map_err(|e| HarvestError::Fetch(format!("rss parse error for {}: {e}", self.feed_url)))?;

        let mut items = Vec::new();
        let entries = match self.limit {
            Some(limit) => &feed.entries[..feed.entries.len().min(limit)],
            None => &feed.entries[..],
        };

        for entry in entries {
            let Some(title) = entry.title.as_ref().map(|t| t.content.clone()) else {
                continue;
            };
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                continue;
            };
            let link = canonicalize(&link).unwrap_or(link);

            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc3339());
            let author = entry.authors.first().map(|a| a.name.clone());

            let content_html = entry
                .content
                .as_ref()
                .and_then(|c| c.body.clone())
                .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()));

            let content_markdown = content_html.as_deref().map(self.html_to_markdown);
            if let Some(markdown) = &content_markdown {
                if let Some(pattern) = detect_blocked(markdown) {
                    return Err(HarvestError::BlockedContent(format!("{link}: {pattern}")));
                }
            }
            let summary = entry.summary.as_ref().map(|s| s.content.clone());

            items.push(Item::Blog(BlogItem {
                title,
                url: link,
                published_at,
                author,
                summary,
                content_markdown,
            }));
        }

        if items.is_empty() {
            return Err(HarvestError::Fetch(format!(
                "rss feed empty for {}",
                self.feed_url
            )));
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <item>
      <title>First Post</title>
      <link>https://example.com/first</link>
      <description><![CDATA[<p>Hello world</p>]]></description>
      <pubDate>Tue, 01 Jan 2026 00:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_title_link_and_converts_body() {
        let feed = parser::parse(SAMPLE_FEED.as_bytes()).expect("parse sample feed");
        assert_eq!(feed.entries.len(), 1);
        let entry = &feed.entries[0];
        assert_eq!(entry.title.as_ref().unwrap().content, "First Post");
        assert_eq!(entry.links[0].href, "https://example.com/first");
    }

    fn spawn_feed_server(body: &'static str) -> (tiny_http::Server, String) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr();
        (server, format!("http://{addr}"))
    }

    #[test]
    fn fetch_canonicalizes_the_entry_link() {
        let feed = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\"><channel><title>Example</title>\
             <item><title>Post</title><link>{{URL}}/p/?b=2&amp;a=1</link>\
             <description><![CDATA[<p>Hello world, plenty of words here.</p>]]></description></item>\
             </channel></rss>"
        );
        let (server, url) = spawn_feed_server("");
        let feed_body = feed.replace("{URL}", &url);
        let handle = std::thread::spawn(move || {
            if let Ok(Some(request)) = server.recv_timeout(std::time::Duration::from_secs(5)) {
                let _ = request.respond(tiny_http::Response::from_string(feed_body));
            }
        });

        let adapter = RssAdapter::new("test", "Test", &url);
        let ctx = FetchContext::new(
            harvester_http::Session::with_default_timeout(),
            "20260101-000000".to_string(),
            chrono::Utc::now(),
        );
        let items = adapter.fetch(&ctx).expect("fetch should succeed");
        handle.join().unwrap();

        let Item::Blog(item) = &items[0] else { panic!("expected a blog item") };
        assert_eq!(item.url, format!("{url}/p?a=1&b=2"));
    }

    #[test]
    fn fetch_fails_with_blocked_content_for_an_interstitial_entry() {
        let feed = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\"><channel><title>Example</title>\
             <item><title>Post</title><link>{{URL}}/p</link>\
             <description><![CDATA[<p>Please enable JavaScript and cookies to continue.</p>]]></description></item>\
             </channel></rss>"
        );
        let (server, url) = spawn_feed_server("");
        let feed_body = feed.replace("{URL}", &url);
        let handle = std::thread::spawn(move || {
            if let Ok(Some(request)) = server.recv_timeout(std::time::Duration::from_secs(5)) {
                let _ = request.respond(tiny_http::Response::from_string(feed_body));
            }
        });

        let adapter = RssAdapter::new("test", "Test", &url);
        let ctx = FetchContext::new(
            harvester_http::Session::with_default_timeout(),
            "20260101-000000".to_string(),
            chrono::Utc::now(),
        );
        let err = adapter.fetch(&ctx).expect_err("interstitial body should be rejected");
        handle.join().unwrap();
        assert!(matches!(err, HarvestError::BlockedContent(_)));
    }
}
