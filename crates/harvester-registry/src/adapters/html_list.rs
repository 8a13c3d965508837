use harvester_http::FetchContext;
use harvester_types::{AggregationItem, HarvestError, Item, Result, SourceDescriptor, SourceKind, Transport};
use scraper::{Html, Selector};
use url::Url;

/// CSS-selector driven listing scrape, for aggregation sources with no
/// feed or JSON API — each matched node yields one ranked item. `base_url`
/// resolves relative `href`s found in `link_selector`.
pub struct HtmlListAdapter {
    descriptor: SourceDescriptor,
    page_url: String,
    base_url: String,
    item_selector: String,
    title_selector: String,
    link_selector: String,
    limit: usize,
    fetch_detail: bool,
}

impl HtmlListAdapter {
    pub fn new(
        id: &str,
        name: &str,
        page_url: &str,
        item_selector: &str,
        title_selector: &str,
        link_selector: &str,
        limit: usize,
    ) -> Self {
        Self {
            descriptor: SourceDescriptor {
                id: id.to_string(),
                name: name.to_string(),
                kind: SourceKind::Aggregation,
                transport: Transport::Html,
                enabled: true,
            },
            page_url: page_url.to_string(),
            base_url: page_url.to_string(),
            item_selector: item_selector.to_string(),
            title_selector: title_selector.to_string(),
            link_selector: link_selector.to_string(),
            limit,
            fetch_detail: false,
        }
    }

    /// Enables a second GET per listing entry to extract the detail page's
    /// main content into `extra["content_markdown"]`. Off by default since
    /// most listing sources only need title/link.
    pub fn with_detail_fetch(mut self) -> Self {
        self.fetch_detail = true;
        self
    }
}

impl crate::adapter::Adapter for HtmlListAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Item>> {
        let body = ctx.session.get_text(&self.page_url)?;
        let document = Html::parse_document(&body);

        let item_sel = Selector::parse(&self.item_selector)
            .map_err(|e| HarvestError::Fetch(format!("bad item selector: {e:?}")))?;
        let title_sel = Selector::parse(&self.title_selector)
            .map_err(|e| HarvestError::Fetch(format!("bad title selector: {e:?}")))?;
        let link_sel = Selector::parse(&self.link_selector)
            .map_err(|e| HarvestError::Fetch(format!("bad link selector: {e:?}")))?;

        let base = Url::parse(&self.base_url).ok();
        let mut seen_urls = std::collections::HashSet::new();
        let mut items = Vec::new();

        for (rank, node) in document.select(&item_sel).enumerate() {
            if items.len() >= self.limit {
                break;
            }
            let Some(title_el) = node.select(&title_sel).next() else {
                continue;
            };
            let title: String = title_el.text().collect::<Vec<_>>().join("").trim().to_string();
            if title.is_empty() {
                continue;
            }
            let Some(href) = node
                .select(&link_sel)
                .next()
                .and_then(|el| el.value().attr("href"))
            else {
                continue;
            };

            let resolved = match &base {
                Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };
            let resolved = harvester_text::canonicalize(&resolved).unwrap_or(resolved);

            if !seen_urls.insert(resolved.clone()) {
                continue;
            }

            let mut extra = harvester_types::ExtraMap::new();
            if self.fetch_detail {
                if let Ok(detail_html) = ctx.session.get_text(&resolved) {
                    if let Ok(markdown) = harvester_text::extract_main_content(&detail_html) {
                        extra.insert("content_markdown".to_string(), harvester_types::Scalar::Str(markdown));
                    }
                }
            }

            items.push(Item::Aggregation(AggregationItem {
                title,
                url: resolved,
                published_at: None,
                author: None,
                score: None,
                comments_count: None,
                rank: Some(rank as i64 + 1),
                discussion_url: None,
                comments: Vec::new(),
                extra,
            }));
        }

        if items.is_empty() {
            return Err(HarvestError::Fetch(format!("{} listing empty", self.descriptor.id)));
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_repeated_links_in_listing() {
        let html = r#"
            <ul>
              <li class="entry"><a class="title" href="/a">First</a></li>
              <li class="entry"><a class="title" href="/a">First (dup)</a></li>
              <li class="entry"><a class="title" href="/b">Second</a></li>
            </ul>
        "#;
        let document = Html::parse_document(html);
        let item_sel = Selector::parse("li.entry").unwrap();
        let title_sel = Selector::parse("a.title").unwrap();
        let link_sel = Selector::parse("a.title").unwrap();

        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for node in document.select(&item_sel) {
            let href = node.select(&link_sel).next().unwrap().value().attr("href").unwrap();
            if seen.insert(href.to_string()) {
                count += 1;
            }
            let _ = node.select(&title_sel).next();
        }
        assert_eq!(count, 2);
    }
}
