use harvester_http::FetchContext;
use harvester_types::{AggregationItem, ExtraMap, HarvestError, Item, Result, Scalar, SourceDescriptor, SourceKind, Transport};
use serde_json::Value;

use super::devalue;
use crate::adapter::Adapter;

const RELEASEBOT_URL: &str = "https://releasebot.io/updates/__data.json";
const RELEASEBOT_LIMIT: usize = 10;

/// Releasebot's SvelteKit endpoint ships its payload devalue-encoded inside
/// `nodes[].data`; this adapter finds the node whose decoded root has a
/// `releases` key and maps each release into an [`AggregationItem`].
pub struct ReleasebotAdapter {
    descriptor: SourceDescriptor,
    url: String,
    limit: usize,
}

impl ReleasebotAdapter {
    pub fn new() -> Self {
        Self {
            descriptor: SourceDescriptor {
                id: "releasebot".to_string(),
                name: "Releasebot".to_string(),
                kind: SourceKind::Aggregation,
                transport: Transport::Api,
                enabled: true,
            },
            url: RELEASEBOT_URL.to_string(),
            limit: RELEASEBOT_LIMIT,
        }
    }
}

impl Default for ReleasebotAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for ReleasebotAdapter {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Item>> {
        let payload: Value = ctx.session.get_json(&self.url)?;
        let root = extract_release_root(&payload)
            .ok_or_else(|| HarvestError::Fetch("releasebot data missing releases".to_string()))?;

        let releases = root
            .get("releases")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let items: Vec<Item> = releases
            .iter()
            .take(self.limit)
            .enumerate()
            .filter_map(|(i, release)| map_release(i, release))
            .map(Item::Aggregation)
            .collect();

        if items.is_empty() {
            return Err(HarvestError::Fetch("releasebot list empty".to_string()));
        }

        Ok(items)
    }
}

/// Falls back to a display name derived from a slug when a product carries
/// no `display_name` of its own — `"widget-co"` reads better as
/// `"Widget Co"` than as a bare slug in a title.
fn titleize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_release_root(payload: &Value) -> Option<Value> {
    let nodes = payload.get("nodes")?.as_array()?;
    for node in nodes {
        let Some(data) = node.get("data").and_then(Value::as_array) else {
            continue;
        };
        if data.is_empty() {
            continue;
        }
        let decoded = devalue::decode(data);
        if decoded.get("releases").is_some() {
            return Some(decoded);
        }
    }
    None
}

fn map_release(rank: usize, release: &Value) -> Option<AggregationItem> {
    let empty = Value::Object(Default::default());
    let product = release.get("product").unwrap_or(&empty);
    let vendor = product.get("vendor").unwrap_or(&empty);
    let release_details = release.get("release_details").unwrap_or(&empty);

    let product_name = product
        .get("display_name")
        .or_else(|| vendor.get("display_name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| product.get("slug").and_then(Value::as_str).map(titleize_slug));

    let release_name = release_details
        .get("release_name")
        .or_else(|| release_details.get("release_number"))
        .or_else(|| release.get("slug"))
        .and_then(Value::as_str)
        .unwrap_or("Release");

    let title = match product_name {
        Some(name) => format!("{name} — {release_name}"),
        None => release_name.to_string(),
    };

    let source_url = release
        .get("source")
        .and_then(|s| s.get("source_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let vendor_slug = vendor.get("slug").and_then(Value::as_str).unwrap_or("vendor");
            let product_slug = product.get("slug").and_then(Value::as_str).unwrap_or("product");
            format!("https://releasebot.io/updates/{vendor_slug}/{product_slug}")
        });
    let source_url = harvester_text::canonicalize(&source_url).unwrap_or(source_url);

    let published_at = release
        .get("release_date")
        .or_else(|| release.get("created_at"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let author = vendor.get("display_name").and_then(Value::as_str).map(str::to_string);

    let mut extra = ExtraMap::new();
    if let Some(summary) = release_details.get("release_summary").and_then(Value::as_str) {
        extra.insert("summary".to_string(), Scalar::Str(summary.to_string()));
    }

    Some(AggregationItem {
        title,
        url: source_url,
        published_at,
        author,
        score: None,
        comments_count: None,
        rank: Some(rank as i64 + 1),
        discussion_url: None,
        comments: Vec::new(),
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_release_with_full_product_metadata() {
        let release = json!({
            "product": {"display_name": "Acme Widgets", "slug": "acme"},
            "release_details": {"release_name": "v2.0", "release_summary": "Big release"},
            "source": {"source_url": "https://acme.example/v2"},
            "release_date": "2026-01-01",
        });
        let item = map_release(0, &release).expect("maps");
        assert_eq!(item.title, "Acme Widgets — v2.0");
        assert_eq!(item.url, "https://acme.example/v2");
        assert_eq!(item.extra.get("summary"), Some(&Scalar::Str("Big release".to_string())));
    }

    #[test]
    fn falls_back_to_vendor_slug_url_when_source_missing() {
        let release = json!({
            "product": {"slug": "widget-co"},
            "release_details": {"release_number": "42"},
        });
        let item = map_release(1, &release).expect("maps");
        assert_eq!(item.url, "https://releasebot.io/updates/vendor/widget-co");
        assert_eq!(item.rank, Some(2));
    }

    #[test]
    fn falls_back_to_slug_derived_title_and_url_without_display_name_or_source_url() {
        let release = json!({
            "product": {"slug": "widget", "vendor": {"slug": "corp"}},
            "release_details": {"release_number": "1.0"},
        });
        let item = map_release(0, &release).expect("maps");
        assert_eq!(item.url, "https://releasebot.io/updates/corp/widget");
        assert_eq!(item.title, "Widget — 1.0");
    }

    #[test]
    fn extract_release_root_scans_nodes_for_releases_key() {
        let payload = json!({
            "nodes": [
                {"data": []},
                {"data": [{"releases": 1}, [2], {"title": "x"}]},
            ]
        });
        let root = extract_release_root(&payload).expect("found root");
        assert!(root.get("releases").is_some());
    }
}
