use std::collections::HashSet;
use std::path::PathBuf;

use harvester_types::{
    iso_date_today, iso_now, AggregationItem, BlogItem, ExtraMap, HarvestError, Record, Result, Scalar,
    SourceDescriptor, SourceKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::paths::DataPaths;
use crate::placeholder::looks_like_placeholder;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestRow {
    id: String,
    source_id: String,
    title: String,
    url: String,
    published_at: Option<String>,
    archived_at: String,
    author: Option<String>,
    summary: Option<String>,
    content_path: String,
}

/// Filesystem-backed storage for manifests, item content, daily snapshots,
/// and run reports. A thin layer: every write is one file write, every read
/// one file read — no in-process caching, so two processes can share a data
/// root safely as long as they don't race the same source.
pub struct FsStore {
    paths: DataPaths,
}

impl FsStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self { paths: DataPaths::new(data_root) }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn ensure_dirs(&self, source_id: &str) -> Result<()> {
        std::fs::create_dir_all(self.paths.snapshots_dir(source_id))?;
        std::fs::create_dir_all(self.paths.items_dir(source_id))?;
        Ok(())
    }

    fn load_manifest(&self, source_id: &str) -> Result<Vec<ManifestRow>> {
        let path = self.paths.manifest_path(source_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        let mut rows = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(serde_json::from_str(line)?);
        }
        Ok(rows)
    }

    pub fn existing_urls(&self, source_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .load_manifest(source_id)?
            .into_iter()
            .map(|row| row.url)
            .collect())
    }

    fn append_manifest(&self, source_id: &str, rows: &[ManifestRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let path = self.paths.manifest_path(source_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        for row in rows {
            let mut line = serde_json::to_string(row)?;
            line.push('\n');
            file.write_all(line.as_bytes())?;
        }
        file.flush()?;
        Ok(())
    }

    /// Persists new blog items: each new `url` gets an item directory with
    /// `content.md` + `meta.json` and one manifest row. A url that already
    /// has content is skipped entirely *unless* its current content looks
    /// like a placeholder, in which case the file is rewritten in place but
    /// no new manifest row is appended (the refill rule).
    pub fn save_blog_items(&self, source: &SourceDescriptor, items: &[BlogItem]) -> Result<Vec<Record>> {
        self.ensure_dirs(&source.id)?;
        let archived_at = iso_now();
        let existing = self.existing_urls(&source.id)?;
        let manifest = self.load_manifest(&source.id)?;

        let mut stored = Vec::new();
        let mut new_rows = Vec::new();

        for item in items {
            let item_id = harvester_text::item_id(&item.title, &item.url);
            let content = item.content_markdown.clone().or_else(|| item.summary.clone()).unwrap_or_default();

            if existing.contains(&item.url) {
                if let Some(existing_row) = manifest.iter().find(|row| row.url == item.url) {
                    let content_path = self.paths.data_root.join(&existing_row.content_path);
                    let current = std::fs::read_to_string(&content_path).unwrap_or_default();
                    if current.trim().is_empty() || looks_like_placeholder(&current) {
                        std::fs::write(&content_path, &content)?;
                    }
                }
                continue;
            }

            let item_dir = self.paths.item_dir(&source.id, &item_id);
            std::fs::create_dir_all(&item_dir)?;
            let content_path = self.paths.content_path(&source.id, &item_id);
            std::fs::write(&content_path, &content)?;

            let relative_content_path = self
                .paths
                .relative_to_root(&content_path)
                .to_string_lossy()
                .replace('\\', "/");

            let meta = ManifestRow {
                id: item_id.clone(),
                source_id: source.id.clone(),
                title: item.title.clone(),
                url: item.url.clone(),
                published_at: item.published_at.clone(),
                archived_at: archived_at.clone(),
                author: item.author.clone(),
                summary: item.summary.clone(),
                content_path: relative_content_path.clone(),
            };
            std::fs::write(self.paths.meta_path(&source.id, &item_id), serde_json::to_string_pretty(&meta)?)?;
            new_rows.push(meta);

            stored.push(Record {
                source_id: source.id.clone(),
                source_name: source.name.clone(),
                kind: source.kind,
                title: item.title.clone(),
                url: item.url.clone(),
                archived_at: archived_at.clone(),
                published_at: item.published_at.clone(),
                author: item.author.clone(),
                snapshot_date: None,
                rank: None,
                comments_count: None,
                score: None,
                extra: ExtraMap::new(),
                item_id: Some(item_id),
                content_path: Some(relative_content_path),
            });
        }

        self.append_manifest(&source.id, &new_rows)?;
        Ok(stored)
    }

    /// Overwrites (not appends) today's snapshot file for an aggregation
    /// source — at most one snapshot per UTC calendar date survives.
    pub fn save_snapshot(&self, source: &SourceDescriptor, items: &[AggregationItem]) -> Result<PathBuf> {
        self.ensure_dirs(&source.id)?;
        let snapshot_date = iso_date_today();
        let path = self.paths.snapshots_dir(&source.id).join(format!("{snapshot_date}.json"));

        let payload = serde_json::json!({
            "source_id": source.id,
            "source_name": source.name,
            "archived_at": snapshot_date,
            "generated_at": iso_now(),
            "items": items,
        });
        std::fs::write(&path, serde_json::to_string_pretty(&payload)?)?;
        Ok(path)
    }

    /// Reads every snapshot for a source, newest date first (filename sort,
    /// reversed — `YYYY-MM-DD.json` sorts lexicographically by date).
    pub fn iter_snapshot_records(&self, source: &SourceDescriptor) -> Result<Vec<Record>> {
        let dir = self.paths.snapshots_dir(&source.id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        paths.reverse();

        let mut records = Vec::new();
        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let payload: Value = serde_json::from_str(&content)?;
            let snapshot_date = payload.get("archived_at").and_then(Value::as_str).unwrap_or_default().to_string();
            let items = payload.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
            for item in items {
                records.push(Record {
                    source_id: source.id.clone(),
                    source_name: source.name.clone(),
                    kind: source.kind,
                    title: item.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
                    url: item.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
                    archived_at: snapshot_date.clone(),
                    published_at: item.get("published_at").and_then(Value::as_str).map(str::to_string),
                    author: item.get("author").and_then(Value::as_str).map(str::to_string),
                    snapshot_date: Some(snapshot_date.clone()),
                    rank: item.get("rank").and_then(Value::as_i64),
                    comments_count: item.get("comments_count").and_then(Value::as_i64),
                    score: item.get("score").and_then(Value::as_i64),
                    extra: extra_from_value(item.get("extra")),
                    item_id: None,
                    content_path: None,
                });
            }
        }
        Ok(records)
    }

    /// Blog sources are flattened from the manifest; aggregation sources
    /// from their snapshots, newest first.
    pub fn records_for_source(&self, source: &SourceDescriptor) -> Result<Vec<Record>> {
        if source.kind == SourceKind::Aggregation {
            return self.iter_snapshot_records(source);
        }
        let rows = self.load_manifest(&source.id)?;
        Ok(rows
            .into_iter()
            .map(|row| Record {
                source_id: source.id.clone(),
                source_name: source.name.clone(),
                kind: source.kind,
                title: row.title,
                url: row.url,
                archived_at: row.archived_at,
                published_at: row.published_at,
                author: row.author,
                snapshot_date: None,
                rank: None,
                comments_count: None,
                score: None,
                extra: ExtraMap::new(),
                item_id: Some(row.id),
                content_path: Some(row.content_path),
            })
            .collect())
    }

    pub fn record_run(&self, run_id: &str, payload: &Value) -> Result<PathBuf> {
        std::fs::create_dir_all(self.paths.runs_dir())?;
        let path = self.paths.run_report_path(run_id);
        std::fs::write(&path, serde_json::to_string_pretty(payload)?)?;
        Ok(path)
    }

    pub fn read_content(&self, source_id: &str, item_id: &str) -> Result<String> {
        let path = self.paths.content_path(source_id, item_id);
        std::fs::read_to_string(&path).map_err(|e| {
            HarvestError::Io(format!("reading {}: {e}", path.display()))
        })
    }
}

fn extra_from_value(value: Option<&Value>) -> ExtraMap {
    let mut map = ExtraMap::new();
    let Some(Value::Object(obj)) = value else {
        return map;
    };
    for (k, v) in obj {
        let scalar = match v {
            Value::String(s) => Scalar::Str(s.clone()),
            Value::Number(n) => n.as_i64().map(Scalar::Int).unwrap_or(Scalar::Null),
            _ => Scalar::Null,
        };
        map.insert(k.clone(), scalar);
    }
    map
}
