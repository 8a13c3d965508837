use std::path::{Path, PathBuf};

/// Every path the store touches, rooted at the resolved data directory.
/// `sources/<id>/{manifest.jsonl,snapshots/,items/}`, with run reports at
/// the data root's top level.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub data_root: PathBuf,
}

impl DataPaths {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into() }
    }

    pub fn source_root(&self, source_id: &str) -> PathBuf {
        self.data_root.join("sources").join(source_id)
    }

    pub fn manifest_path(&self, source_id: &str) -> PathBuf {
        self.source_root(source_id).join("manifest.jsonl")
    }

    pub fn snapshots_dir(&self, source_id: &str) -> PathBuf {
        self.source_root(source_id).join("snapshots")
    }

    pub fn items_dir(&self, source_id: &str) -> PathBuf {
        self.source_root(source_id).join("items")
    }

    pub fn item_dir(&self, source_id: &str, item_id: &str) -> PathBuf {
        self.items_dir(source_id).join(item_id)
    }

    pub fn content_path(&self, source_id: &str, item_id: &str) -> PathBuf {
        self.item_dir(source_id, item_id).join("content.md")
    }

    pub fn meta_path(&self, source_id: &str, item_id: &str) -> PathBuf {
        self.item_dir(source_id, item_id).join("meta.json")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.data_root.join("runs")
    }

    pub fn run_report_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(format!("run-{run_id}.json"))
    }

    pub fn index_db_path(&self) -> PathBuf {
        self.data_root.join("index.sqlite")
    }

    /// Path relative to `data_root`, used when a path is stored in a
    /// manifest entry or `Record` so the data directory can be relocated.
    pub fn relative_to_root<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.data_root).unwrap_or(path)
    }
}
