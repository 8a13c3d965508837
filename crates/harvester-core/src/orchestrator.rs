use anyhow::{anyhow, Result};
use chrono::Utc;
use harvester_config::Config;
use harvester_http::{FetchContext, Session};
use harvester_registry::{build_sources, get_source, Adapter};
use harvester_store::FsStore;
use harvester_types::{iso_now, run_id_now, HarvestError, Item, SourceKind};
use serde::Serialize;

use crate::reporter::Reporter;

#[derive(Debug, Clone, Serialize)]
pub struct SourceSuccess {
    pub source_id: String,
    pub stored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: String,
    pub sources: Vec<String>,
    pub successes: Vec<SourceSuccess>,
    pub failures: Vec<SourceFailure>,
    pub finished_at: String,
}

/// Runs every enabled source in registration order.
pub fn ingest_all(config: &Config, store: &FsStore, reporter: &mut dyn Reporter) -> Result<RunReport> {
    let all = build_sources();
    let enabled: Vec<&dyn Adapter> = all
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !config.is_source_disabled(&s.descriptor().id))
        .collect();
    run_ingest(config, store, &enabled, reporter)
}

/// Runs exactly one source, regardless of whether it's disabled in config —
/// an explicit `--source` request overrides the disabled list.
pub fn ingest_source(
    source_id: &str,
    config: &Config,
    store: &FsStore,
    reporter: &mut dyn Reporter,
) -> Result<RunReport> {
    let all = build_sources();
    let source = get_source(&all, source_id)
        .ok_or_else(|| HarvestError::UnknownSource(source_id.to_string()))?;
    run_ingest(config, store, &[source], reporter)
}

fn run_ingest(
    config: &Config,
    store: &FsStore,
    sources: &[&dyn Adapter],
    reporter: &mut dyn Reporter,
) -> Result<RunReport> {
    let run_id = run_id_now();
    let started_at = iso_now();
    let session = Session::new(config.http_timeout(), config.retry.clone());
    let ctx = FetchContext::new(session, run_id.clone(), Utc::now());

    let index_path = store.paths().index_db_path();
    let mut index = if index_path.exists() {
        harvester_store::SqliteIndex::open(&index_path).ok()
    } else {
        None
    };

    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for source in sources {
        let descriptor = source.descriptor();

        if !source.is_available() {
            reporter.warn(&format!("{}: source unavailable, skipping", descriptor.id));
            failures.push(SourceFailure {
                source_id: descriptor.id.clone(),
                error: "source unavailable".to_string(),
            });
            continue;
        }

        reporter.info(&format!("fetching {}", descriptor.id));

        let outcome = fetch_and_store(source, &ctx, store, &mut index);
        match outcome {
            Ok(success) => successes.push(success),
            Err(err) => {
                reporter.warn(&format!("{}: {err}", descriptor.id));
                failures.push(SourceFailure { source_id: descriptor.id.clone(), error: err.to_string() });
            }
        }
    }

    let report = RunReport {
        run_id: run_id.clone(),
        started_at,
        sources: sources.iter().map(|s| s.descriptor().id.clone()).collect(),
        successes,
        failures,
        finished_at: iso_now(),
    };

    let payload = serde_json::to_value(&report)?;
    store.record_run(&run_id, &payload)?;
    Ok(report)
}

fn fetch_and_store(
    source: &dyn Adapter,
    ctx: &FetchContext,
    store: &FsStore,
    index: &mut Option<harvester_store::SqliteIndex>,
) -> Result<SourceSuccess> {
    let descriptor = source.descriptor();
    let items = source.fetch(ctx)?;
    if items.is_empty() {
        return Err(anyhow!(HarvestError::Fetch("no items returned".to_string())));
    }

    match descriptor.kind {
        SourceKind::Aggregation => {
            let aggregation_items: Vec<_> = items
                .iter()
                .filter_map(Item::as_aggregation)
                .cloned()
                .collect();
            if aggregation_items.len() != items.len() {
                return Err(anyhow!(HarvestError::Fetch("non-aggregation item returned for aggregation source".to_string())));
            }
            store.save_snapshot(descriptor, &aggregation_items)?;
            if let Some(index) = index {
                let records = store.iter_snapshot_records(descriptor)?;
                index.upsert_records(&records)?;
            }
            Ok(SourceSuccess { source_id: descriptor.id.clone(), stored: aggregation_items.len(), fetched: None })
        }
        SourceKind::Blog => {
            let blog_items: Vec<_> = items.iter().filter_map(Item::as_blog).cloned().collect();
            if blog_items.len() != items.len() {
                return Err(anyhow!(HarvestError::Fetch("non-blog item returned for blog source".to_string())));
            }
            let stored = store.save_blog_items(descriptor, &blog_items)?;
            if let Some(index) = index {
                if !stored.is_empty() {
                    index.upsert_records(&stored)?;
                }
            }
            Ok(SourceSuccess { source_id: descriptor.id.clone(), stored: stored.len(), fetched: Some(blog_items.len()) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_config::Config;
    use tempfile::tempdir;

    #[test]
    fn ingest_source_rejects_unknown_id() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let config = Config::default();
        let mut reporter = crate::reporter::NullReporter;
        let result = ingest_source("does-not-exist", &config, &store, &mut reporter);
        assert!(result.is_err());
    }

    struct UnavailableAdapter {
        descriptor: harvester_types::SourceDescriptor,
    }

    impl Adapter for UnavailableAdapter {
        fn descriptor(&self) -> &harvester_types::SourceDescriptor {
            &self.descriptor
        }

        fn fetch(&self, _ctx: &FetchContext) -> std::result::Result<Vec<Item>, HarvestError> {
            panic!("fetch must not be called on an unavailable source");
        }

        fn is_available(&self) -> bool {
            false
        }
    }

    #[test]
    fn run_ingest_skips_unavailable_sources_without_fetching() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let config = Config::default();
        let mut reporter = crate::reporter::NullReporter;
        let adapter = UnavailableAdapter {
            descriptor: harvester_types::SourceDescriptor {
                id: "unavailable".to_string(),
                name: "Unavailable".to_string(),
                kind: SourceKind::Blog,
                transport: harvester_types::Transport::Agent,
                enabled: true,
            },
        };

        let report = run_ingest(&config, &store, &[&adapter], &mut reporter).expect("run should complete");
        assert!(report.successes.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source_id, "unavailable");
    }
}
