use anyhow::{bail, Result};
use chrono::NaiveDate;
use harvester_registry::Adapter;
use harvester_store::FsStore;
use harvester_types::{parse_date, Record, SourceDescriptor};

/// Every query prefers the relational index when `index.sqlite` exists;
/// otherwise it falls back to scanning the filesystem store directly. Either
/// path returns records sorted by `archived_at` descending.
pub fn query_by_source(store: &FsStore, source: &SourceDescriptor, limit: Option<usize>) -> Result<Vec<Record>> {
    let mut records = if let Some(index) = open_index(store)? {
        index.query_by_source(&source.id)?
    } else {
        let mut records = store.records_for_source(source)?;
        sort_desc(&mut records);
        records
    };
    apply_limit(&mut records, limit);
    Ok(records)
}

pub fn query_by_keyword(
    store: &FsStore,
    sources: &[Box<dyn Adapter>],
    keyword: &str,
    source_id: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Record>> {
    let mut records = if let Some(index) = open_index(store)? {
        index.query_by_keyword(keyword)?
    } else {
        let mut records = Vec::new();
        for source in sources.iter().map(|s| s.descriptor()) {
            records.extend(store.records_for_source(source)?);
        }
        let needle = keyword.to_lowercase();
        records.retain(|r| r.title.to_lowercase().contains(&needle));
        sort_desc(&mut records);
        records
    };
    if let Some(source_id) = source_id {
        records.retain(|r| r.source_id == source_id);
    }
    apply_limit(&mut records, limit);
    Ok(records)
}

pub struct ArchiveRange {
    pub on: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn query_by_archive_date(
    store: &FsStore,
    sources: &[Box<dyn Adapter>],
    range: &ArchiveRange,
    source_id: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Record>> {
    let (start, end) = resolve_range(range)?;

    let mut records = if let Some(index) = open_index(store)? {
        index.query_by_archive_date(start, end)?
    } else {
        let mut records = Vec::new();
        for source in sources.iter().map(|s| s.descriptor()) {
            records.extend(store.records_for_source(source)?);
        }
        records.retain(|r| {
            parse_date(&r.archived_at).is_some_and(|d| d >= start && d <= end)
        });
        sort_desc(&mut records);
        records
    };
    if let Some(source_id) = source_id {
        records.retain(|r| r.source_id == source_id);
    }
    apply_limit(&mut records, limit);
    Ok(records)
}

fn resolve_range(range: &ArchiveRange) -> Result<(NaiveDate, NaiveDate)> {
    if let Some(on) = &range.on {
        let date = parse_date(on).ok_or_else(|| anyhow::anyhow!("invalid date: {on}"))?;
        return Ok((date, date));
    }
    match (&range.start, &range.end) {
        (Some(start), Some(end)) => {
            let start = parse_date(start).ok_or_else(|| anyhow::anyhow!("invalid date: {start}"))?;
            let end = parse_date(end).ok_or_else(|| anyhow::anyhow!("invalid date: {end}"))?;
            Ok((start, end))
        }
        _ => bail!("archive date range requires both --from and --to, or --on"),
    }
}

fn sort_desc(records: &mut [Record]) {
    records.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
}

fn apply_limit(records: &mut Vec<Record>, limit: Option<usize>) {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
}

fn open_index(store: &FsStore) -> Result<Option<harvester_store::SqliteIndex>> {
    let path = store.paths().index_db_path();
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(harvester_store::SqliteIndex::open(&path)?))
}
