use chrono::NaiveDate;
use harvester_types::{Record, Result, Scalar, SourceKind};
use rusqlite::{params, Connection, OptionalExtension};

/// Relational mirror of the filesystem store, rebuilt on demand. Primary key
/// is [`harvester_text::record_id`] — stable across rebuilds as long as
/// `source_id`, `archived_at`, and `url` don't change, so re-running a
/// rebuild is an upsert, not a wipe-and-reinsert.
pub struct SqliteIndex {
    conn: Connection,
}

const SCHEMA_COLUMNS: &[(&str, &str)] = &[
    ("id", "TEXT PRIMARY KEY"),
    ("source_id", "TEXT NOT NULL"),
    ("source_name", "TEXT NOT NULL"),
    ("kind", "TEXT NOT NULL"),
    ("title", "TEXT NOT NULL"),
    ("url", "TEXT NOT NULL"),
    ("archived_at", "TEXT NOT NULL"),
    ("archived_date", "TEXT NOT NULL"),
    ("published_at", "TEXT"),
    ("author", "TEXT"),
    ("snapshot_date", "TEXT"),
    ("item_id", "TEXT"),
    ("content_path", "TEXT"),
    ("rank", "INTEGER"),
    ("comments_count", "INTEGER"),
    ("score", "INTEGER"),
    ("extra_json", "TEXT"),
];

impl SqliteIndex {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| harvester_types::HarvestError::Io(e.to_string()))?;
        let index = Self { conn };
        index.ensure_schema()?;
        Ok(index)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| harvester_types::HarvestError::Io(e.to_string()))?;
        let index = Self { conn };
        index.ensure_schema()?;
        Ok(index)
    }

    fn ensure_schema(&self) -> Result<()> {
        let columns = SCHEMA_COLUMNS
            .iter()
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute(&format!("CREATE TABLE IF NOT EXISTS records ({columns})"), [])
            .map_err(io_err)?;
        self.ensure_columns()?;
        self.conn
            .execute("CREATE INDEX IF NOT EXISTS idx_records_source_id ON records(source_id)", [])
            .map_err(io_err)?;
        self.conn
            .execute("CREATE INDEX IF NOT EXISTS idx_records_archived_date ON records(archived_date)", [])
            .map_err(io_err)?;
        self.conn
            .execute("CREATE INDEX IF NOT EXISTS idx_records_title ON records(title)", [])
            .map_err(io_err)?;
        Ok(())
    }

    /// Adds any column present in [`SCHEMA_COLUMNS`] but missing from an
    /// already-created table, so an older `index.sqlite` widens in place
    /// instead of needing a manual migration.
    fn ensure_columns(&self) -> Result<()> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(records)").map_err(io_err)?;
        let existing: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(io_err)?
            .filter_map(|r| r.ok())
            .collect();
        for (name, ty) in SCHEMA_COLUMNS {
            if !existing.iter().any(|c| c == name) {
                self.conn
                    .execute(&format!("ALTER TABLE records ADD COLUMN {name} {ty}"), [])
                    .map_err(io_err)?;
            }
        }
        Ok(())
    }

    /// Drops every row and reinserts the full record set handed in, source
    /// by source. Used for a cold rebuild (`sqlite rebuild` CLI command).
    pub fn rebuild(&mut self, all_records: &[Record]) -> Result<usize> {
        let tx = self.conn.transaction().map_err(io_err)?;
        tx.execute("DELETE FROM records", []).map_err(io_err)?;
        let mut count = 0;
        for record in all_records {
            insert_record(&tx, record)?;
            count += 1;
        }
        tx.commit().map_err(io_err)?;
        Ok(count)
    }

    /// Inserts or replaces the given records without touching the rest of
    /// the table — the path taken after each ingest run.
    pub fn upsert_records(&mut self, records: &[Record]) -> Result<usize> {
        let tx = self.conn.transaction().map_err(io_err)?;
        let mut count = 0;
        for record in records {
            insert_record(&tx, record)?;
            count += 1;
        }
        tx.commit().map_err(io_err)?;
        Ok(count)
    }

    pub fn query_by_source(&self, source_id: &str) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM records WHERE source_id = ?1 ORDER BY archived_at DESC")
            .map_err(io_err)?;
        let rows = stmt
            .query_map(params![source_id], row_to_record)
            .map_err(io_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(io_err)?;
        Ok(rows)
    }

    pub fn query_by_keyword(&self, keyword: &str) -> Result<Vec<Record>> {
        let pattern = format!("%{keyword}%");
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM records WHERE title LIKE ?1 COLLATE NOCASE ORDER BY archived_at DESC")
            .map_err(io_err)?;
        let rows = stmt
            .query_map(params![pattern], row_to_record)
            .map_err(io_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(io_err)?;
        Ok(rows)
    }

    pub fn query_by_archive_date(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM records WHERE archived_date BETWEEN ?1 AND ?2 ORDER BY archived_date DESC")
            .map_err(io_err)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], row_to_record)
            .map_err(io_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(io_err)?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .optional()
            .map_err(io_err)
            .map(|v: Option<i64>| v.unwrap_or(0))
    }
}

fn insert_record(conn: &Connection, record: &Record) -> Result<()> {
    let id = harvester_text::record_id(&record.source_id, &record.archived_at, &record.url);
    let archived_date = archive_date(&record.archived_at);
    let kind = match record.kind {
        SourceKind::Aggregation => "aggregation",
        SourceKind::Blog => "blog",
    };
    let extra_json = serde_json::to_string(&record.extra).unwrap_or_else(|_| "{}".to_string());

    conn.execute(
        "INSERT OR REPLACE INTO records (
            id, source_id, source_name, kind, title, url, archived_at, archived_date,
            published_at, author, snapshot_date, item_id, content_path, rank,
            comments_count, score, extra_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            id,
            record.source_id,
            record.source_name,
            kind,
            record.title,
            record.url,
            record.archived_at,
            archived_date,
            record.published_at,
            record.author,
            record.snapshot_date,
            record.item_id,
            record.content_path,
            record.rank,
            record.comments_count,
            record.score,
            extra_json,
        ],
    )
    .map_err(io_err)?;
    Ok(())
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let kind_str: String = row.get("kind")?;
    let kind = if kind_str == "aggregation" { SourceKind::Aggregation } else { SourceKind::Blog };
    let extra_json: Option<String> = row.get("extra_json")?;
    let extra = extra_json
        .and_then(|s| serde_json::from_str::<std::collections::BTreeMap<String, Scalar>>(&s).ok())
        .unwrap_or_default();

    Ok(Record {
        source_id: row.get("source_id")?,
        source_name: row.get("source_name")?,
        kind,
        title: row.get("title")?,
        url: row.get("url")?,
        archived_at: row.get("archived_at")?,
        published_at: row.get("published_at")?,
        author: row.get("author")?,
        snapshot_date: row.get("snapshot_date")?,
        rank: row.get("rank")?,
        comments_count: row.get("comments_count")?,
        score: row.get("score")?,
        extra,
        item_id: row.get("item_id")?,
        content_path: row.get("content_path")?,
    })
}

/// Derives the `YYYY-MM-DD` date bucket from an RFC 3339 `archived_at`
/// timestamp by slicing the first 10 characters, matching the original's
/// plain string slice rather than a full datetime parse.
fn archive_date(archived_at: &str) -> String {
    archived_at.chars().take(10).collect()
}

fn io_err(err: rusqlite::Error) -> harvester_types::HarvestError {
    harvester_types::HarvestError::Io(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_types::ExtraMap;

    fn sample_record(source_id: &str, title: &str, archived_at: &str) -> Record {
        Record {
            source_id: source_id.to_string(),
            source_name: "Test Source".to_string(),
            kind: SourceKind::Blog,
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            archived_at: archived_at.to_string(),
            published_at: None,
            author: None,
            snapshot_date: None,
            rank: None,
            comments_count: None,
            score: None,
            extra: ExtraMap::new(),
            item_id: Some(format!("{title}-id")),
            content_path: Some(format!("sources/{source_id}/items/{title}-id/content.md")),
        }
    }

    #[test]
    fn rebuild_inserts_all_records() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        let records = vec![
            sample_record("hn", "First Post", "2026-01-01T00:00:00+00:00"),
            sample_record("hn", "Second Post", "2026-01-02T00:00:00+00:00"),
        ];
        let inserted = index.rebuild(&records).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(index.count().unwrap(), 2);
    }

    #[test]
    fn upsert_is_idempotent_on_same_identity() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        let record = sample_record("hn", "First Post", "2026-01-01T00:00:00+00:00");
        index.upsert_records(&[record.clone()]).unwrap();
        index.upsert_records(&[record]).unwrap();
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn query_by_source_filters_correctly() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        index
            .rebuild(&[
                sample_record("hn", "HN Post", "2026-01-01T00:00:00+00:00"),
                sample_record("lobsters", "Lobsters Post", "2026-01-01T00:00:00+00:00"),
            ])
            .unwrap();
        let results = index.query_by_source("hn").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "HN Post");
    }

    #[test]
    fn query_by_keyword_is_case_insensitive() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        index.rebuild(&[sample_record("hn", "Rust Is Great", "2026-01-01T00:00:00+00:00")]).unwrap();
        let results = index.query_by_keyword("rust").unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn query_by_archive_date_filters_range() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        index
            .rebuild(&[
                sample_record("hn", "Old", "2026-01-01T00:00:00+00:00"),
                sample_record("hn", "New", "2026-02-01T00:00:00+00:00"),
            ])
            .unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let results = index.query_by_archive_date(start, end).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "New");
    }
}
