use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use harvester_config::{load_config, Config};
use harvester_core::query::ArchiveRange;
use harvester_core::{query, Reporter};
use harvester_registry::{build_sources, get_source, list_sources};
use harvester_store::FsStore;
use harvester_types::{Record, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "harvester", version)]
#[command(about = "Multi-source content harvester: ingest, browse, and query archived sources")]
struct Cli {
    /// Working directory to resolve `.harvester.toml` and the data root from.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch sources and store new items.
    Ingest {
        /// Restrict to a single source id.
        #[arg(long)]
        source: Option<String>,
    },
    /// List the registered sources.
    Sources {
        #[arg(long)]
        json: bool,
    },
    /// Print a stored blog item's content.
    Read {
        source_id: String,
        item_id: String,
        #[arg(long)]
        pager: bool,
    },
    /// Manage the relational query index.
    Sqlite {
        #[command(subcommand)]
        cmd: SqliteCommands,
    },
    /// Query stored records.
    Query {
        #[command(subcommand)]
        cmd: QueryCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SqliteCommands {
    /// Rebuild the index from the filesystem store.
    Rebuild {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum QueryCommands {
    Source {
        source_id: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    Keyword {
        keyword: String,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    Archive {
        #[arg(long)]
        on: Option<String>,
        #[arg(long = "from")]
        start: Option<String>,
        #[arg(long = "to")]
        end: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.dir)?;
    let data_root = config.resolve_data_root(&cli.dir);
    let store = FsStore::new(&data_root);

    match cli.cmd {
        Commands::Ingest { source } => run_ingest(&config, &store, source.as_deref()),
        Commands::Sources { json } => run_sources(json),
        Commands::Read { source_id, item_id, pager } => run_read(&store, &source_id, &item_id, pager),
        Commands::Sqlite { cmd: SqliteCommands::Rebuild { json } } => run_sqlite_rebuild(&store, json),
        Commands::Query { cmd } => run_query(&store, cmd),
    }
}

fn run_ingest(config: &Config, store: &FsStore, source: Option<&str>) -> Result<()> {
    let mut reporter = CliReporter;
    let report = match source {
        Some(id) => harvester_core::ingest_source(id, config, store, &mut reporter)?,
        None => harvester_core::ingest_all(config, store, &mut reporter)?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_sources(as_json: bool) -> Result<()> {
    let sources = build_sources();
    let descriptors = list_sources(&sources);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }
    for source in &descriptors {
        let suffix = if source.enabled { "" } else { " [disabled]" };
        println!("- {} ({}, {}){suffix}", source.id, source.kind, source.transport);
    }
    Ok(())
}

fn run_read(store: &FsStore, source_id: &str, item_id: &str, pager: bool) -> Result<()> {
    let sources = build_sources();
    let source = get_source(&sources, source_id)
        .ok_or_else(|| anyhow::anyhow!("unknown source: {source_id}"))?;
    if source.descriptor().kind != SourceKind::Blog {
        eprintln!("read is only supported for blog sources");
        std::process::exit(2);
    }
    let content = match store.read_content(source_id, item_id) {
        Ok(content) => content,
        Err(_) => {
            eprintln!("content not found: {source_id}/{item_id}");
            std::process::exit(2);
        }
    };
    if pager {
        print_with_pager(&content);
    } else {
        print!("{content}");
    }
    Ok(())
}

fn print_with_pager(content: &str) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let pager = std::env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let Ok(mut child) = Command::new(&pager).stdin(Stdio::piped()).spawn() else {
        print!("{content}");
        return;
    };
    if let Some(stdin) = child.stdin.as_mut() {
        let _ = stdin.write_all(content.as_bytes());
    }
    let _ = child.wait();
}

fn run_sqlite_rebuild(store: &FsStore, as_json: bool) -> Result<()> {
    let sources = build_sources();
    let descriptors = list_sources(&sources);
    let mut all_records = Vec::new();
    for descriptor in &descriptors {
        if !descriptor.enabled {
            continue;
        }
        all_records.extend(store.records_for_source(descriptor)?);
    }

    let path = store.paths().index_db_path();
    let mut index = harvester_store::SqliteIndex::open(&path)?;
    let count = index.rebuild(&all_records)?;

    if as_json {
        let payload = serde_json::json!({ "path": path.display().to_string(), "records": count });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("SQLite index rebuilt at {} with {count} records", path.display());
    }
    Ok(())
}

fn run_query(store: &FsStore, cmd: QueryCommands) -> Result<()> {
    let sources = build_sources();
    match cmd {
        QueryCommands::Source { source_id, limit, json } => {
            let source = get_source(&sources, &source_id)
                .ok_or_else(|| anyhow::anyhow!("unknown source: {source_id}"))?;
            let records = query::query_by_source(store, source.descriptor(), limit)?;
            print_records(store, &records, json)
        }
        QueryCommands::Keyword { keyword, source, limit, json } => {
            let records = query::query_by_keyword(store, &sources, &keyword, source.as_deref(), limit)?;
            print_records(store, &records, json)
        }
        QueryCommands::Archive { on, start, end, source, limit, json } => {
            if on.is_none() && (start.is_none() || end.is_none()) {
                bail!("archive query requires --on, or both --from and --to");
            }
            let range = ArchiveRange { on, start, end };
            let records = query::query_by_archive_date(store, &sources, &range, source.as_deref(), limit)?;
            print_records(store, &records, json)
        }
    }
}

fn print_records(store: &FsStore, records: &[Record], as_json: bool) -> Result<()> {
    if as_json {
        let payload: Vec<serde_json::Value> = records
            .iter()
            .map(|record| {
                let mut value = serde_json::to_value(record).unwrap_or(serde_json::Value::Null);
                if let serde_json::Value::Object(map) = &mut value {
                    map.insert("has_content".to_string(), serde_json::Value::Bool(has_content(store, record)));
                }
                value
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    for record in records {
        let marker = if has_content(store, record) { "* " } else { "  " };
        println!("{marker}{} | {} | {}", record.archived_at, record.source_id, record.title);
        println!("  {}", record.url);
    }
    Ok(())
}

fn has_content(store: &FsStore, record: &Record) -> bool {
    match &record.content_path {
        Some(path) => store.paths().data_root.join(path).exists(),
        None => false,
    }
}
