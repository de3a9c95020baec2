use catalog_ingest::infrastructure::store::memory::MemoryStore;
use catalog_ingest::infrastructure::store::sqlite::SqliteCatalogStore;
use catalog_ingest::infrastructure::store::CatalogStore;
use catalog_ingest::{AppError, BatchImporter, HttpFetcher, IngestConfig, MediaAcquirer, Result, RunOptions};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Batch catalog import from a delimited export file.
#[derive(Parser, Debug)]
#[command(name = "catalog-ingest", version, about)]
struct Cli {
    /// Source file to ingest.
    source: PathBuf,

    /// Records to process in this run.
    #[arg(long, default_value_t = 25)]
    batch_size: usize,

    /// 1-based data-line offset to start from (header excluded).
    #[arg(long, default_value_t = 1)]
    start_offset: usize,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop cleanly after this many seconds and report the resume offset.
    #[arg(long)]
    max_seconds: Option<u64>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("import failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = IngestConfig::load(cli.config.as_deref())?;

    let store: Arc<dyn CatalogStore> = match &config.database_url {
        Some(url) => Arc::new(SqliteCatalogStore::init(url).await?),
        None => {
            warn!("no database_url configured, using in-memory store; nothing will persist");
            Arc::new(MemoryStore::new())
        }
    };

    let fetcher = HttpFetcher::new(&config)?;
    let acquirer = MediaAcquirer::from_config(fetcher, &config);
    let importer = BatchImporter::new(store, acquirer, config);

    let opts = RunOptions {
        source_path: cli.source,
        batch_size: cli.batch_size,
        start_offset: cli.start_offset,
        deadline: cli
            .max_seconds
            .map(|secs| Instant::now() + Duration::from_secs(secs)),
    };

    let summary = importer.run(&opts).await?;
    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|e| AppError::Internal(format!("cannot render summary: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
