//! trail-ingest - trail dataset ingestion tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use trail_common::logging::init_logging;
use trail_ingest::config::{load_dotenv, log_config, IngestConfig};
use trail_ingest::correction::fix_swapped;
use trail_ingest::orchestrator::IngestOrchestrator;
use trail_ingest::report::StatsReporter;
use trail_ingest::store::{MemoryRouteStore, PgRouteStore, RouteStore};

#[derive(Parser, Debug)]
#[command(name = "trail-ingest")]
#[command(author, version, about = "Hiking trail ingestion and normalization tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest every configured source into the route store
    Run {
        /// Root directory holding one subdirectory per source
        #[arg(short, long, env = "TRAIL_DATA_ROOT")]
        root: Option<PathBuf>,

        /// Ingest into an in-memory store instead of the database
        #[arg(long)]
        dry_run: bool,

        /// Only ingest these sources (comma separated)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,

        /// Write run counters and the final report as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,
    },

    /// Print stored route counts by category and provider
    Stats,

    /// Rewrite stored geometries that were saved as (lat, lon)
    FixSwapped {
        /// Only report what would change
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv(None);
    let cli = Cli::parse();

    let _log_guard = init_logging(&log_config(cli.verbose)?)?;

    let mut config = IngestConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.db.url = url;
    }
    let profile = config.profile()?;

    match cli.command {
        Command::Run {
            root,
            dry_run,
            sources,
            report_json,
        } => {
            let data_root = root.unwrap_or_else(|| config.data_root.clone());

            let store: Arc<dyn RouteStore> = if dry_run {
                info!("Dry run: routes are kept in memory");
                Arc::new(MemoryRouteStore::new())
            } else {
                Arc::new(connect(&config).await?)
            };

            let mut profile = profile;
            profile.sources = profile.catalog().select(&sources)?.sources;

            let mut orchestrator = IngestOrchestrator::from_profile(store, data_root, &profile)?;
            let stats = orchestrator.run().await?;

            if let Some(path) = report_json {
                let json = serde_json::to_string_pretty(&stats)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                info!(path = %path.display(), "Run report written");
            }
        },
        Command::Stats => {
            let store = connect(&config).await?;
            StatsReporter::new(&store).report().await;
        },
        Command::FixSwapped { dry_run } => {
            let store = connect(&config).await?;
            fix_swapped(&store, &profile.bounds, dry_run).await?;
        },
    }

    info!("Done");
    Ok(())
}

async fn connect(config: &IngestConfig) -> Result<PgRouteStore> {
    PgRouteStore::connect(&config.db)
        .await
        .context("Failed to connect to the route store")
}
