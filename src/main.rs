//! # valsearch CLI
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `valsearch init` | Create the SQLite database and the full-text table |
//! | `valsearch sync` | Run one ingestion pass now, ignoring the freshness window |
//! | `valsearch search "<query>"` | Search the local index |
//! | `valsearch serve` | Start the HTTP server |
//!
//! Logging is controlled with `RUST_LOG` (default `valsearch=info,tower_http=info`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valsearch::index::RecordIndex;
use valsearch::{config, db, index, ingest, query, server};

/// valsearch: local full-text search over a remote paginated collection.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. The file is optional; built-in defaults apply when it is missing.
#[derive(Parser)]
#[command(name = "valsearch", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./valsearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Run one full sync pass in the foreground.
    Sync,

    /// Search the local index.
    Search {
        /// FTS5 query string.
        query: String,
    },

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "valsearch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            index::SqliteIndex::new(pool.clone()).ensure_schema().await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Sync => {
            ingest::run_sync(&cfg).await?;
        }
        Commands::Search { query: text } => {
            query::run_search(&cfg, &text).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
