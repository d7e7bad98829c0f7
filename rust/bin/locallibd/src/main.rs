//! `locallibd` is the local library catalog server.
//!
//! Usage:
//!   locallibd [--data-dir <dir>] [--db <file>] [--listen <addr>]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use locallib_core::{Module, ServiceConfig};
use tracing::info;

/// Local library catalog server.
#[derive(Parser, Debug)]
#[command(name = "locallibd", about = "Local library catalog server")]
struct Cli {
    /// Directory for the database file.
    #[arg(long = "data-dir", default_value = "data")]
    data_dir: PathBuf,

    /// Database file (overrides `{data-dir}/catalog.redb`).
    #[arg(long = "db")]
    db: Option<PathBuf>,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = ServiceConfig {
        data_dir: Some(cli.data_dir),
        db_path: cli.db,
        listen: cli.listen,
    };
    if let Some(dir) = &config.data_dir {
        std::fs::create_dir_all(dir)?;
    }

    let db_path = config.resolve_db_path();
    info!("Opening catalog store at {}", db_path.display());
    let kv: Arc<dyn locallib_kv::KVStore> = Arc::new(
        locallib_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );

    let catalog = catalog::CatalogModule::new(kv);
    let app = axum::Router::new().merge(catalog.routes());
    info!("Module {} mounted at /{}", catalog.name(), catalog.name());

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("Catalog server listening on {}", config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
