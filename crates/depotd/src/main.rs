//! depotd — Depot storage daemon.

use anyhow::{Context, Result};

use depot_api::handlers::ApiState;
use depot_api::media::MediaStore;
use depot_api::session::SessionTable;
use depot_api::store::MetaStore;
use depot_core::config::DepotConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = DepotConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = DepotConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        DepotConfig::default()
    });

    if let Some(parent) = config.server.db_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let store = MetaStore::open(&config.server.db_path).with_context(|| {
        format!("failed to open metadata store at {}", config.server.db_path.display())
    })?;
    let media = MediaStore::new(&config.server.media_root).with_context(|| {
        format!("failed to prepare media root at {}", config.server.media_root.display())
    })?;
    tracing::info!(
        db = %config.server.db_path.display(),
        media = %config.server.media_root.display(),
        "stores ready"
    );

    let state = ApiState {
        sessions: SessionTable::new(),
        store,
        media,
    };

    tokio::select! {
        result = depot_api::serve(state, &config.server.listen_addr, config.server.listen_port) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown signal received"),
    }

    Ok(())
}
