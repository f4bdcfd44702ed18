//! Binary entrypoint for the Vigil API server.
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vigil_api::{run, AppState};
use vigil_core::{EngineConfig, InMemoryLocationDirectory};
use vigil_store::MemoryStore;
use vigil_workflow::{EngineMetrics, ReviewService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Default listen address can be overridden with VIGIL_ADDR
    let addr = std::env::var("VIGIL_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());

    let config = match std::env::var("VIGIL_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading engine config from {}", path))?,
        Err(_) => EngineConfig::default(),
    };
    let directory = match std::env::var("VIGIL_LOCATIONS") {
        Ok(path) => InMemoryLocationDirectory::from_file(&path)
            .with_context(|| format!("loading location table from {}", path))?,
        Err(_) => {
            tracing::warn!("VIGIL_LOCATIONS not set; every location will be rejected");
            InMemoryLocationDirectory::new()
        }
    };
    tracing::info!(locations = directory.len(), "Location directory loaded");

    let metrics = EngineMetrics::new().context("registering metrics")?;
    let service = ReviewService::new(Arc::new(MemoryStore::new()), Arc::new(directory), config);

    run(&addr, AppState::new(service, metrics))
        .await
        .context("API server failed")
}
