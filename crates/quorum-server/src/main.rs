//! Quorum Server - standalone entry point for the gateway API
//!
//! A thin wrapper around `quorum-api` that provides a runnable binary for
//! deployments without touching the library crates.

use anyhow::Result;
use quorum_api::{init_tracing, QuorumServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("starting Quorum gateway");

    // PaaS compatibility: map a bare $PORT to QUORUM_PORT.
    if let Ok(port) = std::env::var("PORT") {
        if std::env::var("QUORUM_PORT").is_err() {
            std::env::set_var("QUORUM_PORT", port);
        }
    }

    let config = ServerConfig::from_env();

    let server = QuorumServer::new(config).await.map_err(|e| {
        tracing::error!(error = %e, "failed to initialize gateway");
        anyhow::anyhow!(e.to_string())
    })?;

    server.run().await.map_err(|e| {
        tracing::error!(error = %e, "gateway exited with error");
        anyhow::anyhow!(e.to_string())
    })?;

    Ok(())
}
