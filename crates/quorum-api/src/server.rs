//! Gateway server assembly with graceful shutdown

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use quorum_llm::ModelRegistry;
use quorum_persist::{ConfigStore, CredentialStore};
use quorum_runtime::{ErrorPolicy, Orchestrator, OrchestratorConfig};

use crate::error::ApiError;
use crate::routes::api_router;
use crate::state::AppState;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Request timeout
    pub timeout: Duration,
    /// Max request body size (bytes)
    pub max_body_size: usize,
    /// Directory holding routing_config.yaml
    pub config_dir: PathBuf,
    /// Directory holding api_keys.json (and the SQLite fallback)
    pub data_dir: PathBuf,
    /// What a failed primary invocation surfaces as
    pub error_policy: ErrorPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3003".parse().unwrap(),
            timeout: Duration::from_secs(120),
            max_body_size: 1024 * 1024, // 1MB
            config_dir: PathBuf::from("./config"),
            data_dir: PathBuf::from("./data"),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("QUORUM_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3003);

        let timeout_secs: u64 = std::env::var("QUORUM_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(120);

        let error_policy = match std::env::var("QUORUM_ERROR_POLICY").as_deref() {
            Ok("strict") => ErrorPolicy::Strict,
            _ => ErrorPolicy::Lenient,
        };

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            timeout: Duration::from_secs(timeout_secs),
            config_dir: std::env::var("QUORUM_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./config")),
            data_dir: std::env::var("QUORUM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            error_policy,
            ..Default::default()
        }
    }
}

/// Initialize tracing with an env-filter (RUST_LOG), defaulting to info.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// The assembled gateway server
pub struct QuorumServer {
    config: ServerConfig,
    state: AppState,
}

impl QuorumServer {
    /// Load configuration and credentials, build the model registry and
    /// orchestrator, and wire up the shared state.
    pub async fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let config_store = Arc::new(ConfigStore::new(
            config.config_dir.join("routing_config.yaml"),
        ));
        let routing = config_store.load().await?;

        let credentials = CredentialStore::load(&config.data_dir).await;
        let registry = ModelRegistry::from_credentials(credentials.all(), &routing.model_params);
        tracing::info!(
            categories = routing.routing_rules.len(),
            models = registry.len(),
            "gateway initialized"
        );

        let rules = Arc::new(RwLock::new(routing.routing_rules));
        let registry = Arc::new(RwLock::new(registry));
        let orchestrator = Arc::new(Orchestrator::new(
            rules.clone(),
            registry.clone(),
            OrchestratorConfig {
                error_policy: config.error_policy,
                ..OrchestratorConfig::default()
            },
        ));

        let state = AppState::new(
            rules,
            registry,
            orchestrator,
            config_store,
            Arc::new(RwLock::new(credentials)),
            routing.model_params,
        );

        Ok(Self { config, state })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> Result<(), ApiError> {
        let app = api_router(self.state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(self.config.timeout))
            .layer(RequestBodyLimitLayer::new(self.config.max_body_size));

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| ApiError::Internal(format!("bind {}: {}", self.config.addr, e)))?;
        tracing::info!(addr = %self.config.addr, "gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        tracing::info!("gateway shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
