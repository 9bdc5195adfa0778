//! Application State
//!
//! Centralizes the shared handles every handler needs: rule set, model
//! registry, orchestrator and the two stores.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use quorum_core::{ModelId, ModelParams, RuleSet};
use quorum_llm::ModelRegistry;
use quorum_persist::{ConfigStore, CredentialStore};
use quorum_runtime::Orchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    rules: Arc<RwLock<RuleSet>>,
    registry: Arc<RwLock<ModelRegistry>>,
    orchestrator: Arc<Orchestrator>,
    config_store: Arc<ConfigStore>,
    credentials: Arc<RwLock<CredentialStore>>,
    model_params: Arc<RwLock<HashMap<ModelId, ModelParams>>>,
}

impl AppState {
    pub fn new(
        rules: Arc<RwLock<RuleSet>>,
        registry: Arc<RwLock<ModelRegistry>>,
        orchestrator: Arc<Orchestrator>,
        config_store: Arc<ConfigStore>,
        credentials: Arc<RwLock<CredentialStore>>,
        model_params: HashMap<ModelId, ModelParams>,
    ) -> Self {
        Self {
            rules,
            registry,
            orchestrator,
            config_store,
            credentials,
            model_params: Arc::new(RwLock::new(model_params)),
        }
    }

    pub fn rules(&self) -> Arc<RwLock<RuleSet>> {
        self.rules.clone()
    }

    pub fn registry(&self) -> Arc<RwLock<ModelRegistry>> {
        self.registry.clone()
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        self.orchestrator.clone()
    }

    pub fn config_store(&self) -> Arc<ConfigStore> {
        self.config_store.clone()
    }

    pub fn credentials(&self) -> Arc<RwLock<CredentialStore>> {
        self.credentials.clone()
    }

    pub fn model_params(&self) -> Arc<RwLock<HashMap<ModelId, ModelParams>>> {
        self.model_params.clone()
    }
}
