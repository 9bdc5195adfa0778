//! Routing configuration persistence (YAML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quorum_core::{default_model_params, ConfigurationError, ModelId, ModelParams, RuleSet};

/// On-disk routing configuration: the rule set plus per-model generation
/// parameters. Category order in the file is the routing tie-break order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub routing_rules: RuleSet,
    #[serde(default)]
    pub model_params: HashMap<ModelId, ModelParams>,
}

impl RoutingConfig {
    /// The configuration written when none exists yet: the eight built-in
    /// categories and default parameters for every supported model.
    pub fn built_in() -> Self {
        Self {
            routing_rules: RuleSet::default_rules(),
            model_params: ModelId::ALL
                .into_iter()
                .map(|id| (id, default_model_params(id)))
                .collect(),
        }
    }
}

/// Loads and saves the YAML routing configuration.
///
/// A missing file is not an error: the built-in defaults are written out
/// and returned (auto-heal). A present-but-malformed file is fatal.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<RoutingConfig, ConfigurationError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no routing config found, writing defaults");
            let config = RoutingConfig::built_in();
            self.save(&config).await?;
            return Ok(config);
        }

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigurationError::Io(format!("{}: {}", self.path.display(), e)))?;

        let config: RoutingConfig = serde_yaml::from_str(&raw)
            .map_err(|e| ConfigurationError::Malformed(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!(
            path = %self.path.display(),
            categories = config.routing_rules.len(),
            "routing config loaded"
        );
        Ok(config)
    }

    pub async fn save(&self, config: &RoutingConfig) -> Result<(), ConfigurationError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigurationError::Io(format!("{}: {}", parent.display(), e)))?;
        }

        let raw = serde_yaml::to_string(config)
            .map_err(|e| ConfigurationError::Malformed(e.to_string()))?;

        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| ConfigurationError::Io(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}
