//! Model registry: model id to live provider handle

use std::collections::HashMap;
use std::sync::Arc;

use quorum_core::{default_model_params, ModelId, ModelParams};

use crate::anthropic::AnthropicProvider;
use crate::cohere::CohereProvider;
use crate::mistral::MistralProvider;
use crate::openai::OpenAiProvider;
use crate::provider::LlmProvider;
use crate::together::TogetherProvider;

#[derive(Debug, Clone)]
struct RegisteredModel {
    provider: Arc<dyn LlmProvider>,
    params: ModelParams,
}

/// The set of model backends currently usable for routing.
///
/// Built from the credential map: a slot is populated only when its
/// vendor key is present. Credential changes rebuild the registry through
/// an explicit [`ModelRegistry::from_credentials`] call and an atomic swap
/// of the shared handle — no ambient global re-initialization.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<ModelId, RegisteredModel>,
}

impl ModelRegistry {
    /// A registry with no backends. Every invocation degrades to the
    /// error-marker path until credentials arrive.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build providers for every model whose vendor has a usable key.
    ///
    /// `params` overrides generation parameters per model id; slots
    /// without an entry use the built-in defaults. Placeholder keys
    /// (`your-...`) never reach this point — the credential store filters
    /// them — but a second guard here keeps the registry honest when
    /// callers hand in raw maps.
    pub fn from_credentials(
        credentials: &HashMap<String, String>,
        params: &HashMap<ModelId, ModelParams>,
    ) -> Self {
        let mut registry = Self::empty();

        for id in ModelId::ALL {
            let Some(key) = credentials.get(id.vendor()) else {
                continue;
            };
            if key.is_empty() || key.starts_with("your-") {
                continue;
            }
            let model_params = params
                .get(&id)
                .cloned()
                .unwrap_or_else(|| default_model_params(id));
            let provider: Arc<dyn LlmProvider> = match id {
                ModelId::OpenAiGpt4 | ModelId::OpenAiGpt35 => {
                    Arc::new(OpenAiProvider::new(key, &model_params.model))
                }
                ModelId::Claude3 | ModelId::Claude2 => {
                    Arc::new(AnthropicProvider::new(key, &model_params.model))
                }
                ModelId::Llama70b | ModelId::Llama13b => {
                    Arc::new(TogetherProvider::new(key, &model_params.model))
                }
                ModelId::Cohere => Arc::new(CohereProvider::new(key, &model_params.model)),
                ModelId::Mistral => Arc::new(MistralProvider::new(key, &model_params.model)),
            };
            registry.models.insert(
                id,
                RegisteredModel {
                    provider,
                    params: model_params,
                },
            );
        }

        tracing::info!(models = registry.len(), "model registry built");
        registry
    }

    /// Register an explicit provider (tests, custom backends).
    pub fn insert(&mut self, id: ModelId, provider: Arc<dyn LlmProvider>, params: ModelParams) {
        self.models.insert(id, RegisteredModel { provider, params });
    }

    pub fn get(&self, id: ModelId) -> Option<Arc<dyn LlmProvider>> {
        self.models.get(&id).map(|m| m.provider.clone())
    }

    /// Generation parameters for a model, falling back to built-in
    /// defaults for unregistered slots.
    pub fn params(&self, id: ModelId) -> ModelParams {
        self.models
            .get(&id)
            .map(|m| m.params.clone())
            .unwrap_or_else(|| default_model_params(id))
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.models.contains_key(&id)
    }

    /// Registered model ids, in [`ModelId::ALL`] order.
    pub fn available(&self) -> Vec<ModelId> {
        ModelId::ALL
            .into_iter()
            .filter(|id| self.models.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
