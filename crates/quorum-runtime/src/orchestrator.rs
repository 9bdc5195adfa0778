//! Orchestrator - one query through route, invoke, blend, record

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use quorum_core::{
    matched_keywords, route, History, HistoryEntry, ModelId, RouteError, RuleSet,
    TemplateRegistry, TemplateVars, UsageStats, DEFAULT_HISTORY_CAPACITY,
};
use quorum_llm::{LlmRequest, ModelRegistry};

use crate::blender::ResponseBlender;
use crate::memory::{ConversationBuffer, DEFAULT_MEMORY_CAPACITY};

/// Secondary models are consulted only below this routing confidence.
pub const BLEND_THRESHOLD: f64 = 0.9;

/// Hard cap on secondary invocations per query, bounding cost and latency.
pub const MAX_SECONDARY_MODELS: usize = 2;

/// What to surface when the primary model invocation itself fails.
///
/// `Lenient` preserves the historical behavior: the error-marker text *is*
/// the answer and the request succeeds. `Strict` lets the API layer turn a
/// degraded outcome into a distinguishable failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub error_policy: ErrorPolicy,
    /// Per-invocation deadline; an elapsed timeout counts as a failure.
    pub invocation_timeout: Duration,
    pub history_capacity: usize,
    pub memory_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            invocation_timeout: Duration::from_secs(60),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

/// Caller-supplied context for one query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryContext {
    /// Overrides the internal conversation buffer as routing context.
    pub conversation_history: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub components: Option<String>,
    pub tech_stack: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMetadata {
    pub category: String,
    pub primary_model: ModelId,
    pub secondary_models: Vec<ModelId>,
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    /// True when the primary invocation failed and the response carries an
    /// error marker instead of a model answer.
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub response: String,
    pub metadata: QueryMetadata,
}

/// Ties router, model registry and blender into one request pipeline and
/// owns the shared history and conversation buffer.
///
/// Rules and registry are shared handles: configuration reloads swap them
/// between queries, and an in-flight query keeps the rule snapshot it took
/// at route time.
pub struct Orchestrator {
    rules: Arc<RwLock<RuleSet>>,
    registry: Arc<RwLock<ModelRegistry>>,
    templates: TemplateRegistry,
    blender: ResponseBlender,
    history: parking_lot::RwLock<History>,
    memory: parking_lot::RwLock<ConversationBuffer>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        rules: Arc<RwLock<RuleSet>>,
        registry: Arc<RwLock<ModelRegistry>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            rules,
            registry,
            templates: TemplateRegistry::with_defaults(),
            blender: ResponseBlender::new(),
            history: parking_lot::RwLock::new(History::new(config.history_capacity)),
            memory: parking_lot::RwLock::new(ConversationBuffer::new(config.memory_capacity)),
            config,
        }
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.config.error_policy
    }

    /// Process one query end to end.
    ///
    /// The only fatal error is structural: an empty rule set. Model
    /// failures degrade into error-marker text and never abort the call.
    pub async fn process_query(
        &self,
        query: &str,
        context: &QueryContext,
    ) -> Result<QueryOutcome, RouteError> {
        // ROUTING
        let routing_context = match &context.conversation_history {
            Some(history) => history.clone(),
            None => self.memory.read().render(),
        };
        let decision = {
            let rules = self.rules.read().await;
            route(&rules, query, &routing_context)?
        };
        let rule = &decision.rule;
        tracing::info!(
            category = %decision.category,
            confidence = decision.confidence,
            primary = %rule.primary_model,
            "query routed"
        );

        let vars = TemplateVars::new(query, routing_context.as_str())
            .set(
                "language",
                context.language.clone().unwrap_or_else(|| "Python".to_string()),
            )
            .set(
                "framework",
                context.framework.clone().unwrap_or_else(|| "pytest".to_string()),
            )
            .set_opt("components", context.components.as_deref())
            .set_opt("tech_stack", context.tech_stack.as_deref());
        let prompt = self.templates.render(&decision.category, &vars);

        // INVOKING_PRIMARY
        let (primary_response, degraded) = match self.invoke(rule.primary_model, &prompt).await {
            Ok(text) => (text, false),
            Err(marker) => (marker, true),
        };

        // INVOKING_SECONDARIES: independent of each other, dispatched
        // concurrently, collected before blending.
        let mut secondary_responses = Vec::new();
        if decision.confidence < BLEND_THRESHOLD && !rule.secondary_models.is_empty() {
            let invocations = rule.secondary_models.iter().take(MAX_SECONDARY_MODELS).map(|id| {
                let id = *id;
                let prompt = prompt.as_str();
                async move { self.invoke(id, prompt).await.ok() }
            });
            secondary_responses = futures::future::join_all(invocations)
                .await
                .into_iter()
                .flatten()
                .collect();
        }

        // BLENDING
        let final_response = if secondary_responses.is_empty() {
            primary_response
        } else {
            self.blend(rule.primary_model, primary_response, secondary_responses)
                .await
        };

        // RECORDING
        self.history.write().push(HistoryEntry::new(
            query,
            decision.category.as_str(),
            rule.primary_model,
            decision.confidence,
            final_response.as_str(),
        ));
        self.memory.write().push(query, final_response.as_str());

        Ok(QueryOutcome {
            metadata: QueryMetadata {
                category: decision.category,
                primary_model: rule.primary_model,
                secondary_models: rule.secondary_models.clone(),
                confidence: decision.confidence,
                matched_keywords: matched_keywords(rule, query),
                degraded,
            },
            response: final_response,
        })
    }

    /// Usage statistics over a consistent history snapshot.
    pub fn stats(&self) -> UsageStats {
        let history = self.history.read();
        UsageStats::compute(history.iter())
    }

    /// Invoke one model. The error branch carries the marker text that
    /// stands in for the missing response.
    async fn invoke(&self, id: ModelId, prompt: &str) -> Result<String, String> {
        let (provider, params) = {
            let registry = self.registry.read().await;
            (registry.get(id), registry.params(id))
        };
        let Some(provider) = provider else {
            tracing::warn!(model = %id, "model not available");
            return Err(format!("Error: model {} is not available", id));
        };

        let request = LlmRequest {
            system: String::new(),
            prompt: prompt.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        match tokio::time::timeout(self.config.invocation_timeout, provider.complete(request)).await
        {
            Ok(Ok(response)) => Ok(response.content),
            Ok(Err(e)) => {
                tracing::error!(model = %id, error = %e, "model invocation failed");
                Err(format!("Error getting response from {}: {}", id, e))
            }
            Err(_) => {
                tracing::error!(model = %id, timeout = ?self.config.invocation_timeout, "model invocation timed out");
                Err(format!("Error getting response from {}: request timed out", id))
            }
        }
    }

    async fn blend(
        &self,
        primary_model: ModelId,
        primary: String,
        secondaries: Vec<String>,
    ) -> String {
        let (provider, params) = {
            let registry = self.registry.read().await;
            (registry.get(primary_model), registry.params(primary_model))
        };
        let Some(provider) = provider else {
            // Primary vanished between invocation and blending (reload);
            // keep the unblended response.
            return primary;
        };

        let fallback = primary.clone();
        match tokio::time::timeout(
            self.config.invocation_timeout,
            self.blender
                .blend(provider.as_ref(), &params, primary_model, primary, secondaries),
        )
        .await
        {
            Ok(blended) => blended,
            Err(_) => {
                tracing::error!(model = %primary_model, "blending timed out, keeping primary");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::{default_model_params, CategoryRule};
    use quorum_llm::MockProvider;

    fn shared<T>(value: T) -> Arc<RwLock<T>> {
        Arc::new(RwLock::new(value))
    }

    fn single_category_rules(min_confidence: f64, secondaries: Vec<ModelId>) -> RuleSet {
        let mut rules = RuleSet::new();
        rules
            .insert(
                "debugging",
                CategoryRule::new(ModelId::Claude3)
                    .with_keywords(["alpha", "beta"])
                    .with_min_confidence(min_confidence)
                    .with_secondaries(secondaries),
            )
            .unwrap();
        rules
    }

    #[tokio::test]
    async fn test_empty_rule_set_is_fatal() {
        let orchestrator = Orchestrator::new(
            shared(RuleSet::new()),
            shared(ModelRegistry::empty()),
            OrchestratorConfig::default(),
        );
        let err = orchestrator
            .process_query("anything", &QueryContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::NoCategories));
    }

    #[tokio::test]
    async fn test_high_confidence_skips_secondaries() {
        let mut registry = ModelRegistry::empty();
        let secondary = Arc::new(MockProvider::constant("secondary"));
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::constant("primary answer")),
            default_model_params(ModelId::Claude3),
        );
        registry.insert(
            ModelId::OpenAiGpt4,
            secondary.clone(),
            default_model_params(ModelId::OpenAiGpt4),
        );

        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.5, vec![ModelId::OpenAiGpt4])),
            shared(registry),
            OrchestratorConfig::default(),
        );

        // Both keywords present: confidence 1.0 >= blend threshold.
        let outcome = orchestrator
            .process_query("alpha beta", &QueryContext::default())
            .await
            .unwrap();

        assert_eq!(outcome.response, "primary answer");
        assert_eq!(outcome.metadata.confidence, 1.0);
        assert!(!outcome.metadata.degraded);
        assert_eq!(secondary.calls(), 0, "no secondary below-threshold dispatch");
    }

    #[tokio::test]
    async fn test_low_confidence_blends_with_secondaries() {
        let mut registry = ModelRegistry::empty();
        // Primary serves the first call and then the synthesis call.
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::scripted(vec![
                "primary answer".to_string(),
                "blended answer".to_string(),
            ])),
            default_model_params(ModelId::Claude3),
        );
        registry.insert(
            ModelId::OpenAiGpt4,
            Arc::new(MockProvider::constant("secondary answer")),
            default_model_params(ModelId::OpenAiGpt4),
        );

        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.4, vec![ModelId::OpenAiGpt4])),
            shared(registry),
            OrchestratorConfig::default(),
        );

        // One of two keywords: confidence 0.5, accepted, below 0.9.
        let outcome = orchestrator
            .process_query("only alpha here", &QueryContext::default())
            .await
            .unwrap();

        assert_eq!(outcome.response, "blended answer");
        assert_eq!(outcome.metadata.matched_keywords, vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_secondary_cap_is_two() {
        let mut registry = ModelRegistry::empty();
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::constant("primary")),
            default_model_params(ModelId::Claude3),
        );
        let second = Arc::new(MockProvider::constant("s1"));
        let third = Arc::new(MockProvider::constant("s2"));
        let fourth = Arc::new(MockProvider::constant("s3"));
        registry.insert(ModelId::OpenAiGpt4, second.clone(), default_model_params(ModelId::OpenAiGpt4));
        registry.insert(ModelId::Llama70b, third.clone(), default_model_params(ModelId::Llama70b));
        registry.insert(ModelId::Cohere, fourth.clone(), default_model_params(ModelId::Cohere));

        let orchestrator = Orchestrator::new(
            shared(single_category_rules(
                0.4,
                vec![ModelId::OpenAiGpt4, ModelId::Llama70b, ModelId::Cohere],
            )),
            shared(registry),
            OrchestratorConfig::default(),
        );

        let outcome = orchestrator
            .process_query("alpha only", &QueryContext::default())
            .await
            .unwrap();

        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 1);
        assert_eq!(fourth.calls(), 0, "third secondary must not be invoked");
        // Metadata still reports the configured list.
        assert_eq!(outcome.metadata.secondary_models.len(), 3);
    }

    #[tokio::test]
    async fn test_all_secondaries_failing_keeps_primary() {
        let mut registry = ModelRegistry::empty();
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::constant("primary answer")),
            default_model_params(ModelId::Claude3),
        );
        registry.insert(
            ModelId::OpenAiGpt4,
            Arc::new(MockProvider::failing()),
            default_model_params(ModelId::OpenAiGpt4),
        );

        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.4, vec![ModelId::OpenAiGpt4])),
            shared(registry),
            OrchestratorConfig::default(),
        );

        let outcome = orchestrator
            .process_query("alpha", &QueryContext::default())
            .await
            .unwrap();

        assert_eq!(outcome.response, "primary answer");
        assert!(!outcome.metadata.degraded);
    }

    #[tokio::test]
    async fn test_primary_failure_degrades_to_marker() {
        let mut registry = ModelRegistry::empty();
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::failing()),
            default_model_params(ModelId::Claude3),
        );

        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.4, Vec::new())),
            shared(registry),
            OrchestratorConfig::default(),
        );

        let outcome = orchestrator
            .process_query("alpha", &QueryContext::default())
            .await
            .unwrap();

        assert!(outcome.metadata.degraded);
        assert!(outcome.response.starts_with("Error getting response from claude_3"));
    }

    #[tokio::test]
    async fn test_unregistered_primary_yields_marker_not_fault() {
        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.4, Vec::new())),
            shared(ModelRegistry::empty()),
            OrchestratorConfig::default(),
        );

        let outcome = orchestrator
            .process_query("alpha", &QueryContext::default())
            .await
            .unwrap();

        assert!(outcome.metadata.degraded);
        assert_eq!(outcome.response, "Error: model claude_3 is not available");
    }

    #[tokio::test]
    async fn test_invocation_timeout_counts_as_failure() {
        let mut registry = ModelRegistry::empty();
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::constant("too slow").with_latency(200)),
            default_model_params(ModelId::Claude3),
        );

        let config = OrchestratorConfig {
            invocation_timeout: Duration::from_millis(20),
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.4, Vec::new())),
            shared(registry),
            config,
        );

        let outcome = orchestrator
            .process_query("alpha", &QueryContext::default())
            .await
            .unwrap();

        assert!(outcome.metadata.degraded);
        assert!(outcome.response.contains("timed out"));
    }

    #[tokio::test]
    async fn test_history_and_stats_are_monotonic() {
        let mut registry = ModelRegistry::empty();
        registry.insert(
            ModelId::Claude3,
            Arc::new(MockProvider::constant("ok")),
            default_model_params(ModelId::Claude3),
        );

        let orchestrator = Orchestrator::new(
            shared(single_category_rules(0.4, Vec::new())),
            shared(registry),
            OrchestratorConfig::default(),
        );

        for _ in 0..5 {
            orchestrator
                .process_query("alpha beta", &QueryContext::default())
                .await
                .unwrap();
        }

        let stats = orchestrator.stats();
        assert_eq!(stats.total_queries, 5);
        assert_eq!(stats.categories.values().sum::<usize>(), 5);
        assert_eq!(stats.models.values().sum::<usize>(), 5);
        assert_eq!(stats.categories["debugging"], 5);
        assert!((stats.average_confidence - 1.0).abs() < 1e-9);
    }
}
