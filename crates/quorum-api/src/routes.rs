//! API routes for the gateway endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use quorum_core::{ModelId, UsageStats};
use quorum_llm::ModelRegistry;
use quorum_persist::RoutingConfig;
use quorum_runtime::{ErrorPolicy, QueryContext, QueryOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub context: Option<QueryContext>,
    pub language: Option<String>,
    pub framework: Option<String>,
}

/// Process a query through routing, invocation and blending
#[utoipa::path(
    post,
    path = "/api/ai/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Routed and answered"),
        (status = 422, description = "Empty query"),
        (status = 503, description = "Primary model unavailable (strict error policy only)")
    )
)]
pub async fn process_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<Json<QueryOutcome>> {
    if req.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".to_string()));
    }

    let mut context = req.context.unwrap_or_default();
    if req.language.is_some() {
        context.language = req.language;
    }
    if req.framework.is_some() {
        context.framework = req.framework;
    }

    let orchestrator = state.orchestrator();
    let outcome = orchestrator.process_query(&req.query, &context).await?;

    if outcome.metadata.degraded && orchestrator.error_policy() == ErrorPolicy::Strict {
        return Err(ApiError::ServiceUnavailable(format!(
            "primary model {} unavailable",
            outcome.metadata.primary_model
        )));
    }

    Ok(Json(outcome))
}

/// Keyword update request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct KeywordUpdateRequest {
    pub category: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_append")]
    pub append: bool,
}

fn default_append() -> bool {
    true
}

/// Generic message response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Update routing keywords for a category and persist the configuration
#[utoipa::path(
    post,
    path = "/api/ai/keywords",
    request_body = KeywordUpdateRequest,
    responses(
        (status = 200, description = "Keywords updated", body = MessageResponse),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn update_keywords(
    State(state): State<AppState>,
    Json(req): Json<KeywordUpdateRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if req.keywords.is_empty() {
        return Err(ApiError::Validation("keywords must not be empty".to_string()));
    }

    let config = {
        let rules = state.rules();
        let mut rules = rules.write().await;
        rules.update_keywords(&req.category, req.keywords, req.append)?;
        RoutingConfig {
            routing_rules: rules.clone(),
            model_params: state.model_params().read().await.clone(),
        }
    };
    state.config_store().save(&config).await?;

    tracing::info!(category = %req.category, "routing keywords updated");
    Ok(Json(MessageResponse {
        message: format!("Keywords updated for {}", req.category),
    }))
}

/// Credential update request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ApiKeyRequest {
    pub service: String,
    pub key: String,
}

/// Add or update a vendor API key and rebuild the model registry
#[utoipa::path(
    post,
    path = "/api/ai/keys",
    request_body = ApiKeyRequest,
    responses(
        (status = 200, description = "Key stored, registry rebuilt", body = MessageResponse)
    )
)]
pub async fn update_api_key(
    State(state): State<AppState>,
    Json(req): Json<ApiKeyRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if req.service.trim().is_empty() || req.key.trim().is_empty() {
        return Err(ApiError::Validation(
            "service and key must not be empty".to_string(),
        ));
    }

    let rebuilt = {
        let credentials = state.credentials();
        let mut credentials = credentials.write().await;
        credentials.set(&req.service, req.key);
        credentials.save().await?;
        ModelRegistry::from_credentials(
            credentials.all(),
            &state.model_params().read().await.clone(),
        )
    };

    let count = rebuilt.len();
    *state.registry().write().await = rebuilt;

    tracing::info!(service = %req.service, models = count, "API key updated, registry reloaded");
    Ok(Json(MessageResponse {
        message: format!("API key updated for {}", req.service),
    }))
}

/// Fetch the current routing configuration
#[utoipa::path(
    get,
    path = "/api/ai/config",
    responses(
        (status = 200, description = "Current rule set and model parameters")
    )
)]
pub async fn get_configuration(State(state): State<AppState>) -> ApiResult<Json<RoutingConfig>> {
    let config = RoutingConfig {
        routing_rules: state.rules().read().await.clone(),
        model_params: state.model_params().read().await.clone(),
    };
    Ok(Json(config))
}

/// Fetch usage statistics, recomputed from history
#[utoipa::path(
    get,
    path = "/api/ai/stats",
    responses(
        (status = 200, description = "Per-category and per-model usage counts")
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<UsageStats> {
    Json(state.orchestrator().stats())
}

/// Category detail
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryDetail {
    pub name: String,
    pub keywords: Vec<String>,
    #[schema(value_type = String)]
    pub primary_model: ModelId,
    #[schema(value_type = Vec<String>)]
    pub secondary_models: Vec<ModelId>,
    pub weight: f64,
    pub min_confidence: f64,
}

/// Categories response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub details: Vec<CategoryDetail>,
}

/// List routing categories in declaration order
#[utoipa::path(
    get,
    path = "/api/ai/categories",
    responses(
        (status = 200, description = "All routing categories", body = CategoriesResponse)
    )
)]
pub async fn get_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let rules = state.rules();
    let rules = rules.read().await;
    let details: Vec<CategoryDetail> = rules
        .iter()
        .map(|(name, rule)| CategoryDetail {
            name: name.to_string(),
            keywords: rule.keywords.clone(),
            primary_model: rule.primary_model,
            secondary_models: rule.secondary_models.clone(),
            weight: rule.weight,
            min_confidence: rule.min_confidence,
        })
        .collect();

    Json(CategoriesResponse {
        categories: rules.names(),
        details,
    })
}

/// Models response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ModelsResponse {
    #[schema(value_type = Vec<String>)]
    pub available: Vec<ModelId>,
    pub total: usize,
}

/// List model backends with live providers
#[utoipa::path(
    get,
    path = "/api/ai/models",
    responses(
        (status = 200, description = "Available model identifiers", body = ModelsResponse)
    )
)]
pub async fn get_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let registry = state.registry();
    let registry = registry.read().await;
    Json(ModelsResponse {
        available: registry.available(),
        total: registry.len(),
    })
}

/// Health check response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub models_initialized: usize,
    pub categories_configured: usize,
}

/// Health probe
#[utoipa::path(
    get,
    path = "/api/ai/health",
    responses(
        (status = 200, description = "Gateway health", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let models_initialized = state.registry().read().await.len();
    let categories_configured = state.rules().read().await.len();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        models_initialized,
        categories_configured,
    })
}

/// Assemble the API router. Middleware layers are added by the server.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai/query", post(process_query))
        .route("/api/ai/keywords", post(update_keywords))
        .route("/api/ai/keys", post(update_api_key))
        .route("/api/ai/config", get(get_configuration))
        .route("/api/ai/stats", get(get_stats))
        .route("/api/ai/categories", get(get_categories))
        .route("/api/ai/models", get(get_models))
        .route("/api/ai/health", get(health))
        .with_state(state)
}
