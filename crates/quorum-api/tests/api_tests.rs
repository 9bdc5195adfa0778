//! Handler-level tests against the assembled router

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt; // for `oneshot`

use quorum_api::{api_router, AppState};
use quorum_core::{default_model_params, CategoryRule, ModelId, RuleSet};
use quorum_llm::{MockProvider, ModelRegistry};
use quorum_persist::ConfigStore;
use quorum_runtime::{Orchestrator, OrchestratorConfig};

fn test_rules() -> RuleSet {
    let mut rules = RuleSet::new();
    rules
        .insert(
            "security_testing",
            CategoryRule::new(ModelId::Claude3)
                .with_keywords(["sql injection", "xss", "penetration"])
                .with_min_confidence(0.9),
        )
        .unwrap();
    rules
        .insert(
            "general",
            CategoryRule::new(ModelId::OpenAiGpt35).with_min_confidence(0.0),
        )
        .unwrap();
    rules
}

async fn setup_state(dir: &std::path::Path) -> AppState {
    let mut registry = ModelRegistry::empty();
    for id in [ModelId::Claude3, ModelId::OpenAiGpt35] {
        registry.insert(
            id,
            Arc::new(MockProvider::new(id.as_str(), vec![format!("answer from {}", id)])),
            default_model_params(id),
        );
    }

    let rules = Arc::new(RwLock::new(test_rules()));
    let registry = Arc::new(RwLock::new(registry));
    let orchestrator = Arc::new(Orchestrator::new(
        rules.clone(),
        registry.clone(),
        OrchestratorConfig::default(),
    ));

    // An empty data dir yields an empty credential store.
    let credentials = quorum_persist::CredentialStore::load(dir.join("data")).await;

    AppState::new(
        rules,
        registry,
        orchestrator,
        Arc::new(ConfigStore::new(dir.join("routing_config.yaml"))),
        Arc::new(RwLock::new(credentials)),
        HashMap::new(),
    )
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    let response = router
        .oneshot(Request::builder().uri("/api/ai/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["models_initialized"], 2);
    assert_eq!(json["categories_configured"], 2);
}

#[tokio::test]
async fn test_query_routes_and_answers() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    let response = router
        .oneshot(post_json(
            "/api/ai/query",
            serde_json::json!({"query": "sql injection xss penetration"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["response"], "answer from claude_3");
    assert_eq!(json["metadata"]["category"], "security_testing");
    assert_eq!(json["metadata"]["primary_model"], "claude_3");
    assert_eq!(json["metadata"]["confidence"], 1.0);
}

#[tokio::test]
async fn test_empty_query_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    let response = router
        .oneshot(post_json("/api/ai/query", serde_json::json!({"query": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_keyword_update_persists_and_routes() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let router = api_router(state.clone());

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/ai/keywords",
            serde_json::json!({
                "category": "security_testing",
                "keywords": ["csrf"],
                "append": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Persisted to the config store path.
    assert!(dir.path().join("routing_config.yaml").exists());

    // Visible through the categories endpoint.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ai/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let keywords = json["details"][0]["keywords"].as_array().unwrap();
    assert!(keywords.iter().any(|k| k == "csrf"));
}

#[tokio::test]
async fn test_keyword_update_unknown_category_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    let response = router
        .oneshot(post_json(
            "/api/ai/keywords",
            serde_json::json!({"category": "nope", "keywords": ["x"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_api_key_update_rebuilds_registry() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    // Before: mock registry reports 2 models.
    let response = router
        .clone()
        .oneshot(Request::builder().uri("/api/ai/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["total"], 2);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/ai/keys",
            serde_json::json!({"service": "openai", "key": "sk-test"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // After: registry rebuilt from credentials alone (both GPT slots).
    let response = router
        .clone()
        .oneshot(Request::builder().uri("/api/ai/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    let available = json["available"].as_array().unwrap();
    assert!(available.iter().any(|m| m == "openai_gpt4"));
    assert!(available.iter().any(|m| m == "openai_gpt35"));
}

#[tokio::test]
async fn test_stats_reflect_processed_queries() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    for _ in 0..3 {
        let response = router
            .clone()
            .oneshot(post_json(
                "/api/ai/query",
                serde_json::json!({"query": "sql injection xss penetration"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(Request::builder().uri("/api/ai/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total_queries"], 3);
    assert_eq!(json["categories"]["security_testing"], 3);
    assert_eq!(json["models"]["claude_3"], 3);
}

#[tokio::test]
async fn test_config_endpoint_returns_rules() {
    let dir = tempfile::tempdir().unwrap();
    let router = api_router(setup_state(dir.path()).await);

    let response = router
        .oneshot(Request::builder().uri("/api/ai/config").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["routing_rules"]["security_testing"]["keywords"]
        .as_array()
        .unwrap()
        .iter()
        .any(|k| k == "xss"));
}
