//! Integration tests that require real vendor APIs
//!
//! These tests are marked with #[ignore] and require environment variables:
//! - OPENAI_API_KEY for OpenAI tests
//! - ANTHROPIC_API_KEY for Anthropic tests
//!
//! Run with: cargo test -p quorum-llm --test llm_integration -- --ignored

use quorum_llm::{AnthropicProvider, LlmProvider, LlmRequest, MockProvider, OpenAiProvider};

#[tokio::test]
#[ignore = "Requires OPENAI_API_KEY"]
async fn test_openai_real_request() {
    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set for this test");

    let provider = OpenAiProvider::new(&api_key, "gpt-3.5-turbo");
    assert!(provider.is_available().await, "OpenAI should be reachable");

    let request = LlmRequest {
        system: "Be extremely concise.".to_string(),
        prompt: "What is 2 + 2? Answer with just the number.".to_string(),
        temperature: 0.0,
        max_tokens: 10,
    };

    let response = provider.complete(request).await.expect("request should succeed");
    assert!(response.content.contains('4'));
    assert!(response.latency_ms > 0);
}

#[tokio::test]
#[ignore = "Requires ANTHROPIC_API_KEY"]
async fn test_anthropic_real_request() {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .expect("ANTHROPIC_API_KEY must be set for this test");

    let provider = AnthropicProvider::new(&api_key, "claude-3-opus-20240229");

    let response = provider.ask("Say 'hello' in one word").await.expect("request should succeed");
    assert!(!response.is_empty());
}

#[tokio::test]
#[ignore = "Makes real API call"]
async fn test_invalid_api_key_rejected() {
    let provider = OpenAiProvider::new("invalid-key-12345", "gpt-3.5-turbo");

    let response = provider.ask("Hello").await;
    assert!(response.is_err(), "should fail with invalid key");
}

#[tokio::test]
async fn test_mock_works_without_keys() {
    let provider = MockProvider::constant("pong");
    assert_eq!(provider.ask("ping").await.unwrap(), "pong");
}
