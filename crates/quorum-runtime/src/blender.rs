//! Response blending: synthesize one answer from several model outputs

use quorum_core::{ModelId, ModelParams};
use quorum_llm::{LlmProvider, LlmRequest};

/// Secondary responses are truncated to this many characters in the
/// synthesis prompt to bound its size.
pub const SECONDARY_SNIPPET_LEN: usize = 500;

/// Merges a primary response with secondary model responses by asking the
/// primary model to synthesize them.
///
/// Blending never fails a request: with no secondary responses, or when
/// the synthesis call itself fails, the primary response is returned
/// verbatim.
#[derive(Debug, Default)]
pub struct ResponseBlender;

impl ResponseBlender {
    pub fn new() -> Self {
        Self
    }

    /// Build the synthesis request sent to the primary model.
    pub fn synthesis_prompt(
        primary_model: ModelId,
        primary: &str,
        secondaries: &[String],
    ) -> String {
        let mut prompt = format!(
            "Synthesize these expert responses into a comprehensive answer:\n\n\
             Primary Response ({}):\n{}\n\nSecondary Responses:\n",
            primary_model, primary
        );
        for secondary in secondaries {
            let snippet: String = secondary.chars().take(SECONDARY_SNIPPET_LEN).collect();
            let ellipsis = if secondary.chars().count() > SECONDARY_SNIPPET_LEN {
                "..."
            } else {
                ""
            };
            prompt.push_str(&format!("- {}{}\n", snippet, ellipsis));
        }
        prompt.push_str(
            "\nCreate a unified response that incorporates the best insights from all responses.",
        );
        prompt
    }

    /// Blend. `provider`/`params` are the primary model's handle.
    pub async fn blend(
        &self,
        provider: &dyn LlmProvider,
        params: &ModelParams,
        primary_model: ModelId,
        primary: String,
        secondaries: Vec<String>,
    ) -> String {
        if secondaries.is_empty() {
            return primary;
        }

        let request = LlmRequest {
            system: String::new(),
            prompt: Self::synthesis_prompt(primary_model, &primary, &secondaries),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        match provider.complete(request).await {
            Ok(response) => {
                tracing::debug!(
                    model = %primary_model,
                    sources = secondaries.len() + 1,
                    "responses blended"
                );
                response.content
            }
            Err(e) => {
                tracing::error!(model = %primary_model, error = %e, "blending failed, keeping primary");
                primary
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::default_model_params;
    use quorum_llm::MockProvider;

    #[tokio::test]
    async fn test_no_secondaries_returns_primary_verbatim() {
        let blender = ResponseBlender::new();
        let provider = MockProvider::constant("should not be called");
        let out = blender
            .blend(
                &provider,
                &default_model_params(ModelId::Claude3),
                ModelId::Claude3,
                "the primary answer".to_string(),
                Vec::new(),
            )
            .await;
        assert_eq!(out, "the primary answer");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_prompt_includes_all_responses() {
        let prompt = ResponseBlender::synthesis_prompt(
            ModelId::Claude3,
            "primary text",
            &["secondary one".to_string(), "secondary two".to_string()],
        );
        assert!(prompt.contains("Primary Response (claude_3)"));
        assert!(prompt.contains("primary text"));
        assert!(prompt.contains("- secondary one"));
        assert!(prompt.contains("- secondary two"));
    }

    #[tokio::test]
    async fn test_secondaries_truncated_in_prompt() {
        let long = "x".repeat(SECONDARY_SNIPPET_LEN + 100);
        let prompt =
            ResponseBlender::synthesis_prompt(ModelId::OpenAiGpt4, "p", &[long.clone()]);
        assert!(!prompt.contains(&long));
        assert!(prompt.contains(&format!("{}...", "x".repeat(SECONDARY_SNIPPET_LEN))));
    }

    #[tokio::test]
    async fn test_blend_uses_primary_model_synthesis() {
        let blender = ResponseBlender::new();
        let provider = MockProvider::constant("unified answer");
        let out = blender
            .blend(
                &provider,
                &default_model_params(ModelId::Claude3),
                ModelId::Claude3,
                "primary".to_string(),
                vec!["secondary".to_string()],
            )
            .await;
        assert_eq!(out, "unified answer");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_synthesis_failure_falls_back_to_primary() {
        let blender = ResponseBlender::new();
        let provider = MockProvider::failing();
        let out = blender
            .blend(
                &provider,
                &default_model_params(ModelId::Claude3),
                ModelId::Claude3,
                "primary".to_string(),
                vec!["secondary".to_string()],
            )
            .await;
        assert_eq!(out, "primary");
    }
}
