//! Supported model identifiers and per-model generation parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// The closed set of model backends a category may route to.
///
/// The string forms are the wire names used in configuration files and
/// API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "openai_gpt4")]
    OpenAiGpt4,
    #[serde(rename = "openai_gpt35")]
    OpenAiGpt35,
    #[serde(rename = "claude_3")]
    Claude3,
    #[serde(rename = "claude_2")]
    Claude2,
    #[serde(rename = "llama_70b")]
    Llama70b,
    #[serde(rename = "llama_13b")]
    Llama13b,
    #[serde(rename = "cohere")]
    Cohere,
    #[serde(rename = "mistral")]
    Mistral,
}

impl ModelId {
    /// Every supported identifier, in declaration order.
    pub const ALL: [ModelId; 8] = [
        ModelId::OpenAiGpt4,
        ModelId::OpenAiGpt35,
        ModelId::Claude3,
        ModelId::Claude2,
        ModelId::Llama70b,
        ModelId::Llama13b,
        ModelId::Cohere,
        ModelId::Mistral,
    ];

    /// Wire name, as written in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::OpenAiGpt4 => "openai_gpt4",
            ModelId::OpenAiGpt35 => "openai_gpt35",
            ModelId::Claude3 => "claude_3",
            ModelId::Claude2 => "claude_2",
            ModelId::Llama70b => "llama_70b",
            ModelId::Llama13b => "llama_13b",
            ModelId::Cohere => "cohere",
            ModelId::Mistral => "mistral",
        }
    }

    /// The credential service this model is billed against.
    ///
    /// Llama models are served through Together AI, hence `together`.
    pub fn vendor(&self) -> &'static str {
        match self {
            ModelId::OpenAiGpt4 | ModelId::OpenAiGpt35 => "openai",
            ModelId::Claude3 | ModelId::Claude2 => "anthropic",
            ModelId::Llama70b | ModelId::Llama13b => "together",
            ModelId::Cohere => "cohere",
            ModelId::Mistral => "mistral",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownModel(s.to_string()))
    }
}

/// Generation parameters for one model backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Vendor-side model name (e.g. "gpt-4", "claude-3-opus-20240229")
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1500
}

/// Built-in parameters for a model identifier, used when the configuration
/// file carries no `model_params` entry for it.
pub fn default_model_params(id: ModelId) -> ModelParams {
    let (model, temperature, max_tokens) = match id {
        ModelId::OpenAiGpt4 => ("gpt-4", 0.2, 2000),
        ModelId::OpenAiGpt35 => ("gpt-3.5-turbo", 0.3, 1500),
        ModelId::Claude3 => ("claude-3-opus-20240229", 0.2, 2000),
        ModelId::Claude2 => ("claude-2.1", 0.3, 1500),
        ModelId::Llama70b => ("meta-llama/Llama-2-70b-chat-hf", 0.2, 1500),
        ModelId::Llama13b => ("meta-llama/Llama-2-13b-chat-hf", 0.3, 1500),
        ModelId::Cohere => ("command", 0.2, 1500),
        ModelId::Mistral => ("mistral-medium", 0.2, 1500),
    };
    ModelParams {
        model: model.to_string(),
        temperature,
        max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for id in ModelId::ALL {
            assert_eq!(id.as_str().parse::<ModelId>().unwrap(), id);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&ModelId::Claude3).unwrap();
        assert_eq!(json, "\"claude_3\"");
        let back: ModelId = serde_json::from_str("\"llama_70b\"").unwrap();
        assert_eq!(back, ModelId::Llama70b);
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = "gpt_5".parse::<ModelId>().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownModel(_)));
    }

    #[test]
    fn test_default_params_cover_all_models() {
        for id in ModelId::ALL {
            let params = default_model_params(id);
            assert!(!params.model.is_empty());
            assert!(params.max_tokens > 0);
        }
    }
}
