//! # Quorum LLM
//!
//! Model backend integrations for the Quorum gateway.
//!
//! ## Supported Backends
//!
//! | Provider | Models served | Key Required |
//! |----------|---------------|--------------|
//! | OpenAI | `openai_gpt4`, `openai_gpt35` | `openai` |
//! | Anthropic | `claude_3`, `claude_2` | `anthropic` |
//! | Together AI | `llama_70b`, `llama_13b` | `together` |
//! | Cohere | `cohere` | `cohere` |
//! | Mistral | `mistral` | `mistral` |
//! | Mock | any (testing) | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use quorum_llm::{LlmProvider, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("four");
//!     let answer = llm.ask("What is 2+2?").await.unwrap();
//!     assert_eq!(answer, "four");
//! }
//! ```
//!
//! ## Registry
//!
//! [`ModelRegistry`] maps [`quorum_core::ModelId`] to a live provider
//! handle. It is rebuilt with [`ModelRegistry::from_credentials`] whenever
//! a credential changes; only vendors with a usable key get a provider.

pub mod anthropic;
pub mod cohere;
pub mod mistral;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod registry;
pub mod together;

pub use anthropic::AnthropicProvider;
pub use cohere::CohereProvider;
pub use mistral::MistralProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use registry::ModelRegistry;
pub use together::TogetherProvider;
