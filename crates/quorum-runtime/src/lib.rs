//! # Quorum Runtime
//!
//! The request pipeline: route a query, invoke the primary model, fan out
//! to secondary models when routing confidence is low, blend the answers,
//! record history.
//!
//! One [`Orchestrator`] instance serves all requests; each
//! `process_query` call is independent apart from the shared history,
//! statistics and conversation buffer.

pub mod blender;
pub mod memory;
pub mod orchestrator;

pub use blender::{ResponseBlender, SECONDARY_SNIPPET_LEN};
pub use memory::ConversationBuffer;
pub use orchestrator::{
    ErrorPolicy, Orchestrator, OrchestratorConfig, QueryContext, QueryMetadata, QueryOutcome,
    BLEND_THRESHOLD, MAX_SECONDARY_MODELS,
};
