//! # Quorum Core
//!
//! Pure decision logic for the Quorum gateway: category rules, the keyword
//! router, query history, usage statistics and prompt templates.
//!
//! Everything here is synchronous and I/O-free. Loading configuration,
//! talking to model backends and serving HTTP live in the sibling crates
//! (`quorum-persist`, `quorum-llm`, `quorum-api`).
//!
//! ## Quick Start
//!
//! ```rust
//! use quorum_core::{route, RuleSet, CategoryRule, ModelId};
//!
//! let mut rules = RuleSet::new();
//! rules
//!     .insert(
//!         "debugging",
//!         CategoryRule::new(ModelId::Claude3)
//!             .with_keywords(["stack trace", "segfault"]),
//!     )
//!     .unwrap();
//!
//! let decision = route(&rules, "why does this segfault?", "").unwrap();
//! assert_eq!(decision.category, "debugging");
//! ```

pub mod error;
pub mod history;
pub mod model;
pub mod router;
pub mod rules;
pub mod template;

pub use error::{ConfigurationError, RouteError};
pub use history::{History, HistoryEntry, UsageStats, DEFAULT_HISTORY_CAPACITY};
pub use model::{default_model_params, ModelId, ModelParams};
pub use router::{matched_keywords, route, RouteDecision, FALLBACK_CATEGORY, NEUTRAL_CONFIDENCE};
pub use rules::{CategoryRule, RuleSet};
pub use template::{PromptTemplate, TemplateRegistry, TemplateVars};
