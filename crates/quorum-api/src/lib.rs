//! # Quorum API
//!
//! The HTTP surface of the gateway. Every endpoint is a thin pass-through
//! to the orchestrator, rule set, registry or stores — no business logic
//! lives here.
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/ai/query` | route, invoke and blend one query |
//! | POST | `/api/ai/keywords` | update a category's keywords |
//! | POST | `/api/ai/keys` | add/update a vendor API key |
//! | GET  | `/api/ai/config` | current routing configuration |
//! | GET  | `/api/ai/stats` | usage statistics |
//! | GET  | `/api/ai/categories` | routing categories |
//! | GET  | `/api/ai/models` | available model backends |
//! | GET  | `/api/ai/health` | health probe |

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::api_router;
pub use server::{init_tracing, QuorumServer, ServerConfig};
pub use state::AppState;
