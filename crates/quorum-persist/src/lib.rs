//! # Quorum Persistence
//!
//! Durable state for the gateway:
//! - routing configuration as YAML ([`ConfigStore`]), auto-healed with the
//!   built-in defaults when the file is absent
//! - vendor API keys from JSON key files with a SQLite fallback
//!   ([`CredentialStore`])
//!
//! The decision core never touches these directly; the API layer and the
//! server wire them in at startup and on mutation.

pub mod config_store;
pub mod credential_store;
pub mod error;

pub use config_store::{ConfigStore, RoutingConfig};
pub use credential_store::CredentialStore;
pub use error::StorageError;
