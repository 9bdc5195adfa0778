//! Error taxonomy for the routing core

use thiserror::Error;

/// Malformed or unreadable routing configuration.
///
/// Fatal at startup. A *missing* configuration file is not this error:
/// the config store auto-heals by writing defaults.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown model identifier: {0}")]
    UnknownModel(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    #[error("invalid rule for category '{category}': {reason}")]
    InvalidRule { category: String, reason: String },

    #[error("malformed configuration: {0}")]
    Malformed(String),

    #[error("configuration i/o error: {0}")]
    Io(String),
}

/// Structural routing failure, surfaced to the caller.
///
/// Individual model failures never take this path; they degrade into
/// error-marker response text instead (see `quorum-runtime`).
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no routing categories configured")]
    NoCategories,
}
