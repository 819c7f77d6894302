//! Error types for the engine

use std::time::Duration;
use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EdgeError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Quota exhausted for {0}")]
    QuotaExhausted(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EdgeError {
    pub fn api(msg: impl Into<String>) -> Self {
        EdgeError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        EdgeError::Network(msg.into())
    }

    pub fn quota(source: impl Into<String>) -> Self {
        EdgeError::QuotaExhausted(source.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        EdgeError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        EdgeError::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EdgeError::Config(msg.into())
    }

    pub fn timeout(after: Duration) -> Self {
        EdgeError::Timeout(after.as_millis() as u64)
    }

    /// Whether this error means the upstream quota is spent
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, EdgeError::QuotaExhausted(_))
    }
}

/// Result type alias for engine operations
pub type EdgeResult<T> = Result<T, EdgeError>;
