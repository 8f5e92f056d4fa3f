// src/error.rs
//! Error taxonomy shared by the registry, the aggregator and the HTTP layer.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregatorError {
    /// Caller asked for a key that no adapter was registered under.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Upstream, network, parse or timeout failure inside one adapter.
    /// Absorbed by the aggregator; only ever seen in logs and metrics.
    #[error("fetch failed for {key}: {reason}")]
    FetchFailed { key: String, reason: String },

    /// An adapter factory could not build its adapter during discovery.
    #[error("failed to load adapter {key}: {reason}")]
    DiscoveryLoad { key: String, reason: String },
}

impl AggregatorError {
    pub fn is_unknown_source(&self) -> bool {
        matches!(self, AggregatorError::UnknownSource(_))
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
