//! Error types for the research pipeline.
//!
//! Source fetch failures never appear here: they are captured per source
//! as data. These errors are stage faults and cycle faults, which end a
//! research cycle with an error result.

use std::time::Duration;
use thiserror::Error;

/// Faults raised by a pipeline stage.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// The shared connection resource could not be acquired.
    #[error("Failed to acquire connection: {0}")]
    Connection(String),

    /// A configured endpoint is not a usable URL.
    #[error("Invalid endpoint '{name}': {url}")]
    InvalidEndpoint { name: String, url: String },

    /// A facet or the recommendation step failed.
    #[error("Error analyzing market data: {0}")]
    Analysis(String),

    /// Trend detection could not read the bundle.
    #[error("Error detecting trends: {0}")]
    TrendDetection(String),

    /// Insight synthesis failed.
    #[error("Error generating insights: {0}")]
    Insights(String),

    /// `run()` was called before a successful `initialize()`.
    #[error("research cycle is not initialized")]
    NotInitialized,

    /// `run()` was called after `initialize()` failed with the given cause.
    #[error("research cycle is not initialized: {0}")]
    InitializationFailed(String),

    /// A stage panicked.
    #[error("research stage panicked: {0}")]
    StagePanic(String),
}

/// Failures of a single HTTP round-trip.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cannot connect to {0}")]
    Connect(String),

    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            let target = e
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "remote host".to_string());
            TransportError::Connect(target)
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
