//! Per-source fetching.
//!
//! A fetch never fails: transport errors, non-success statuses, malformed
//! bodies, and timeouts all come back as a [`SourceResult`] carrying the
//! error message.

use super::transport::Transport;
use crate::error::TransportError;
use crate::models::{SourceId, SourceOutcome, SourceResult};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// How one source is fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceFetcher {
    /// One GET against a configured endpoint.
    Http {
        source: SourceId,
        endpoint: String,
        url: String,
    },
    /// A source with no fetch path. Always succeeds with a fixed payload.
    Stub { source: SourceId, payload: Value },
}

impl SourceFetcher {
    pub fn http(source: SourceId, endpoint: impl Into<String>, url: impl Into<String>) -> Self {
        SourceFetcher::Http {
            source,
            endpoint: endpoint.into(),
            url: url.into(),
        }
    }

    /// The social media source, which has no endpoint yet.
    pub fn social_media_stub() -> Self {
        SourceFetcher::Stub {
            source: SourceId::SocialMedia,
            payload: json!({ "trends": [] }),
        }
    }

    pub fn source(&self) -> SourceId {
        match self {
            SourceFetcher::Http { source, .. } | SourceFetcher::Stub { source, .. } => *source,
        }
    }

    /// Fetch this source once over the shared transport.
    pub async fn fetch(&self, transport: &dyn Transport, timeout: Duration) -> SourceResult {
        match self {
            SourceFetcher::Stub { source, payload } => {
                debug!("Using stub payload for {}", source);
                SourceResult::data(*source, payload.clone())
            }
            SourceFetcher::Http {
                source,
                endpoint,
                url,
            } => {
                let result = match tokio::time::timeout(timeout, transport.get(url)).await {
                    Ok(Ok(reply)) if reply.is_success() => {
                        match serde_json::from_str::<Value>(&reply.body) {
                            Ok(data) => SourceResult::data(*source, data),
                            Err(e) => SourceResult::error(
                                *source,
                                format!("Failed to parse response: {}", e),
                            ),
                        }
                    }
                    Ok(Ok(reply)) => SourceResult::error(
                        *source,
                        format!("Failed to fetch data: {}", reply.status),
                    ),
                    Ok(Err(e)) => SourceResult::error(*source, e.to_string()),
                    Err(_) => SourceResult::error(
                        *source,
                        TransportError::Timeout(timeout).to_string(),
                    ),
                };

                match &result.outcome {
                    SourceOutcome::Error(e) => warn!("Source {} failed: {}", source, e),
                    SourceOutcome::Data(_) => {
                        debug!("Fetched {} from endpoint {} ({})", source, endpoint, url)
                    }
                }

                result
            }
        }
    }
}
