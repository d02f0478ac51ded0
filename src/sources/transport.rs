//! The shared connection resource.
//!
//! A [`Connector`] hands out one [`Transport`] per gather; every fetcher in
//! that gather issues its request over the same transport.

use crate::config::MarketResearchConfig;
use crate::error::{ResearchError, TransportError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Status and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An open connection able to issue GET requests.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpReply, TransportError>>;
}

/// Acquires a fresh [`Transport`].
pub trait Connector: Send + Sync {
    fn acquire(&self) -> Result<Arc<dyn Transport>, ResearchError>;
}

/// Transport backed by a pooled `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Transport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpReply, TransportError>> {
        async move {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            debug!("GET {} -> {} ({} bytes)", url, status, body.len());
            Ok(HttpReply { status, body })
        }
        .boxed()
    }
}

/// Builds a new `reqwest::Client` for every acquisition.
#[derive(Debug, Clone)]
pub struct ReqwestConnector {
    timeout: Duration,
    user_agent: String,
}

impl ReqwestConnector {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &MarketResearchConfig) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_seconds),
            config.user_agent.clone(),
        )
    }
}

impl Connector for ReqwestConnector {
    fn acquire(&self) -> Result<Arc<dyn Transport>, ResearchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| ResearchError::Connection(e.to_string()))?;

        debug!("Acquired HTTP client (timeout {:?})", self.timeout);
        Ok(Arc::new(ReqwestTransport { client }))
    }
}
