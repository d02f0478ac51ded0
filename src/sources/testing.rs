//! In-memory transport and connectors for tests.

use super::transport::{Connector, HttpReply, Transport};
use crate::error::{ResearchError, TransportError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A canned response for one URL.
#[derive(Clone)]
pub enum Canned {
    Reply(HttpReply),
    Fail(TransportError),
}

/// Serves canned responses keyed by URL, optionally after a delay.
#[derive(Clone, Default)]
pub struct FakeTransport {
    routes: HashMap<String, (Canned, Duration)>,
    calls: Arc<AtomicUsize>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, url: &str, body: &str) -> Self {
        self.status(url, 200, body)
    }

    pub fn status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            (
                Canned::Reply(HttpReply {
                    status,
                    body: body.to_string(),
                }),
                Duration::ZERO,
            ),
        );
        self
    }

    pub fn fail(mut self, url: &str, err: TransportError) -> Self {
        self.routes
            .insert(url.to_string(), (Canned::Fail(err), Duration::ZERO));
        self
    }

    /// Delays the response of an already registered route.
    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        if let Some(route) = self.routes.get_mut(url) {
            route.1 = delay;
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpReply, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let route = self.routes.get(url).cloned();
        async move {
            match route {
                Some((canned, delay)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    match canned {
                        Canned::Reply(reply) => Ok(reply),
                        Canned::Fail(err) => Err(err),
                    }
                }
                None => Ok(HttpReply {
                    status: 404,
                    body: String::new(),
                }),
            }
        }
        .boxed()
    }
}

/// Hands out clones of one [`FakeTransport`] and counts acquisitions.
pub struct FakeConnector {
    transport: FakeTransport,
    acquisitions: AtomicUsize,
    fail_after: Option<usize>,
}

impl FakeConnector {
    pub fn new(transport: FakeTransport) -> Self {
        Self {
            transport,
            acquisitions: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Succeeds `n` times, then refuses every further acquisition.
    pub fn failing_after(transport: FakeTransport, n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(transport)
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn acquire(&self) -> Result<Arc<dyn Transport>, ResearchError> {
        let n = self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_after, Some(limit) if n >= limit) {
            return Err(ResearchError::Connection(
                "connection pool exhausted".to_string(),
            ));
        }
        Ok(Arc::new(self.transport.clone()))
    }
}
