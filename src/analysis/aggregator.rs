//! Concurrent gathering of all market data sources.
//!
//! The aggregator acquires one connection per gather, fans every source
//! fetch out over it, waits for all of them to settle, and combines the
//! results into a [`MarketDataBundle`].

use crate::config::Config;
use crate::error::ResearchError;
use crate::models::{MarketDataBundle, SourceEntry, SourceId, SourceResult};
use crate::sources::{Connector, SourceFetcher};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Gathers and combines all configured sources.
pub struct Aggregator {
    fetchers: Vec<SourceFetcher>,
    connector: Arc<dyn Connector>,
    fetch_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        fetchers: Vec<SourceFetcher>,
        connector: Arc<dyn Connector>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetchers,
            connector,
            fetch_timeout,
        }
    }

    /// Build the standard four sources from the configured endpoints.
    pub fn from_config(config: &Config, connector: Arc<dyn Connector>) -> Self {
        let endpoints = &config.endpoints;
        let fetchers = vec![
            SourceFetcher::http(SourceId::IndustryTrends, "trends", &endpoints.trends),
            SourceFetcher::http(
                SourceId::CompetitorData,
                "competitors",
                &endpoints.competitors,
            ),
            SourceFetcher::http(
                SourceId::MarketDemands,
                "market_data",
                &endpoints.market_data,
            ),
            SourceFetcher::social_media_stub(),
        ];

        Self::new(
            fetchers,
            connector,
            Duration::from_secs(config.market_research.request_timeout_seconds),
        )
    }

    #[allow(dead_code)]
    pub fn fetchers(&self) -> &[SourceFetcher] {
        &self.fetchers
    }

    /// Probe that a connection can be acquired, releasing it immediately.
    pub fn check_connection(&self) -> Result<(), ResearchError> {
        self.connector.acquire().map(drop)
    }

    /// Fetch every source concurrently and combine the results.
    ///
    /// Fails only when the connection cannot be acquired; individual source
    /// failures are recorded in the bundle.
    pub async fn gather(&self) -> Result<MarketDataBundle, ResearchError> {
        let transport = self.connector.acquire()?;
        info!("Gathering {} market data sources", self.fetchers.len());

        let mut pending: FuturesUnordered<_> = self
            .fetchers
            .iter()
            .map(|fetcher| fetcher.fetch(transport.as_ref(), self.fetch_timeout))
            .collect();

        // Settle order, not registration order.
        let mut results = Vec::with_capacity(self.fetchers.len());
        while let Some(result) = pending.next().await {
            debug!("Source {} settled", result.source);
            results.push(result);
        }
        drop(pending);
        drop(transport);

        let bundle = combine_results(results);
        let failed = bundle.failed_count();
        if failed > 0 {
            warn!(
                "{} of {} sources failed this cycle",
                failed,
                bundle.sources.len()
            );
        }
        info!("Gathered bundle with {} sources", bundle.sources.len());

        Ok(bundle)
    }
}

/// Combine fetch results into a bundle keyed by source.
///
/// When two results share a source, the later one in `results` wins.
pub fn combine_results(results: Vec<SourceResult>) -> MarketDataBundle {
    let mut sources = BTreeMap::new();

    for result in results {
        let source = result.source;
        if sources.insert(source, SourceEntry::from(result)).is_some() {
            debug!("Duplicate result for {}, keeping the later one", source);
        }
    }

    MarketDataBundle {
        timestamp: Utc::now(),
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceOutcome;
    use crate::sources::testing::{FakeConnector, FakeTransport};
    use serde_json::json;

    const TRENDS: &str = "https://api.example.com/trends";
    const COMPETITORS: &str = "https://api.example.com/competitors";
    const MARKET_DATA: &str = "https://api.example.com/market-data";

    fn aggregator(transport: FakeTransport) -> (Aggregator, Arc<FakeConnector>) {
        let connector = Arc::new(FakeConnector::new(transport));
        let aggregator = Aggregator::from_config(&Config::default(), connector.clone());
        (aggregator, connector)
    }

    #[tokio::test]
    async fn test_partial_failure_scenario() {
        let transport = FakeTransport::new()
            .status(TRENDS, 500, "")
            .json(COMPETITORS, r#"{"competitors":[]}"#)
            .json(MARKET_DATA, r#"{"segments":[]}"#);
        let (aggregator, _) = aggregator(transport);

        let bundle = aggregator.gather().await.unwrap();

        assert_eq!(bundle.sources.len(), 4);
        assert_eq!(
            bundle.get(SourceId::IndustryTrends).unwrap().error(),
            Some("Failed to fetch data: 500")
        );
        assert_eq!(
            bundle.data(SourceId::CompetitorData),
            Some(&json!({"competitors": []}))
        );
        assert_eq!(
            bundle.data(SourceId::MarketDemands),
            Some(&json!({"segments": []}))
        );
        assert_eq!(
            bundle.data(SourceId::SocialMedia),
            Some(&json!({"trends": []}))
        );
        assert_eq!(bundle.failed_count(), 1);
    }

    #[tokio::test]
    async fn test_every_source_present_when_all_fail() {
        let transport = FakeTransport::new()
            .status(TRENDS, 503, "")
            .status(COMPETITORS, 404, "")
            .json(MARKET_DATA, "not json");
        let (aggregator, _) = aggregator(transport);

        let bundle = aggregator.gather().await.unwrap();

        for source in SourceId::ALL {
            assert!(bundle.get(source).is_some(), "missing {}", source);
        }
        assert_eq!(bundle.failed_count(), 3);
    }

    #[tokio::test]
    async fn test_completeness_for_every_failure_combination() {
        let urls = [TRENDS, COMPETITORS, MARKET_DATA];
        for mask in 0u8..8 {
            let mut transport = FakeTransport::new();
            for (i, url) in urls.iter().enumerate() {
                transport = if mask & (1 << i) != 0 {
                    transport.status(url, 500, "")
                } else {
                    transport.json(url, "{}")
                };
            }
            let (aggregator, _) = aggregator(transport);

            let bundle = aggregator.gather().await.unwrap();
            assert_eq!(bundle.sources.len(), 4, "mask {:03b}", mask);
            assert_eq!(bundle.failed_count(), mask.count_ones() as usize);
        }
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let delay = Duration::from_millis(200);
        let transport = FakeTransport::new()
            .json(TRENDS, "{}")
            .delay(TRENDS, delay)
            .json(COMPETITORS, "{}")
            .delay(COMPETITORS, delay)
            .json(MARKET_DATA, "{}")
            .delay(MARKET_DATA, delay);
        let (aggregator, _) = aggregator(transport);

        let started = std::time::Instant::now();
        aggregator.gather().await.unwrap();
        assert!(started.elapsed() < delay * 3);
    }

    #[tokio::test]
    async fn test_acquisition_failure_fails_gather_before_fetching() {
        let transport = FakeTransport::new().json(TRENDS, "{}");
        let connector = Arc::new(FakeConnector::failing_after(transport.clone(), 0));
        let aggregator = Aggregator::from_config(&Config::default(), connector);

        let err = aggregator.gather().await.unwrap_err();
        assert!(matches!(err, ResearchError::Connection(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_connection_acquired_per_gather() {
        let (aggregator, connector) = aggregator(FakeTransport::new());
        aggregator.gather().await.unwrap();
        aggregator.gather().await.unwrap();
        assert_eq!(connector.acquisitions(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_source_keeps_last_settled() {
        let slow = "https://slow.example.com/";
        let fast = "https://fast.example.com/";
        let transport = FakeTransport::new()
            .json(slow, r#"{"which":"slow"}"#)
            .delay(slow, Duration::from_millis(80))
            .json(fast, r#"{"which":"fast"}"#);
        let connector = Arc::new(FakeConnector::new(transport));
        let aggregator = Aggregator::new(
            vec![
                SourceFetcher::http(SourceId::IndustryTrends, "slow", slow),
                SourceFetcher::http(SourceId::IndustryTrends, "fast", fast),
            ],
            connector,
            Duration::from_secs(5),
        );

        let bundle = aggregator.gather().await.unwrap();

        assert_eq!(bundle.sources.len(), 1);
        assert_eq!(
            bundle.data(SourceId::IndustryTrends),
            Some(&json!({"which": "slow"}))
        );
    }

    #[test]
    fn test_combine_results_last_write_wins() {
        let results = vec![
            SourceResult::data(SourceId::CompetitorData, json!({"n": 1})),
            SourceResult::error(SourceId::MarketDemands, "down"),
            SourceResult::error(SourceId::CompetitorData, "later failure"),
        ];

        let bundle = combine_results(results);

        assert_eq!(bundle.sources.len(), 2);
        assert_eq!(
            bundle.get(SourceId::CompetitorData).unwrap().outcome,
            SourceOutcome::Error("later failure".to_string())
        );
    }

    #[test]
    fn test_combine_results_empty() {
        let bundle = combine_results(Vec::new());
        assert!(bundle.sources.is_empty());
    }
}
