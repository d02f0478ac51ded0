//! Trend detection and opportunity identification.
//!
//! Trends are read lazily from the trend-bearing sources of a bundle; the
//! returned [`TrendSeq`] can be iterated any number of times.

use crate::analysis::payload::{TrendItem, TREND_SOURCES};
use crate::error::ResearchError;
use crate::models::{MarketDataBundle, Opportunity, SourceId, Trend, TrendClass};
use serde_json::Value;
use tracing::debug;

/// Classify a momentum value against a threshold.
pub fn classify(momentum: f64, threshold: f64) -> TrendClass {
    if momentum >= threshold {
        TrendClass::Emerging
    } else if momentum <= -threshold {
        TrendClass::Declining
    } else {
        TrendClass::Stable
    }
}

/// Detects trends and derives opportunities from them.
#[derive(Debug, Clone, Copy)]
pub struct TrendEngine {
    threshold: f64,
}

impl TrendEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Prepare a lazy sequence of the bundle's trends.
    ///
    /// Fails if a trend-bearing source holds a `trends` value that is not a list.
    pub fn detect_trends<'a>(
        &self,
        bundle: &'a MarketDataBundle,
    ) -> Result<TrendSeq<'a>, ResearchError> {
        let mut lists = Vec::new();

        for source in TREND_SOURCES {
            let Some(list) = bundle.data(source).and_then(|d| d.get("trends")) else {
                continue;
            };
            match list.as_array() {
                Some(items) => lists.push((source, items.as_slice())),
                None => {
                    return Err(ResearchError::TrendDetection(format!(
                        "{}.trends is not a list",
                        source
                    )))
                }
            }
        }

        Ok(TrendSeq {
            lists,
            threshold: self.threshold,
        })
    }

    /// One opportunity per emerging trend, strongest first.
    pub fn identify_opportunities(&self, trends: &[Trend]) -> Vec<Opportunity> {
        let mut opportunities: Vec<Opportunity> = trends
            .iter()
            .filter(|t| t.classification == TrendClass::Emerging)
            .map(|t| Opportunity {
                title: format!("Capitalize on {}", t.name),
                trend: t.name.clone(),
                score: t.momentum,
                rationale: format!(
                    "{} momentum of {:+.2} reported by {}",
                    t.classification, t.momentum, t.source
                ),
            })
            .collect();

        opportunities.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!("Identified {} opportunities", opportunities.len());
        opportunities
    }
}

/// A restartable, finite sequence of trends borrowed from a bundle.
#[derive(Debug, Clone)]
pub struct TrendSeq<'a> {
    lists: Vec<(SourceId, &'a [Value])>,
    threshold: f64,
}

impl<'a> TrendSeq<'a> {
    /// Iterate the trends in discovery order. Items without a name are skipped.
    pub fn iter(&self) -> impl Iterator<Item = Trend> + 'a {
        let threshold = self.threshold;
        self.lists.clone().into_iter().flat_map(move |(source, items)| {
            items
                .iter()
                .filter_map(move |raw| to_trend(source, raw, threshold))
        })
    }
}

fn to_trend(source: SourceId, raw: &Value, threshold: f64) -> Option<Trend> {
    let item: TrendItem = serde_json::from_value(raw.clone()).ok()?;
    let name = item.name?;
    Some(Trend {
        name,
        classification: classify(item.momentum, threshold),
        source,
        momentum: item.momentum,
        payload: raw.clone(),
    })
}
