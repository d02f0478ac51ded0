//! Typed views over source payloads.
//!
//! Sources deliver opaque JSON. The default facets read it through these
//! lenient item types: a missing list is empty, a missing field takes its
//! default and an unreadable entry is skipped. Only a `key` that is present
//! but not a list is an error.

use crate::models::{MarketDataBundle, SourceId};
use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Sources whose payload carries a `trends` list.
pub const TREND_SOURCES: [SourceId; 2] = [SourceId::IndustryTrends, SourceId::SocialMedia];

/// One entry of a `trends` list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrendItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub momentum: f64,
    #[serde(default)]
    pub sentiment: Option<f64>,
}

/// One entry of a `competitors` list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompetitorItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market_share: f64,
    #[serde(default)]
    pub growth: f64,
    #[serde(default)]
    pub advantages: Vec<String>,
}

/// Growth outlook of a segment over three horizons.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Outlook {
    #[serde(default)]
    pub short_term: Option<f64>,
    #[serde(default)]
    pub medium_term: Option<f64>,
    #[serde(default)]
    pub long_term: Option<f64>,
}

/// One entry of a `segments` list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SegmentItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub demand_growth: f64,
    #[serde(default)]
    pub sentiment: Option<f64>,
    #[serde(default)]
    pub outlook: Option<Outlook>,
}

/// Read the `key` list of a source's payload.
///
/// Returns an empty list when the source failed or has no such key.
/// Entries that do not fit `T` are skipped.
pub fn items<T: DeserializeOwned>(
    bundle: &MarketDataBundle,
    source: SourceId,
    key: &str,
) -> Result<Vec<T>> {
    let Some(list) = bundle.data(source).and_then(|data| data.get(key)) else {
        return Ok(Vec::new());
    };
    let Some(entries) = list.as_array() else {
        bail!("{}.{} is malformed: expected a list", source, key);
    };

    let parsed: Vec<T> = entries
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect();
    if parsed.len() < entries.len() {
        debug!(
            "Skipped {} unreadable entries in {}.{}",
            entries.len() - parsed.len(),
            source,
            key
        );
    }
    Ok(parsed)
}

/// Trend items of every trend-bearing source, in source order.
pub fn trend_items(bundle: &MarketDataBundle) -> Result<Vec<(SourceId, TrendItem)>> {
    let mut out = Vec::new();
    for source in TREND_SOURCES {
        for item in items::<TrendItem>(bundle, source, "trends")? {
            out.push((source, item));
        }
    }
    Ok(out)
}

pub fn competitors(bundle: &MarketDataBundle) -> Result<Vec<CompetitorItem>> {
    items(bundle, SourceId::CompetitorData, "competitors")
}

pub fn segments(bundle: &MarketDataBundle) -> Result<Vec<SegmentItem>> {
    items(bundle, SourceId::MarketDemands, "segments")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::combine_results;
    use crate::models::SourceResult;
    use serde_json::json;

    #[test]
    fn test_missing_source_and_key_are_empty() {
        let bundle = combine_results(vec![
            SourceResult::error(SourceId::CompetitorData, "down"),
            SourceResult::data(SourceId::MarketDemands, json!({})),
        ]);

        assert!(competitors(&bundle).unwrap().is_empty());
        assert!(segments(&bundle).unwrap().is_empty());
        assert!(trend_items(&bundle).unwrap().is_empty());
    }

    #[test]
    fn test_partial_items_take_defaults() {
        let bundle = combine_results(vec![SourceResult::data(
            SourceId::CompetitorData,
            json!({"competitors": [{"name": "Acme"}]}),
        )]);

        let parsed = competitors(&bundle).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name.as_deref(), Some("Acme"));
        assert_eq!(parsed[0].market_share, 0.0);
        assert!(parsed[0].advantages.is_empty());
    }

    #[test]
    fn test_wrong_list_type_is_an_error() {
        let bundle = combine_results(vec![SourceResult::data(
            SourceId::MarketDemands,
            json!({"segments": "lots"}),
        )]);

        let err = segments(&bundle).unwrap_err();
        assert!(err.to_string().contains("market_demands.segments is malformed"));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let bundle = combine_results(vec![SourceResult::data(
            SourceId::IndustryTrends,
            json!({"trends": [
                "garbage",
                {"name": "x", "momentum": null},
                {"name": "ai", "momentum": 0.3},
                42
            ]}),
        )]);

        let parsed = trend_items(&bundle).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].1.name.as_deref(), Some("ai"));
        assert_eq!(parsed[0].1.momentum, 0.3);
    }

    #[test]
    fn test_trend_items_follow_source_order() {
        let bundle = combine_results(vec![
            SourceResult::data(SourceId::SocialMedia, json!({"trends": [{"name": "b"}]})),
            SourceResult::data(SourceId::IndustryTrends, json!({"trends": [{"name": "a"}]})),
        ]);

        let names: Vec<_> = trend_items(&bundle)
            .unwrap()
            .into_iter()
            .map(|(source, item)| (source, item.name.unwrap()))
            .collect();
        assert_eq!(
            names,
            vec![
                (SourceId::IndustryTrends, "a".to_string()),
                (SourceId::SocialMedia, "b".to_string())
            ]
        );
    }
}
