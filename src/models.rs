//! Data models for the research pipeline.
//!
//! This module contains the value objects produced and consumed by each
//! stage of a research cycle: per-source fetch results, the combined
//! bundle, the analysis report, trends, opportunities, and insights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an external market data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Industry trend feed
    IndustryTrends,
    /// Competitor intelligence
    CompetitorData,
    /// Market demand figures
    MarketDemands,
    /// Social media signals
    SocialMedia,
}

impl SourceId {
    /// All sources a research cycle gathers from, in gather order.
    pub const ALL: [SourceId; 4] = [
        SourceId::IndustryTrends,
        SourceId::CompetitorData,
        SourceId::MarketDemands,
        SourceId::SocialMedia,
    ];

    /// Returns the wire name of the source.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::IndustryTrends => "industry_trends",
            SourceId::CompetitorData => "competitor_data",
            SourceId::MarketDemands => "market_demands",
            SourceId::SocialMedia => "social_media",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single fetch produced. Exactly one of payload or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOutcome {
    Data(Value),
    Error(String),
}

/// Tagged, timestamped result of fetching one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub source: SourceId,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
    pub timestamp: DateTime<Utc>,
}

impl SourceResult {
    /// Creates a successful result stamped with the current time.
    pub fn data(source: SourceId, data: Value) -> Self {
        Self {
            source,
            outcome: SourceOutcome::Data(data),
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed result stamped with the current time.
    pub fn error(source: SourceId, message: impl Into<String>) -> Self {
        Self {
            source,
            outcome: SourceOutcome::Error(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Error(_))
    }
}

/// One source's slot in the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(flatten)]
    pub outcome: SourceOutcome,
    pub timestamp: DateTime<Utc>,
}

impl SourceEntry {
    /// Returns the payload if the fetch succeeded.
    pub fn data(&self) -> Option<&Value> {
        match &self.outcome {
            SourceOutcome::Data(v) => Some(v),
            SourceOutcome::Error(_) => None,
        }
    }

    /// Returns the error message if the fetch failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SourceOutcome::Data(_) => None,
            SourceOutcome::Error(e) => Some(e),
        }
    }
}

impl From<SourceResult> for SourceEntry {
    fn from(result: SourceResult) -> Self {
        Self {
            outcome: result.outcome,
            timestamp: result.timestamp,
        }
    }
}

/// The combined snapshot of all sources for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataBundle {
    pub timestamp: DateTime<Utc>,
    pub sources: BTreeMap<SourceId, SourceEntry>,
}

impl MarketDataBundle {
    pub fn get(&self, source: SourceId) -> Option<&SourceEntry> {
        self.sources.get(&source)
    }

    /// Payload of a source, `None` when the source failed or is missing.
    pub fn data(&self, source: SourceId) -> Option<&Value> {
        self.get(source).and_then(SourceEntry::data)
    }

    /// Number of sources whose fetch failed.
    pub fn failed_count(&self) -> usize {
        self.sources.values().filter(|e| e.error().is_some()).count()
    }
}

/// Trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendClass {
    Emerging,
    Declining,
    Stable,
}

impl fmt::Display for TrendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendClass::Emerging => write!(f, "Emerging"),
            TrendClass::Declining => write!(f, "Declining"),
            TrendClass::Stable => write!(f, "Stable"),
        }
    }
}

/// Trend facet output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendsAnalysis {
    pub emerging_trends: Vec<String>,
    pub declining_trends: Vec<String>,
    pub stable_trends: Vec<String>,
}

/// Competitor facet output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub market_leaders: Vec<String>,
    pub emerging_competitors: Vec<String>,
    pub competitive_advantages: BTreeMap<String, Vec<String>>,
}

/// A market area worth pursuing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityArea {
    pub area: String,
    pub score: f64,
    pub rationale: String,
}

/// Risk level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

impl RiskLevel {
    /// Returns an emoji representation of the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
        }
    }
}

/// A single identified market risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub description: String,
    pub level: RiskLevel,
    pub source: SourceId,
}

/// Sentiment facet output. Scores are in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub overall: f64,
    pub by_sector: BTreeMap<String, f64>,
    pub by_product: BTreeMap<String, f64>,
}

/// Growth facet output, per market segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthPotential {
    pub short_term: BTreeMap<String, f64>,
    pub medium_term: BTreeMap<String, f64>,
    pub long_term: BTreeMap<String, f64>,
}

/// All six analysis facets for one bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_trends: TrendsAnalysis,
    pub competitor_analysis: CompetitorAnalysis,
    pub opportunity_areas: Vec<OpportunityArea>,
    pub risk_factors: Vec<RiskFactor>,
    pub market_sentiment: MarketSentiment,
    pub growth_potential: GrowthPotential,
}

/// Priority of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// An actionable recommendation derived from the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub area: String,
    pub action: String,
}

/// The analyzer's output. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub timestamp: DateTime<Utc>,
    pub analysis: MarketAnalysis,
    pub recommendations: Vec<Recommendation>,
}

/// A detected market trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub classification: TrendClass,
    pub source: SourceId,
    pub momentum: f64,
    /// The raw item the trend was read from.
    pub payload: Value,
}

/// A business opportunity derived from a trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub title: String,
    /// Name of the trend this was derived from.
    pub trend: String,
    pub score: f64,
    pub rationale: String,
}

/// Structured risk view over the analysis and trends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub declining_trends: Vec<String>,
}

/// Final actionable output of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightBundle {
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_assessment: RiskAssessment,
}

/// Terminal value of one research cycle.
///
/// Serializes to `{"status": "success", ...}` or
/// `{"status": "error", "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CycleResult {
    Success {
        market_analysis: AnalysisReport,
        trends: Vec<Trend>,
        opportunities: Vec<Opportunity>,
        insights: InsightBundle,
    },
    Error {
        error: String,
    },
}

impl CycleResult {
    pub fn error(message: impl Into<String>) -> Self {
        CycleResult::Error {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CycleResult::Success { .. })
    }

    /// The error message, if the cycle failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            CycleResult::Success { .. } => None,
            CycleResult::Error { error } => Some(error),
        }
    }

    /// Returns the status label used on the wire.
    pub fn status(&self) -> &'static str {
        match self {
            CycleResult::Success { .. } => "success",
            CycleResult::Error { .. } => "error",
        }
    }
}

/// Metadata attached to a written report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// 1-based cycle number within this process.
    pub cycle: u64,
    pub duration_seconds: f64,
}

/// A cycle result as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub metadata: ReportMetadata,
    pub result: CycleResult,
}
