//! Market analysis over a gathered bundle.

use super::facets::{
    AnalysisFacet, CompetitorFacet, GrowthFacet, OpportunityFacet, RiskFacet, SentimentFacet,
    TrendFacet,
};
use crate::config::AnalysisConfig;
use crate::error::ResearchError;
use crate::models::{
    AnalysisReport, CompetitorAnalysis, GrowthPotential, MarketAnalysis, MarketDataBundle,
    MarketSentiment, OpportunityArea, Priority, Recommendation, RiskFactor, RiskLevel,
    TrendsAnalysis,
};
use chrono::Utc;
use tracing::{debug, info};

type Facet<T> = Box<dyn AnalysisFacet<Output = T>>;

/// Opportunity score at which expanding is a high-priority action.
const HIGH_PRIORITY_SCORE: f64 = 0.25;

/// Runs the six analysis facets and derives recommendations.
pub struct Analyzer {
    trends: Facet<TrendsAnalysis>,
    competitors: Facet<CompetitorAnalysis>,
    opportunities: Facet<Vec<OpportunityArea>>,
    risks: Facet<Vec<RiskFactor>>,
    sentiment: Facet<MarketSentiment>,
    growth: Facet<GrowthPotential>,
}

impl Analyzer {
    /// Create an analyzer with the default facets.
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            trends: Box::new(TrendFacet {
                threshold: config.trend_threshold,
            }),
            competitors: Box::new(CompetitorFacet {
                leader_share: config.leader_share,
                emerging_growth: config.emerging_growth,
            }),
            opportunities: Box::new(OpportunityFacet {
                min_growth: config.opportunity_growth,
            }),
            risks: Box::new(RiskFacet {
                threshold: config.trend_threshold,
            }),
            sentiment: Box::new(SentimentFacet),
            growth: Box::new(GrowthFacet),
        }
    }

    #[allow(dead_code)] // Extension point for alternative algorithms
    pub fn with_trend_facet(
        mut self,
        facet: impl AnalysisFacet<Output = TrendsAnalysis> + 'static,
    ) -> Self {
        self.trends = Box::new(facet);
        self
    }

    #[allow(dead_code)]
    pub fn with_competitor_facet(
        mut self,
        facet: impl AnalysisFacet<Output = CompetitorAnalysis> + 'static,
    ) -> Self {
        self.competitors = Box::new(facet);
        self
    }

    #[allow(dead_code)]
    pub fn with_opportunity_facet(
        mut self,
        facet: impl AnalysisFacet<Output = Vec<OpportunityArea>> + 'static,
    ) -> Self {
        self.opportunities = Box::new(facet);
        self
    }

    #[allow(dead_code)]
    pub fn with_risk_facet(
        mut self,
        facet: impl AnalysisFacet<Output = Vec<RiskFactor>> + 'static,
    ) -> Self {
        self.risks = Box::new(facet);
        self
    }

    #[allow(dead_code)]
    pub fn with_sentiment_facet(
        mut self,
        facet: impl AnalysisFacet<Output = MarketSentiment> + 'static,
    ) -> Self {
        self.sentiment = Box::new(facet);
        self
    }

    #[allow(dead_code)]
    pub fn with_growth_facet(
        mut self,
        facet: impl AnalysisFacet<Output = GrowthPotential> + 'static,
    ) -> Self {
        self.growth = Box::new(facet);
        self
    }

    /// Analyze a bundle into a report.
    ///
    /// A failing facet fails the whole analysis; no partial report is returned.
    pub fn analyze(&self, bundle: &MarketDataBundle) -> Result<AnalysisReport, ResearchError> {
        info!("Analyzing bundle with {} sources", bundle.sources.len());

        let analysis = MarketAnalysis {
            market_trends: evaluate(self.trends.as_ref(), bundle)?,
            competitor_analysis: evaluate(self.competitors.as_ref(), bundle)?,
            opportunity_areas: evaluate(self.opportunities.as_ref(), bundle)?,
            risk_factors: evaluate(self.risks.as_ref(), bundle)?,
            market_sentiment: evaluate(self.sentiment.as_ref(), bundle)?,
            growth_potential: evaluate(self.growth.as_ref(), bundle)?,
        };

        let recommendations = generate_recommendations(&analysis);
        info!(
            "Analysis complete: {} recommendations",
            recommendations.len()
        );

        Ok(AnalysisReport {
            timestamp: Utc::now(),
            analysis,
            recommendations,
        })
    }
}

fn evaluate<F>(facet: &F, bundle: &MarketDataBundle) -> Result<F::Output, ResearchError>
where
    F: AnalysisFacet + ?Sized,
{
    debug!("Evaluating facet {}", facet.name());
    facet
        .evaluate(bundle)
        .map_err(|e| ResearchError::Analysis(format!("{}: {:#}", facet.name(), e)))
}

/// Derive recommendations from a finished analysis, highest priority first.
pub fn generate_recommendations(analysis: &MarketAnalysis) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    for risk in &analysis.risk_factors {
        let priority = match risk.level {
            RiskLevel::High => Priority::High,
            RiskLevel::Medium => Priority::Medium,
            RiskLevel::Low => continue,
        };
        recs.push(Recommendation {
            priority,
            area: risk.source.to_string(),
            action: format!("Mitigate exposure: {}", risk.description),
        });
    }

    for area in &analysis.opportunity_areas {
        recs.push(Recommendation {
            priority: if area.score >= HIGH_PRIORITY_SCORE {
                Priority::High
            } else {
                Priority::Medium
            },
            area: area.area.clone(),
            action: format!("Expand into {} ({})", area.area, area.rationale),
        });
    }

    for trend in &analysis.market_trends.emerging_trends {
        recs.push(Recommendation {
            priority: Priority::Medium,
            area: trend.clone(),
            action: format!("Build capabilities around {}", trend),
        });
    }

    for competitor in &analysis.competitor_analysis.emerging_competitors {
        recs.push(Recommendation {
            priority: Priority::Low,
            area: competitor.clone(),
            action: format!("Monitor emerging competitor {}", competitor),
        });
    }

    recs.sort_by_key(|r| std::cmp::Reverse(r.priority));
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::combine_results;
    use crate::models::{SourceId, SourceResult};
    use anyhow::anyhow;
    use serde_json::json;

    struct BrokenSentiment;

    impl AnalysisFacet for BrokenSentiment {
        type Output = MarketSentiment;

        fn name(&self) -> &'static str {
            "market_sentiment"
        }

        fn evaluate(&self, _bundle: &MarketDataBundle) -> anyhow::Result<MarketSentiment> {
            Err(anyhow!("scoring model unavailable"))
        }
    }

    struct FixedTrends;

    impl AnalysisFacet for FixedTrends {
        type Output = TrendsAnalysis;

        fn name(&self) -> &'static str {
            "market_trends"
        }

        fn evaluate(&self, _bundle: &MarketDataBundle) -> anyhow::Result<TrendsAnalysis> {
            Ok(TrendsAnalysis {
                emerging_trends: vec!["quantum".to_string()],
                ..Default::default()
            })
        }
    }

    fn all_failed() -> MarketDataBundle {
        combine_results(
            SourceId::ALL
                .iter()
                .map(|s| SourceResult::error(*s, "unreachable"))
                .collect(),
        )
    }

    #[test]
    fn test_degraded_bundle_yields_empty_report() {
        let report = Analyzer::new(&AnalysisConfig::default())
            .analyze(&all_failed())
            .unwrap();

        assert_eq!(report.analysis, MarketAnalysis::default());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_facet_failure_fails_analysis() {
        let analyzer =
            Analyzer::new(&AnalysisConfig::default()).with_sentiment_facet(BrokenSentiment);

        let err = analyzer.analyze(&all_failed()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error analyzing market data: market_sentiment: scoring model unavailable"
        );
    }

    #[test]
    fn test_malformed_payload_fails_analysis() {
        let bundle = combine_results(vec![SourceResult::data(
            SourceId::CompetitorData,
            json!({"competitors": {"not": "a list"}}),
        )]);

        let err = Analyzer::new(&AnalysisConfig::default())
            .analyze(&bundle)
            .unwrap_err();
        assert!(matches!(err, ResearchError::Analysis(_)));
        assert!(err.to_string().contains("competitor_analysis"));
    }

    #[test]
    fn test_substituted_facet_is_used() {
        let report = Analyzer::new(&AnalysisConfig::default())
            .with_trend_facet(FixedTrends)
            .analyze(&all_failed())
            .unwrap();

        assert_eq!(report.analysis.market_trends.emerging_trends, vec!["quantum"]);
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(
            report.recommendations[0].action,
            "Build capabilities around quantum"
        );
    }

    #[test]
    fn test_recommendations_ordered_by_priority() {
        let analysis = MarketAnalysis {
            competitor_analysis: CompetitorAnalysis {
                emerging_competitors: vec!["Initech".to_string()],
                ..Default::default()
            },
            opportunity_areas: vec![
                OpportunityArea {
                    area: "enterprise".to_string(),
                    score: 0.3,
                    rationale: "Demand growing 30.0%".to_string(),
                },
                OpportunityArea {
                    area: "smb".to_string(),
                    score: 0.12,
                    rationale: "Demand growing 12.0%".to_string(),
                },
            ],
            risk_factors: vec![RiskFactor {
                description: "Declining trend: fax".to_string(),
                level: RiskLevel::Low,
                source: SourceId::IndustryTrends,
            }],
            ..Default::default()
        };

        let recs = generate_recommendations(&analysis);
        let priorities: Vec<_> = recs.iter().map(|r| r.priority).collect();

        assert_eq!(
            priorities,
            vec![Priority::High, Priority::Medium, Priority::Low]
        );
        assert_eq!(recs[0].area, "enterprise");
        assert_eq!(recs[2].action, "Monitor emerging competitor Initech");
    }
}
