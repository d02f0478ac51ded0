//! Insight synthesis from an analysis report and detected trends.

use crate::error::ResearchError;
use crate::models::{AnalysisReport, InsightBundle, RiskAssessment, RiskLevel, Trend, TrendClass};

/// Combine analysis and trends into key findings, recommendations and a
/// risk assessment. Any of the three may come out empty.
///
/// Trends parsed from source JSON always carry a finite momentum, so the
/// non-finite check only rejects trends that callers built by hand.
pub fn synthesize(
    report: &AnalysisReport,
    trends: &[Trend],
) -> Result<InsightBundle, ResearchError> {
    if let Some(bad) = trends.iter().find(|t| !t.momentum.is_finite()) {
        return Err(ResearchError::Insights(format!(
            "trend '{}' has a non-finite momentum",
            bad.name
        )));
    }

    Ok(InsightBundle {
        key_findings: key_findings(report),
        recommendations: trend_recommendations(trends),
        risk_assessment: assess_risk(report, trends),
    })
}

fn key_findings(report: &AnalysisReport) -> Vec<String> {
    let analysis = &report.analysis;
    let mut findings = Vec::new();

    let sentiment = &analysis.market_sentiment;
    if !sentiment.by_sector.is_empty() || !sentiment.by_product.is_empty() {
        let mood = if sentiment.overall > 0.1 {
            "positive"
        } else if sentiment.overall < -0.1 {
            "negative"
        } else {
            "neutral"
        };
        findings.push(format!(
            "Overall market sentiment is {} ({:+.2})",
            mood, sentiment.overall
        ));
    }

    if !analysis.market_trends.emerging_trends.is_empty() {
        findings.push(format!(
            "Emerging trends: {}",
            analysis.market_trends.emerging_trends.join(", ")
        ));
    }

    if !analysis.competitor_analysis.market_leaders.is_empty() {
        findings.push(format!(
            "Market leaders: {}",
            analysis.competitor_analysis.market_leaders.join(", ")
        ));
    }

    if let Some(top) = analysis.opportunity_areas.first() {
        findings.push(format!(
            "Strongest opportunity area is {} (score {:.2})",
            top.area, top.score
        ));
    }

    findings
}

fn trend_recommendations(trends: &[Trend]) -> Vec<String> {
    trends
        .iter()
        .filter_map(|t| match t.classification {
            TrendClass::Emerging => Some(format!("Invest early in {}", t.name)),
            TrendClass::Declining => Some(format!("Reduce dependence on {}", t.name)),
            TrendClass::Stable => None,
        })
        .collect()
}

fn assess_risk(report: &AnalysisReport, trends: &[Trend]) -> RiskAssessment {
    let factors = report.analysis.risk_factors.clone();
    let declining_trends: Vec<String> = trends
        .iter()
        .filter(|t| t.classification == TrendClass::Declining)
        .map(|t| t.name.clone())
        .collect();

    let mut overall = factors
        .iter()
        .map(|f| f.level)
        .max()
        .unwrap_or(RiskLevel::Low);
    if overall == RiskLevel::Low && !declining_trends.is_empty() {
        overall = RiskLevel::Medium;
    }

    RiskAssessment {
        overall,
        factors,
        declining_trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        MarketAnalysis, MarketSentiment, OpportunityArea, RiskFactor, SourceId, TrendsAnalysis,
    };
    use chrono::Utc;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn report(analysis: MarketAnalysis) -> AnalysisReport {
        AnalysisReport {
            timestamp: Utc::now(),
            analysis,
            recommendations: Vec::new(),
        }
    }

    fn trend(name: &str, classification: TrendClass, momentum: f64) -> Trend {
        Trend {
            name: name.to_string(),
            classification,
            source: SourceId::IndustryTrends,
            momentum,
            payload: json!({"name": name}),
        }
    }

    #[test]
    fn test_empty_inputs_give_empty_insights() {
        let insights = assert_ok!(synthesize(&report(MarketAnalysis::default()), &[]));
        assert_eq!(insights, InsightBundle::default());
    }

    #[test]
    fn test_findings_and_recommendations() {
        let analysis = MarketAnalysis {
            market_trends: TrendsAnalysis {
                emerging_trends: vec!["ai".to_string()],
                ..Default::default()
            },
            opportunity_areas: vec![OpportunityArea {
                area: "healthcare".to_string(),
                score: 0.4,
                rationale: "Demand growing 40.0%".to_string(),
            }],
            market_sentiment: MarketSentiment {
                overall: 0.5,
                by_product: [("ai".to_string(), 0.5)].into_iter().collect(),
                ..Default::default()
            },
            ..Default::default()
        };
        let trends = vec![
            trend("ai", TrendClass::Emerging, 0.3),
            trend("steady", TrendClass::Stable, 0.0),
            trend("fax", TrendClass::Declining, -0.2),
        ];

        let insights = assert_ok!(synthesize(&report(analysis), &trends));

        assert_eq!(
            insights.key_findings,
            vec![
                "Overall market sentiment is positive (+0.50)",
                "Emerging trends: ai",
                "Strongest opportunity area is healthcare (score 0.40)",
            ]
        );
        assert_eq!(
            insights.recommendations,
            vec!["Invest early in ai", "Reduce dependence on fax"]
        );
        assert_eq!(insights.risk_assessment.declining_trends, vec!["fax"]);
        assert_eq!(insights.risk_assessment.overall, RiskLevel::Medium);
    }

    #[test]
    fn test_overall_risk_is_highest_factor() {
        let analysis = MarketAnalysis {
            risk_factors: vec![
                RiskFactor {
                    description: "Shrinking demand in print".to_string(),
                    level: RiskLevel::High,
                    source: SourceId::MarketDemands,
                },
                RiskFactor {
                    description: "Declining trend: fax".to_string(),
                    level: RiskLevel::Low,
                    source: SourceId::IndustryTrends,
                },
            ],
            ..Default::default()
        };

        let insights = assert_ok!(synthesize(&report(analysis), &[]));
        assert_eq!(insights.risk_assessment.overall, RiskLevel::High);
        assert_eq!(insights.risk_assessment.factors.len(), 2);
    }

    #[test]
    fn test_non_finite_momentum_is_rejected() {
        let trends = vec![trend("glitch", TrendClass::Emerging, f64::NAN)];
        let err = assert_err!(synthesize(&report(MarketAnalysis::default()), &trends));
        assert_eq!(
            err.to_string(),
            "Error generating insights: trend 'glitch' has a non-finite momentum"
        );
    }
}
