//! Analysis facets.
//!
//! Each facet is a pure function of the bundle. The defaults here read the
//! payload conventions in [`crate::analysis::payload`] and fall back to the
//! facet's empty shape when their sources have nothing to offer.

use super::payload;
use crate::models::{
    CompetitorAnalysis, GrowthPotential, MarketDataBundle, MarketSentiment, OpportunityArea,
    RiskFactor, RiskLevel, SourceId, TrendClass, TrendsAnalysis,
};
use crate::trends::classify;
use anyhow::Result;
use std::collections::BTreeMap;

/// One independent analysis dimension.
pub trait AnalysisFacet: Send + Sync {
    type Output;

    fn name(&self) -> &'static str;

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<Self::Output>;
}

/// Buckets trend names by classification.
pub struct TrendFacet {
    pub threshold: f64,
}

impl AnalysisFacet for TrendFacet {
    type Output = TrendsAnalysis;

    fn name(&self) -> &'static str {
        "market_trends"
    }

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<TrendsAnalysis> {
        let mut out = TrendsAnalysis::default();

        for (_, item) in payload::trend_items(bundle)? {
            let Some(name) = item.name else { continue };
            let bucket = match classify(item.momentum, self.threshold) {
                TrendClass::Emerging => &mut out.emerging_trends,
                TrendClass::Declining => &mut out.declining_trends,
                TrendClass::Stable => &mut out.stable_trends,
            };
            if !bucket.contains(&name) {
                bucket.push(name);
            }
        }

        Ok(out)
    }
}

/// Splits competitors into leaders and challengers.
pub struct CompetitorFacet {
    pub leader_share: f64,
    pub emerging_growth: f64,
}

impl AnalysisFacet for CompetitorFacet {
    type Output = CompetitorAnalysis;

    fn name(&self) -> &'static str {
        "competitor_analysis"
    }

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<CompetitorAnalysis> {
        let mut competitors: Vec<_> = payload::competitors(bundle)?
            .into_iter()
            .filter(|c| c.name.is_some())
            .collect();
        competitors.sort_by(|a, b| b.market_share.total_cmp(&a.market_share));

        let mut out = CompetitorAnalysis::default();
        for competitor in competitors {
            let Some(name) = competitor.name else { continue };

            if competitor.market_share >= self.leader_share {
                out.market_leaders.push(name.clone());
            } else if competitor.growth >= self.emerging_growth {
                out.emerging_competitors.push(name.clone());
            }

            if !competitor.advantages.is_empty() {
                out.competitive_advantages.insert(name, competitor.advantages);
            }
        }

        Ok(out)
    }
}

/// Segments whose demand grows fast enough to pursue.
pub struct OpportunityFacet {
    pub min_growth: f64,
}

impl AnalysisFacet for OpportunityFacet {
    type Output = Vec<OpportunityArea>;

    fn name(&self) -> &'static str {
        "opportunity_areas"
    }

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<Vec<OpportunityArea>> {
        let mut areas: Vec<OpportunityArea> = payload::segments(bundle)?
            .into_iter()
            .filter(|s| s.demand_growth >= self.min_growth)
            .filter_map(|s| {
                let name = s.name?;
                Some(OpportunityArea {
                    rationale: format!("Demand growing {:.1}%", s.demand_growth * 100.0),
                    area: name,
                    score: s.demand_growth,
                })
            })
            .collect();

        areas.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(areas)
    }
}

/// Declining trends and shrinking segments.
pub struct RiskFacet {
    pub threshold: f64,
}

impl RiskFacet {
    fn level(&self, magnitude: f64) -> RiskLevel {
        if magnitude >= self.threshold * 3.0 {
            RiskLevel::High
        } else if magnitude >= self.threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl AnalysisFacet for RiskFacet {
    type Output = Vec<RiskFactor>;

    fn name(&self) -> &'static str {
        "risk_factors"
    }

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<Vec<RiskFactor>> {
        let mut risks = Vec::new();

        for (source, item) in payload::trend_items(bundle)? {
            let Some(name) = item.name else { continue };
            if classify(item.momentum, self.threshold) == TrendClass::Declining {
                risks.push(RiskFactor {
                    description: format!("Declining trend: {}", name),
                    level: self.level(-item.momentum),
                    source,
                });
            }
        }

        for segment in payload::segments(bundle)? {
            let Some(name) = segment.name else { continue };
            if segment.demand_growth < 0.0 {
                risks.push(RiskFactor {
                    description: format!("Shrinking demand in {}", name),
                    level: self.level(-segment.demand_growth),
                    source: SourceId::MarketDemands,
                });
            }
        }

        risks.sort_by_key(|r| std::cmp::Reverse(r.level));
        Ok(risks)
    }
}

/// Averages sentiment scores by sector and by product.
pub struct SentimentFacet;

impl AnalysisFacet for SentimentFacet {
    type Output = MarketSentiment;

    fn name(&self) -> &'static str {
        "market_sentiment"
    }

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<MarketSentiment> {
        let mut by_sector: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut by_product: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for (_, item) in payload::trend_items(bundle)? {
            if let (Some(name), Some(score)) = (item.name, item.sentiment) {
                by_product.entry(name).or_default().push(score);
            }
        }

        for segment in payload::segments(bundle)? {
            let Some(score) = segment.sentiment else { continue };
            if let Some(sector) = segment.sector.or(segment.name) {
                by_sector.entry(sector).or_default().push(score);
            }
        }

        let all: Vec<f64> = by_sector
            .values()
            .chain(by_product.values())
            .flatten()
            .copied()
            .collect();

        Ok(MarketSentiment {
            overall: mean(&all),
            by_sector: averaged(by_sector),
            by_product: averaged(by_product),
        })
    }
}

/// Growth outlook per segment over three horizons.
pub struct GrowthFacet;

impl AnalysisFacet for GrowthFacet {
    type Output = GrowthPotential;

    fn name(&self) -> &'static str {
        "growth_potential"
    }

    fn evaluate(&self, bundle: &MarketDataBundle) -> Result<GrowthPotential> {
        let mut out = GrowthPotential::default();

        for segment in payload::segments(bundle)? {
            let Some(name) = segment.name else { continue };
            let outlook = segment.outlook.unwrap_or_default();

            out.short_term.insert(
                name.clone(),
                outlook.short_term.unwrap_or(segment.demand_growth),
            );
            if let Some(v) = outlook.medium_term {
                out.medium_term.insert(name.clone(), v);
            }
            if let Some(v) = outlook.long_term {
                out.long_term.insert(name, v);
            }
        }

        Ok(out)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).clamp(-1.0, 1.0)
}

fn averaged(groups: BTreeMap<String, Vec<f64>>) -> BTreeMap<String, f64> {
    groups
        .into_iter()
        .map(|(key, values)| (key, mean(&values)))
        .collect()
}
