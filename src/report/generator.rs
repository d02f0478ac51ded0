//! Report generation.
//!
//! Renders a [`ResearchReport`] as Markdown or JSON. A failed cycle gets a
//! short error report instead of the analysis sections.

use crate::models::{
    AnalysisReport, CycleResult, InsightBundle, Opportunity, ReportMetadata, ResearchReport,
    RiskAssessment, Trend, TrendClass,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ResearchReport) -> String {
    let mut output = String::new();

    output.push_str("# Market Research Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata, &report.result));

    match &report.result {
        CycleResult::Success {
            market_analysis,
            trends,
            opportunities,
            insights,
        } => {
            output.push_str(&generate_findings_section(insights));
            output.push_str(&generate_analysis_section(market_analysis));
            output.push_str(&generate_trends_section(trends));
            output.push_str(&generate_opportunities_section(opportunities));
            output.push_str(&generate_recommendations_section(market_analysis, insights));
            output.push_str(&generate_risk_section(&insights.risk_assessment));
        }
        CycleResult::Error { error } => {
            output.push_str(&generate_error_section(error));
        }
    }

    output.push_str(&generate_footer());
    output
}

fn generate_metadata_section(metadata: &ReportMetadata, result: &CycleResult) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Cycle:** {}\n", metadata.cycle));
    section.push_str(&format!("- **Status:** {}\n", result.status()));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_findings_section(insights: &InsightBundle) -> String {
    let mut section = String::from("## Key Findings\n\n");

    if insights.key_findings.is_empty() {
        section.push_str("No significant findings this cycle.\n\n");
        return section;
    }

    for finding in &insights.key_findings {
        section.push_str(&format!("- {}\n", finding));
    }
    section.push('\n');

    section
}

fn generate_analysis_section(report: &AnalysisReport) -> String {
    let analysis = &report.analysis;
    let mut section = String::from("## Market Analysis\n\n");

    section.push_str(&format!(
        "**Overall sentiment:** {:+.2}\n\n",
        analysis.market_sentiment.overall
    ));

    let leaders = &analysis.competitor_analysis.market_leaders;
    if !leaders.is_empty() {
        section.push_str("### Competitors\n\n");
        section.push_str("| Competitor | Position | Advantages |\n");
        section.push_str("|:---|:---|:---|\n");

        let advantages = &analysis.competitor_analysis.competitive_advantages;
        for name in leaders {
            section.push_str(&competitor_row(name, "Leader", advantages));
        }
        for name in &analysis.competitor_analysis.emerging_competitors {
            section.push_str(&competitor_row(name, "Emerging", advantages));
        }
        section.push('\n');
    }

    if !analysis.opportunity_areas.is_empty() {
        section.push_str("### Opportunity Areas\n\n");
        section.push_str("| Area | Score | Rationale |\n");
        section.push_str("|:---|:---:|:---|\n");
        for area in &analysis.opportunity_areas {
            section.push_str(&format!(
                "| {} | {:.2} | {} |\n",
                area.area, area.score, area.rationale
            ));
        }
        section.push('\n');
    }

    let growth = &analysis.growth_potential;
    if !growth.short_term.is_empty() {
        section.push_str("### Growth Potential\n\n");
        section.push_str("| Segment | Short term | Medium term | Long term |\n");
        section.push_str("|:---|:---:|:---:|:---:|\n");
        for (segment, short) in &growth.short_term {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                segment,
                percent(Some(*short)),
                percent(growth.medium_term.get(segment).copied()),
                percent(growth.long_term.get(segment).copied()),
            ));
        }
        section.push('\n');
    }

    section
}

fn competitor_row(name: &str, position: &str, advantages: &BTreeMap<String, Vec<String>>) -> String {
    let listed = advantages
        .get(name)
        .map(|a| a.join(", "))
        .unwrap_or_default();
    format!("| {} | {} | {} |\n", name, position, listed)
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v * 100.0),
        None => "-".to_string(),
    }
}

fn generate_trends_section(trends: &[Trend]) -> String {
    let mut section = String::from("## Trends\n\n");

    if trends.is_empty() {
        section.push_str("No trends detected.\n\n");
        return section;
    }

    section.push_str("| Trend | Class | Momentum | Source |\n");
    section.push_str("|:---|:---|:---:|:---|\n");
    for trend in trends {
        let badge = match trend.classification {
            TrendClass::Emerging => "📈",
            TrendClass::Declining => "📉",
            TrendClass::Stable => "➖",
        };
        section.push_str(&format!(
            "| {} | {} {} | {:+.2} | {} |\n",
            trend.name, badge, trend.classification, trend.momentum, trend.source
        ));
    }
    section.push('\n');

    section
}

fn generate_opportunities_section(opportunities: &[Opportunity]) -> String {
    if opportunities.is_empty() {
        return String::new();
    }

    let mut section = String::from("## Opportunities\n\n");
    for (i, opp) in opportunities.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** (score {:.2}): {}\n",
            i + 1,
            opp.title,
            opp.score,
            opp.rationale
        ));
    }
    section.push('\n');

    section
}

fn generate_recommendations_section(report: &AnalysisReport, insights: &InsightBundle) -> String {
    if report.recommendations.is_empty() && insights.recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::from("## Recommendations\n\n");

    for rec in &report.recommendations {
        section.push_str(&format!(
            "- **[{}]** {}: {}\n",
            rec.priority, rec.area, rec.action
        ));
    }
    for rec in &insights.recommendations {
        section.push_str(&format!("- {}\n", rec));
    }
    section.push('\n');

    section
}

fn generate_risk_section(risk: &RiskAssessment) -> String {
    let mut section = String::from("## Risk Assessment\n\n");

    section.push_str(&format!(
        "**Overall risk:** {} {}\n\n",
        risk.overall.emoji(),
        risk.overall
    ));

    for factor in &risk.factors {
        section.push_str(&format!(
            "- {} **{}** {} _({})_\n",
            factor.level.emoji(),
            factor.level,
            factor.description,
            factor.source
        ));
    }
    if !risk.factors.is_empty() {
        section.push('\n');
    }

    if !risk.declining_trends.is_empty() {
        section.push_str(&format!(
            "Declining trends to watch: {}\n\n",
            risk.declining_trends.join(", ")
        ));
    }

    section
}

fn generate_error_section(error: &str) -> String {
    let mut section = String::from("## Cycle Failed\n\n");
    section.push_str("The research cycle did not complete.\n\n");
    section.push_str(&format!("> ❌ {}\n\n", error));
    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by market-scout v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ResearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
