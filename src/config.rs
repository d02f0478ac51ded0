//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.market-scout.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".market-scout.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Research cycle settings.
    #[serde(default)]
    pub market_research: MarketResearchConfig,

    /// Endpoint registry for the HTTP-backed sources.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Thresholds used by the default analysis facets.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "market_report.md".to_string()
}

/// Research cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResearchConfig {
    /// Seconds between cycles when running under the scheduler.
    #[serde(default = "default_update_frequency")]
    pub update_frequency: u64,

    /// Per-fetch timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// User agent sent to every source.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MarketResearchConfig {
    fn default() -> Self {
        Self {
            update_frequency: default_update_frequency(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_update_frequency() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("market-scout/{}", env!("CARGO_PKG_VERSION"))
}

/// URLs of the HTTP-backed sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_trends_url")]
    pub trends: String,

    #[serde(default = "default_competitors_url")]
    pub competitors: String,

    #[serde(default = "default_market_data_url")]
    pub market_data: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            trends: default_trends_url(),
            competitors: default_competitors_url(),
            market_data: default_market_data_url(),
        }
    }
}

fn default_trends_url() -> String {
    "https://api.example.com/trends".to_string()
}

fn default_competitors_url() -> String {
    "https://api.example.com/competitors".to_string()
}

fn default_market_data_url() -> String {
    "https://api.example.com/market-data".to_string()
}

impl EndpointsConfig {
    /// Endpoint name and URL pairs, in gather order.
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("trends", self.trends.as_str()),
            ("competitors", self.competitors.as_str()),
            ("market_data", self.market_data.as_str()),
        ]
    }
}

/// Thresholds for the default analysis facets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum absolute momentum for a trend to count as emerging or declining.
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,

    /// Market share at which a competitor counts as a leader.
    #[serde(default = "default_leader_share")]
    pub leader_share: f64,

    /// Growth at which a non-leading competitor counts as emerging.
    #[serde(default = "default_emerging_growth")]
    pub emerging_growth: f64,

    /// Demand growth at which a segment counts as an opportunity.
    #[serde(default = "default_opportunity_growth")]
    pub opportunity_growth: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_threshold: default_trend_threshold(),
            leader_share: default_leader_share(),
            emerging_growth: default_emerging_growth(),
            opportunity_growth: default_opportunity_growth(),
        }
    }
}

fn default_trend_threshold() -> f64 {
    0.05
}

fn default_leader_share() -> f64 {
    0.2
}

fn default_emerging_growth() -> f64 {
    0.1
}

fn default_opportunity_growth() -> f64 {
    0.1
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.market-scout.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(timeout) = args.timeout {
            self.market_research.request_timeout_seconds = timeout;
        }
        if let Some(interval) = args.interval {
            self.market_research.update_frequency = interval;
        }

        if let Some(ref url) = args.trends_url {
            self.endpoints.trends = url.clone();
        }
        if let Some(ref url) = args.competitors_url {
            self.endpoints.competitors = url.clone();
        }
        if let Some(ref url) = args.market_data_url {
            self.endpoints.market_data = url.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
    }

    /// Reject settings that cannot drive a research cycle.
    pub fn validate(&self) -> Result<()> {
        if self.market_research.update_frequency == 0 {
            bail!("market_research.update_frequency must be greater than 0");
        }
        if self.market_research.request_timeout_seconds == 0 {
            bail!("market_research.request_timeout_seconds must be greater than 0");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
