//! The research cycle: gather, analyze, detect trends, find opportunities,
//! synthesize insights.
//!
//! A cycle is initialized once, run any number of times, and shut down.
//! `run` never fails: every stage fault and every panic inside a stage is
//! turned into a [`CycleResult::Error`]. After each attempt the cycle
//! settles back to [`CycleState::Idle`]; the terminal state is kept as the
//! last outcome.

use super::insights;
use crate::analysis::{Aggregator, Analyzer};
use crate::config::Config;
use crate::error::ResearchError;
use crate::models::{CycleResult, Trend};
use crate::sources::Connector;
use crate::trends::TrendEngine;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle state of a [`ResearchCycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Initializing,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleState::Idle => "idle",
            CycleState::Initializing => "initializing",
            CycleState::Running => "running",
            CycleState::Succeeded => "succeeded",
            CycleState::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Orchestrates one research run over all sources.
pub struct ResearchCycle {
    config: Config,
    aggregator: Aggregator,
    analyzer: Analyzer,
    engine: TrendEngine,
    state: CycleState,
    last_outcome: Option<CycleState>,
    last_error: Option<String>,
    initialized: bool,
}

impl ResearchCycle {
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Self {
        let aggregator = Aggregator::from_config(&config, connector);
        let analyzer = Analyzer::new(&config.analysis);
        let engine = TrendEngine::new(config.analysis.trend_threshold);

        Self {
            config,
            aggregator,
            analyzer,
            engine,
            state: CycleState::Idle,
            last_outcome: None,
            last_error: None,
            initialized: false,
        }
    }

    /// Replace the analyzer, e.g. to plug in different facets.
    #[allow(dead_code)]
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    #[allow(dead_code)]
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// How the last initialization or run ended, if any.
    pub fn last_outcome(&self) -> Option<CycleState> {
        self.last_outcome
    }

    #[allow(dead_code)]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[allow(dead_code)]
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Validate endpoints and check the connection.
    ///
    /// Returns `false` on any problem; the cause is reported by later runs.
    pub async fn initialize(&mut self) -> bool {
        self.state = CycleState::Initializing;
        info!("Initializing research cycle");

        match self.preflight() {
            Ok(()) => {
                self.initialized = true;
                self.last_error = None;
                self.state = CycleState::Idle;
                info!("Research cycle ready");
                true
            }
            Err(e) => {
                error!("Initialization failed: {}", e);
                self.initialized = false;
                self.last_error = Some(e.to_string());
                self.settle(CycleState::Failed);
                false
            }
        }
    }

    fn preflight(&self) -> Result<(), ResearchError> {
        for (name, url) in self.config.endpoints.entries() {
            validate_endpoint(name, url)?;
        }
        self.aggregator.check_connection()
    }

    /// Run the full pipeline once.
    pub async fn run(&mut self) -> CycleResult {
        if !self.initialized {
            warn!("Research cycle run before initialization");
            let e = match &self.last_error {
                Some(cause) => ResearchError::InitializationFailed(cause.clone()),
                None => ResearchError::NotInitialized,
            };
            return CycleResult::error(e.to_string());
        }

        self.state = CycleState::Running;
        info!("Starting research cycle");

        let outcome = AssertUnwindSafe(self.execute()).catch_unwind().await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Research cycle failed: {}", e);
                CycleResult::error(e.to_string())
            }
            Err(panic) => {
                let e = ResearchError::StagePanic(panic_message(panic.as_ref()));
                error!("Research cycle failed: {}", e);
                CycleResult::error(e.to_string())
            }
        };

        self.settle(if result.is_success() {
            CycleState::Succeeded
        } else {
            CycleState::Failed
        });
        info!("Research cycle finished: {}", result.status());
        result
    }

    /// Record a terminal state and return to idle.
    fn settle(&mut self, outcome: CycleState) {
        debug!("Research cycle {}, returning to idle", outcome);
        self.last_outcome = Some(outcome);
        self.state = CycleState::Idle;
    }

    async fn execute(&self) -> Result<CycleResult, ResearchError> {
        let bundle = self.aggregator.gather().await?;
        let market_analysis = self.analyzer.analyze(&bundle)?;

        let trends: Vec<Trend> = self.engine.detect_trends(&bundle)?.iter().collect();
        info!("Detected {} trends", trends.len());

        let opportunities = self.engine.identify_opportunities(&trends);
        let insights = insights::synthesize(&market_analysis, &trends)?;

        Ok(CycleResult::Success {
            market_analysis,
            trends,
            opportunities,
            insights,
        })
    }

    /// Return to idle. Safe to call any number of times.
    pub async fn shutdown(&mut self) -> bool {
        if self.initialized {
            info!("Shutting down research cycle");
        }
        self.initialized = false;
        self.last_error = None;
        self.state = CycleState::Idle;
        true
    }
}

fn validate_endpoint(name: &str, url: &str) -> Result<(), ResearchError> {
    let invalid = || ResearchError::InvalidEndpoint {
        name: name.to_string(),
        url: url.to_string(),
    };

    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
