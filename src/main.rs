//! market-scout - concurrent market research aggregator
//!
//! A CLI tool that gathers market data from several sources at once,
//! analyzes it, detects trends and opportunities, and writes a research
//! report.
//!
//! Exit codes:
//!   0 - Success (the last research cycle succeeded)
//!   1 - Runtime error (config, initialization, or a failed cycle)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod research;
mod sources;
mod trends;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{CycleResult, ReportMetadata, ResearchReport};
use research::ResearchCycle;
use sources::ReqwestConnector;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("market-scout v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Research failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .market-scout.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize endpoints, timeouts, and analysis thresholds.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` overrides the level derived from the flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one research cycle, or keep running them with --watch. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    if args.dry_run {
        return Ok(handle_dry_run(&config));
    }

    let connector = Arc::new(ReqwestConnector::from_config(&config.market_research));
    let mut cycle = ResearchCycle::new(config.clone(), connector);

    println!("🔌 Initializing research cycle...");
    if !cycle.initialize().await {
        eprintln!("\n❌ Initialization failed. Check endpoints and connectivity.");
        return Ok(1);
    }

    let output = PathBuf::from(&config.general.output);
    let exit_code = if args.watch {
        watch(&mut cycle, &config, &args, &output).await?
    } else {
        run_cycle(&mut cycle, 1, &args, &output).await?
    };

    cycle.shutdown().await;
    Ok(exit_code)
}

/// Run cycles every `update_frequency` seconds until interrupted or
/// `--max-cycles` is reached.
async fn watch(
    cycle: &mut ResearchCycle,
    config: &Config,
    args: &Args,
    output: &Path,
) -> Result<i32> {
    let period = Duration::from_secs(config.market_research.update_frequency);
    println!(
        "👀 Watching: one cycle every {}s (Ctrl-C to stop)",
        period.as_secs()
    );

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed = 0u64;
    let mut exit_code = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted after {} cycles", completed);
                break;
            }
        }

        completed += 1;
        exit_code = run_cycle(cycle, completed, args, output).await?;

        if args.max_cycles.is_some_and(|max| completed >= max) {
            info!("Reached --max-cycles ({})", completed);
            break;
        }
    }

    Ok(exit_code)
}

/// Run a single cycle, write its report, and map the result to an exit code.
async fn run_cycle(
    cycle: &mut ResearchCycle,
    number: u64,
    args: &Args,
    output: &Path,
) -> Result<i32> {
    let start_time = Instant::now();

    let spinner = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Running research cycle {}...", number));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = cycle.run().await;
    spinner.finish_and_clear();
    if let Some(outcome) = cycle.last_outcome() {
        debug!("Cycle {} {}", number, outcome);
    }

    let report = ResearchReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            cycle: number,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        result,
    };

    let content = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };
    report::write_report(&content, output)?;

    print_summary(&report, output);

    Ok(if report.result.is_success() { 0 } else { 1 })
}

fn print_summary(report: &ResearchReport, output: &Path) {
    match &report.result {
        CycleResult::Success {
            trends,
            opportunities,
            insights,
            market_analysis,
        } => {
            println!("\n📊 Cycle {} Summary:", report.metadata.cycle);
            println!("   Trends detected: {}", trends.len());
            println!("   Opportunities: {}", opportunities.len());
            println!(
                "   Recommendations: {}",
                market_analysis.recommendations.len()
            );
            println!(
                "   Overall risk: {} {}",
                insights.risk_assessment.overall.emoji(),
                insights.risk_assessment.overall
            );
            println!("   Duration: {:.1}s", report.metadata.duration_seconds);
            println!("\n✅ Report saved to: {}", output.display());
        }
        CycleResult::Error { error } => {
            eprintln!("\n❌ Cycle {} failed: {}", report.metadata.cycle, error);
            eprintln!("   Error report saved to: {}", output.display());
        }
    }
}

/// Handle --dry-run: list the configured sources and exit.
fn handle_dry_run(config: &Config) -> i32 {
    println!("\n🔍 Dry run: no requests will be made.\n");

    for (name, url) in config.endpoints.entries() {
        println!("     🌐 {:<12} {}", name, url);
    }
    println!("     💬 {:<12} (built-in stub)", "social_media");

    println!(
        "\n   Timeout: {}s per source",
        config.market_research.request_timeout_seconds
    );
    println!(
        "   Watch interval: {}s",
        config.market_research.update_frequency
    );
    println!("   Report: {}", config.general.output);

    println!("\n✅ Dry run complete.");
    0
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
