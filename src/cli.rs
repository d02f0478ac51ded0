//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// market-scout - concurrent market research aggregator
///
/// Gathers industry trends, competitor data, market demand figures and
/// social signals concurrently, analyzes them, and writes a Markdown or
/// JSON research report.
///
/// Examples:
///   market-scout
///   market-scout --trends-url https://data.example.com/trends --format json
///   market-scout --watch --interval 900 --max-cycles 4
///   market-scout --dry-run
///   market-scout --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .market-scout.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Default: from config or market_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Per-source request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds between cycles in --watch mode
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Industry trends endpoint URL
    #[arg(long, value_name = "URL", env = "MARKET_SCOUT_TRENDS_URL")]
    pub trends_url: Option<String>,

    /// Competitor data endpoint URL
    #[arg(long, value_name = "URL", env = "MARKET_SCOUT_COMPETITORS_URL")]
    pub competitors_url: Option<String>,

    /// Market demand endpoint URL
    #[arg(long, value_name = "URL", env = "MARKET_SCOUT_MARKET_DATA_URL")]
    pub market_data_url: Option<String>,

    /// Keep running research cycles on the configured interval
    #[arg(short, long)]
    pub watch: bool,

    /// Stop --watch after this many cycles
    #[arg(long, value_name = "COUNT", requires = "watch")]
    pub max_cycles: Option<u64>,

    /// Dry run: show the sources that would be gathered and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .market-scout.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(interval) = self.interval {
            if interval == 0 {
                return Err("Interval must be at least 1 second".to_string());
            }
        }

        if self.max_cycles == Some(0) {
            return Err("Max cycles must be at least 1".to_string());
        }

        for (flag, url) in [
            ("--trends-url", &self.trends_url),
            ("--competitors-url", &self.competitors_url),
            ("--market-data-url", &self.market_data_url),
        ] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!("{} must start with 'http://' or 'https://'", flag));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            output: None,
            format: OutputFormat::Markdown,
            verbose: false,
            quiet: false,
            timeout: None,
            interval: None,
            trends_url: None,
            competitors_url: None,
            market_data_url: None,
            watch: false,
            max_cycles: None,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.competitors_url = Some("ftp://example.com/c".to_string());
        let err = args.validate().unwrap_err();
        assert!(err.contains("--competitors-url"));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.interval = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.watch = true;
        args.max_cycles = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.init_config = true;
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "market-scout",
            "--format",
            "json",
            "--timeout",
            "5",
            "--watch",
            "--max-cycles",
            "2",
            "--trends-url",
            "http://localhost:9000/trends",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.timeout, Some(5));
        assert!(args.watch);
        assert_eq!(args.max_cycles, Some(2));
        assert_eq!(
            args.trends_url.as_deref(),
            Some("http://localhost:9000/trends")
        );
    }

    #[test]
    fn test_max_cycles_requires_watch() {
        assert!(Args::try_parse_from(["market-scout", "--max-cycles", "2"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
