//! Gathering and analysis stages.
//!
//! This module holds the aggregator that builds a bundle from all sources,
//! and the analyzer that turns a bundle into an analysis report.

pub mod aggregator;
pub mod analyzer;
pub mod facets;
pub mod payload;

pub use aggregator::Aggregator;
pub use analyzer::Analyzer;
