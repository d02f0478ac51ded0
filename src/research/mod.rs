//! Research cycle orchestration.

pub mod cycle;
pub mod insights;

pub use cycle::ResearchCycle;
