//! External market data sources.
//!
//! This module provides the per-source fetchers and the shared
//! connection resource they issue requests over.

pub mod fetcher;
#[cfg(test)]
pub mod testing;
pub mod transport;

pub use fetcher::SourceFetcher;
pub use transport::{Connector, ReqwestConnector};
