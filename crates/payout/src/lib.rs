#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/payout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Capital-return metrics engine.
//!
//! This crate re-exports the core types, cache backends, EDGAR client and
//! text utilities, and provides the [`MetricsEngine`] orchestrator and the
//! [`compute_ttm`] aggregator.
//!
//! # Features
//!
//! - `cache-sqlite` - SQLite-based caching
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use payout::{EngineConfig, MetricsEngine, SqliteCache};
//!
//! #[tokio::main]
//! async fn main() -> payout::Result<()> {
//!     let cache = Arc::new(SqliteCache::new("payout-cache.db")?);
//!     let engine = MetricsEngine::new(EngineConfig::from_env()?, cache)?;
//!
//!     let report = engine.compute("320193").await?;
//!     if let Some(ttm) = &report.ttm {
//!         println!("{}: {:?} returned per employee", ttm.reason, ttm.total_returned_per_employee);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use payout_core::*;

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use payout_cache::SqliteCache;
pub use payout_cache::{InMemoryCache, NoopCache};

// Source access
pub use payout_edgar::{
    EdgarClient, FetchOptions, Fetcher, RateLimiter, Resolution, TagCandidate, resolve,
};

// Text processing
pub use payout_text::{NarrativeExtraction, NarrativeExtractor, strip_markup};

mod engine;
pub use engine::MetricsEngine;

mod ttm;
pub use ttm::{TTM_QUARTERS, compute_ttm};
