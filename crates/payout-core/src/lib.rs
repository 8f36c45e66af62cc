#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/payout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and abstractions for the capital-return metrics engine.
//!
//! This crate provides the foundations shared by every other crate:
//!
//! - [`Cik`](identifier::Cik) - Canonical company identifier
//! - [`Filing`](filing::Filing) and [`FormKind`](filing::FormKind) - Filing metadata
//! - [`CompanyFacts`](facts::CompanyFacts) - Structured fact series
//! - [`MetricSnapshot`](metrics::MetricSnapshot) and [`TtmSummary`](metrics::TtmSummary) - Derived output
//! - [`ContentCache`](cache::ContentCache) - Caching abstraction
//! - [`PayoutError`](error::PayoutError) - Error taxonomy

/// Cache trait and key derivation.
pub mod cache;
/// Fetcher, extractor and engine configuration.
pub mod config;
/// Error types.
pub mod error;
/// Structured fact series.
pub mod facts;
/// Filing metadata.
pub mod filing;
/// Company identifier normalization.
pub mod identifier;
/// Derived metrics and provenance.
pub mod metrics;

// Re-export commonly used items at crate root
pub use cache::{ContentCache, bounded_cache_key, cache_key};
pub use config::{EngineConfig, FetcherConfig, NarrativeConfig};
pub use error::{PayoutError, Result};
pub use facts::{CompanyFacts, ConceptFacts, FactObservation};
pub use filing::{Filing, FormKind};
pub use identifier::{Cik, display_cik};
pub use metrics::{
    CompanyMetricsReport, EmployeeCountSource, EmployeeEvidence, MetricProvenance,
    MetricSnapshot, NARRATIVE_FALLBACK, TtmSummary, per_employee, sum_known,
};
