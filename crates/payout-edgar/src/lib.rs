#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/payout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR client for capital-return metrics.
//!
//! This crate provides:
//!
//! - [`RateLimiter`] - Injectable request throttle
//! - [`Fetcher`] - Throttled, retrying, cache-aware fetcher
//! - [`EdgarClient`] - Filing list, company facts and document endpoints
//! - [`resolve`] - Ordered tag-fallback resolution over structured facts

/// EDGAR endpoints.
pub mod client;
/// Throttled, cache-aware fetcher.
pub mod fetcher;
/// Request throttle.
pub mod rate_limit;
/// Structured facts resolver.
pub mod resolver;
/// Tag tables.
pub mod tags;

pub use client::{ARCHIVE_BASE_URL, DATA_BASE_URL, EdgarClient};
pub use fetcher::{FetchOptions, Fetcher};
pub use rate_limit::RateLimiter;
pub use resolver::{Resolution, resolve};
pub use tags::{DEI, DIVIDEND_TAGS, EMPLOYEE_TAGS, REPURCHASE_TAGS, TagCandidate, US_GAAP};
