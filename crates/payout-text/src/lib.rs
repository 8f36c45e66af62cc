#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/payout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Markup stripping.
pub mod markup;
/// Narrative employee-count extraction.
pub mod narrative;

pub use markup::strip_markup;
pub use narrative::{
    Candidate, EXTRACTION_METHOD, NarrativeExtraction, NarrativeExtractor, select_largest,
};
