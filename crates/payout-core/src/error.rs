//! Error types for metrics extraction.
//!
//! This module defines [`PayoutError`] which covers every failure that can occur
//! while normalizing identifiers, fetching filings, reading the cache, or
//! extracting metrics from filing text.

use thiserror::Error;

/// Errors that can occur while computing capital-return metrics.
#[derive(Error, Debug)]
pub enum PayoutError {
    /// The company identifier could not be normalized into a CIK.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The filing source kept failing after every retry attempt.
    #[error("Source unavailable after {attempts} attempt(s) for {url}: {reason}")]
    SourceUnavailable {
        /// URL that was being fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The most recent failure.
        reason: String,
    },

    /// The source answered with a status that is not worth retrying.
    #[error("HTTP {status} for {url}")]
    Http {
        /// URL that was being fetched.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Error parsing a response from the filing source.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Narrative extraction for a single filing could not complete.
    #[error("Narrative extraction failed for filing {accession}: {reason}")]
    PartialExtraction {
        /// Accession number of the affected filing.
        accession: String,
        /// What went wrong.
        reason: String,
    },

    /// Several plausible values were found and one was picked deterministically.
    #[error("Ambiguous extraction: {candidates} distinct candidates found, largest selected")]
    AmbiguousExtraction {
        /// Number of distinct surviving candidates.
        candidates: usize,
    },

    /// An invalid parameter or configuration value was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller cancelled the operation.
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl PayoutError {
    /// Returns true if this error came from the filing source being unreachable.
    #[must_use]
    pub const fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::Http { .. } | Self::Network(_)
        )
    }
}

/// Result type alias using [`PayoutError`].
pub type Result<T> = std::result::Result<T, PayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        let err = PayoutError::PartialExtraction {
            accession: "0000320193-24-000123".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Narrative extraction failed for filing 0000320193-24-000123: HTTP 404"
        );

        let err = PayoutError::AmbiguousExtraction { candidates: 2 };
        assert!(err.to_string().contains("2 distinct candidates"));
    }

    #[test]
    fn test_source_failure_classification() {
        assert!(PayoutError::Network("reset".into()).is_source_failure());
        assert!(
            PayoutError::Http {
                url: "u".into(),
                status: 404
            }
            .is_source_failure()
        );
        assert!(!PayoutError::Parse("bad json".into()).is_source_failure());
    }
}
