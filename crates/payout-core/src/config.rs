//! Configuration for the fetcher, the narrative extractor and the engine.
//!
//! Every tunable lives here rather than inside the algorithms. All structs
//! implement [`Default`] with production values, can be deserialized from any
//! serde format, and can be overridden from `PAYOUT_*` environment variables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PayoutError, Result};

/// Default identifying user agent. The SEC rejects anonymous clients.
pub const DEFAULT_USER_AGENT: &str = "payout/0.1 (admin@example.com)";

/// SEC fair-access ceiling: 10 requests per second.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Default time-to-live for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default byte budget when scanning a filing document.
pub const DEFAULT_NARRATIVE_MAX_BYTES: usize = 2 * 1024 * 1024;

const NUMBER: &str = r"(\d{1,3}(?:,\d{3})+|\d+)";
// Hyphens include U+2010 and the non-breaking U+2011 that filings often use.
const HEADCOUNT_NOUN: &str = r"(?:(?:(?:full|part)[-\x{2010}\x{2011}\s]time(?:[-\x{2010}\x{2011}\s]equivalent)?|equivalent|permanent|regular)\s+)?(?:employees|people|persons|individuals|workers)";

/// Settings for the throttled, cache-aware fetcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Identifying user agent sent with every request.
    pub user_agent: String,
    /// Minimum interval between outbound requests.
    pub min_interval: Duration,
    /// Maximum attempts per request, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub base_backoff: Duration,
    /// Upper bound on a single backoff (before jitter).
    pub max_backoff: Duration,
    /// Time-to-live for cached responses when the caller gives none.
    pub default_ttl: Duration,
    /// Timeout for a single request.
    pub request_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            max_attempts: 4,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            default_ttl: DEFAULT_CACHE_TTL,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FetcherConfig {
    /// Creates a config with the given user agent and default everything else.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    /// Reads overrides from `PAYOUT_USER_AGENT`, `PAYOUT_MIN_INTERVAL_MS`,
    /// `PAYOUT_MAX_ATTEMPTS` and `PAYOUT_CACHE_TTL_SECS`.
    ///
    /// # Errors
    /// Returns [`PayoutError::InvalidParameter`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(user_agent) = env_var("PAYOUT_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(ms) = env_parse::<u64>("PAYOUT_MIN_INTERVAL_MS")? {
            config.min_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = env_parse::<u32>("PAYOUT_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }
        if let Some(secs) = env_parse::<u64>("PAYOUT_CACHE_TTL_SECS")? {
            config.default_ttl = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    /// Returns [`PayoutError::InvalidParameter`] for an empty user agent or zero attempts.
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(PayoutError::InvalidParameter(
                "user agent must not be empty".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(PayoutError::InvalidParameter(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the minimum interval between requests.
    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Sets the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the base and maximum backoff.
    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    /// Sets the default cache time-to-live.
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Settings for narrative employee-count extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Regex templates; each must capture the numeric token in group 1.
    pub patterns: Vec<String>,
    /// Words that mark a match as referring to someone else's workforce.
    pub false_positive_markers: Vec<String>,
    /// Characters of context kept on each side of a match.
    pub context_radius: usize,
    /// Smallest plausible headcount.
    pub min_count: u64,
    /// Largest plausible headcount.
    pub max_count: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                format!(r"(?i)\bapproximately\s+{NUMBER}\s+{HEADCOUNT_NOUN}"),
                format!(
                    r"(?i)\b(?:had|employed|employs|employ)\s+(?:approximately\s+|about\s+|over\s+|more\s+than\s+)?{NUMBER}\s+{HEADCOUNT_NOUN}"
                ),
                format!(r"(?i)\btotal\s+of\s+(?:approximately\s+)?{NUMBER}\s+{HEADCOUNT_NOUN}"),
                format!(r"(?i)\bworkforce\s+of\s+(?:approximately\s+|about\s+)?{NUMBER}"),
            ],
            false_positive_markers: ["customer", "supplier", "contractor", "third party", "third-party"]
                .into_iter()
                .map(String::from)
                .collect(),
            context_radius: 100,
            min_count: 10,
            max_count: 10_000_000,
        }
    }
}

impl NarrativeConfig {
    /// Sets the context radius.
    #[must_use]
    pub const fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    /// Replaces the pattern templates.
    #[must_use]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Replaces the false-positive markers.
    #[must_use]
    pub fn with_false_positive_markers(mut self, markers: Vec<String>) -> Self {
        self.false_positive_markers = markers;
        self
    }
}

/// Settings for the metrics orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fetcher settings.
    pub fetcher: FetcherConfig,
    /// Narrative extraction settings.
    pub narrative: NarrativeConfig,
    /// How many of the most recent annual/quarterly filings to process.
    pub recent_filings: usize,
    /// Byte budget when scanning a filing document.
    pub narrative_max_bytes: usize,
    /// Time-to-live for the filing list.
    pub submissions_ttl: Duration,
    /// Time-to-live for structured facts.
    pub facts_ttl: Duration,
    /// Time-to-live for filing documents, which never change once filed.
    pub document_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            narrative: NarrativeConfig::default(),
            recent_filings: 8,
            narrative_max_bytes: DEFAULT_NARRATIVE_MAX_BYTES,
            submissions_ttl: Duration::from_secs(6 * 60 * 60),
            facts_ttl: Duration::from_secs(6 * 60 * 60),
            document_ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl EngineConfig {
    /// Reads the fetcher overrides plus `PAYOUT_NARRATIVE_MAX_BYTES` and
    /// `PAYOUT_RECENT_FILINGS`.
    ///
    /// # Errors
    /// Returns [`PayoutError::InvalidParameter`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            fetcher: FetcherConfig::from_env()?,
            ..Self::default()
        };
        if let Some(bytes) = env_parse::<usize>("PAYOUT_NARRATIVE_MAX_BYTES")? {
            config.narrative_max_bytes = bytes;
        }
        if let Some(count) = env_parse::<usize>("PAYOUT_RECENT_FILINGS")? {
            config.recent_filings = count;
        }
        Ok(config)
    }

    /// Sets the fetcher settings.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: FetcherConfig) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Sets the narrative extraction settings.
    #[must_use]
    pub fn with_narrative(mut self, narrative: NarrativeConfig) -> Self {
        self.narrative = narrative;
        self
    }

    /// Sets how many recent filings are processed.
    #[must_use]
    pub const fn with_recent_filings(mut self, count: usize) -> Self {
        self.recent_filings = count;
        self
    }

    /// Sets the narrative scan byte budget.
    #[must_use]
    pub const fn with_narrative_max_bytes(mut self, bytes: usize) -> Self {
        self.narrative_max_bytes = bytes;
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    env_var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| PayoutError::InvalidParameter(format!("{name}={raw} is not valid")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.fetcher.min_interval, Duration::from_millis(100));
        assert_eq!(config.narrative.context_radius, 100);
        assert_eq!(config.narrative.min_count, 10);
        assert_eq!(config.narrative.max_count, 10_000_000);
        assert!(config.fetcher.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(FetcherConfig::new("  ").validate().is_err());
        assert!(
            FetcherConfig::default()
                .with_max_attempts(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"recent_filings": 4}"#).unwrap();
        assert_eq!(config.recent_filings, 4);
        assert_eq!(config.narrative_max_bytes, DEFAULT_NARRATIVE_MAX_BYTES);
        assert_eq!(config.fetcher.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_recent_filings(2)
            .with_narrative_max_bytes(4096)
            .with_narrative(NarrativeConfig::default().with_context_radius(40));
        assert_eq!(config.recent_filings, 2);
        assert_eq!(config.narrative_max_bytes, 4096);
        assert_eq!(config.narrative.context_radius, 40);
    }
}
