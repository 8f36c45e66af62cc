//! Company identifier normalization.
//!
//! EDGAR addresses companies by CIK (Central Index Key), which the API expects
//! as a zero-padded 10 digit string. [`Cik`] is the only way identifiers enter
//! the engine, so every downstream URL and cache key is built from the
//! canonical form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PayoutError, Result};

/// Width of a canonical CIK.
pub const CIK_WIDTH: usize = 10;

/// A canonical, zero-padded 10 digit company identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cik(String);

impl Cik {
    /// Normalizes a raw identifier.
    ///
    /// Every non-digit character is stripped before padding, so `"CIK-320193"`,
    /// `"320193"` and `"0000320193"` all normalize to the same value.
    ///
    /// # Errors
    /// Returns [`PayoutError::InvalidIdentifier`] if no digits remain or more
    /// than 10 digits remain.
    pub fn normalize(input: impl AsRef<str>) -> Result<Self> {
        let digits: String = input
            .as_ref()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        if digits.is_empty() {
            return Err(PayoutError::InvalidIdentifier("no digits found".to_string()));
        }
        if digits.len() > CIK_WIDTH {
            return Err(PayoutError::InvalidIdentifier("too many digits".to_string()));
        }

        Ok(Self(format!("{:0>width$}", digits, width = CIK_WIDTH)))
    }

    /// Returns the canonical 10 digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier without leading zeros, as used in archive paths.
    #[must_use]
    pub fn short(&self) -> &str {
        match self.0.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        }
    }
}

/// Strips leading zeros from a canonical identifier for display.
///
/// Returns `"0"` when nothing but zeros remain.
#[must_use]
pub fn display_cik(canonical: &str) -> String {
    match canonical.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cik {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::normalize(s)
    }
}

impl TryFrom<&str> for Cik {
    type Error = PayoutError;

    fn try_from(s: &str) -> Result<Self> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for Cik {
    type Error = PayoutError;

    fn try_from(s: String) -> Result<Self> {
        Self::normalize(s)
    }
}

impl TryFrom<u64> for Cik {
    type Error = PayoutError;

    fn try_from(n: u64) -> Result<Self> {
        Self::normalize(n.to_string())
    }
}

impl From<Cik> for String {
    fn from(cik: Cik) -> Self {
        cik.0
    }
}
