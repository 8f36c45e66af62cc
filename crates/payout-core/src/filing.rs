//! Filing metadata.
//!
//! This module defines [`FormKind`], the closed set of periodic reports the
//! engine understands, and [`Filing`], one submission taken from the source's
//! filing list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of periodic report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    /// Annual report (10-K).
    #[default]
    Annual,
    /// Quarterly report (10-Q).
    Quarterly,
}

impl FormKind {
    /// Parses an EDGAR form type. Amendments and other forms are not part of the set.
    #[must_use]
    pub fn from_form(form: &str) -> Option<Self> {
        match form {
            "10-K" => Some(Self::Annual),
            "10-Q" => Some(Self::Quarterly),
            _ => None,
        }
    }

    /// Returns the EDGAR form type string.
    #[must_use]
    pub const fn as_form(&self) -> &'static str {
        match self {
            Self::Annual => "10-K",
            Self::Quarterly => "10-Q",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_form())
    }
}

/// One regulatory submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// Annual or quarterly.
    pub form: FormKind,
    /// Accession number, e.g. `0000320193-24-000123`.
    pub accession: String,
    /// Date the filing was submitted.
    pub filing_date: NaiveDate,
    /// End of the reporting period.
    pub period_end: NaiveDate,
    /// URL of the primary document.
    pub document_url: String,
}

impl Filing {
    /// Creates a new filing record.
    #[must_use]
    pub fn new(
        form: FormKind,
        accession: impl Into<String>,
        filing_date: NaiveDate,
        period_end: NaiveDate,
        document_url: impl Into<String>,
    ) -> Self {
        Self {
            form,
            accession: accession.into(),
            filing_date,
            period_end,
            document_url: document_url.into(),
        }
    }

    /// Returns true for annual reports.
    #[must_use]
    pub fn is_annual(&self) -> bool {
        self.form == FormKind::Annual
    }
}
