//! Derived capital-return metrics.
//!
//! This module defines the output data model:
//!
//! - [`MetricSnapshot`] - Values derived from one filing
//! - [`MetricProvenance`] - Where each value came from
//! - [`EmployeeEvidence`] - Quoted text backing a narrative employee count
//! - [`TtmSummary`] - Trailing-twelve-month aggregate
//! - [`CompanyMetricsReport`] - Everything computed for one company

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::filing::{Filing, FormKind};
use crate::identifier::Cik;

/// Fallback strategy tag recorded when narrative extraction ran.
pub const NARRATIVE_FALLBACK: &str = "narrative_employee_count";

/// How an employee count was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeCountSource {
    /// Reported by the company, either as a structured fact or in filing text.
    Reported,
    /// No count could be found.
    #[default]
    Unknown,
}

/// Evidence backing a narrative-derived employee count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeEvidence {
    /// Document the text was scanned from.
    pub source_url: String,
    /// Accession number of the filing.
    pub accession: String,
    /// Form kind of the filing.
    pub form: FormKind,
    /// Period end of the filing, when known.
    pub period_end: Option<NaiveDate>,
    /// Text window around the match.
    pub quote: String,
    /// Extraction method tag.
    pub method: String,
    /// Character offsets of the match within the scanned text.
    pub span: (usize, usize),
}

/// Provenance for one filing's derived metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricProvenance {
    /// Structured tags that produced values, as `taxonomy:Concept`.
    pub tags_used: Vec<String>,
    /// True if any value came from structured facts.
    pub used_structured: bool,
    /// Fallback strategies that were invoked.
    pub fallbacks: Vec<String>,
    /// Caveats, ambiguity notes and recovered failures.
    pub warnings: Vec<String>,
    /// Evidence for a narrative-derived employee count.
    pub employee_evidence: Option<EmployeeEvidence>,
}

impl MetricProvenance {
    /// Records a structured tag that produced a value.
    pub fn record_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        self.used_structured = true;
        if !self.tags_used.contains(&tag) {
            self.tags_used.push(tag);
        }
    }

    /// Records a fallback strategy.
    pub fn record_fallback(&mut self, fallback: impl Into<String>) {
        self.fallbacks.push(fallback.into());
    }

    /// Records a warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Metrics derived from a single filing. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Filing the values were derived from.
    pub filing: Filing,
    /// Cash dividends paid (positive outflow).
    pub dividends: Option<f64>,
    /// Cash spent on share repurchases (positive outflow).
    pub share_repurchases: Option<f64>,
    /// Dividends plus repurchases, present when either component is known.
    pub total_returned: Option<f64>,
    /// Employee count.
    pub employees: Option<u64>,
    /// How the employee count was obtained.
    pub employees_source: EmployeeCountSource,
    /// Dividends per employee, rounded to whole currency units.
    pub dividends_per_employee: Option<f64>,
    /// Repurchases per employee, rounded to whole currency units.
    pub repurchases_per_employee: Option<f64>,
    /// Total returned per employee, rounded to whole currency units.
    pub total_returned_per_employee: Option<f64>,
    /// Where the values came from.
    pub provenance: MetricProvenance,
}

impl MetricSnapshot {
    /// Builds a snapshot, deriving the total and the per-employee ratios.
    #[must_use]
    pub fn new(
        filing: Filing,
        dividends: Option<f64>,
        share_repurchases: Option<f64>,
        employees: Option<u64>,
        provenance: MetricProvenance,
    ) -> Self {
        let total_returned = sum_known(dividends, share_repurchases);
        let employees_source = if employees.is_some() {
            EmployeeCountSource::Reported
        } else {
            EmployeeCountSource::Unknown
        };

        Self {
            filing,
            dividends,
            share_repurchases,
            total_returned,
            employees,
            employees_source,
            dividends_per_employee: per_employee(dividends, employees),
            repurchases_per_employee: per_employee(share_repurchases, employees),
            total_returned_per_employee: per_employee(total_returned, employees),
            provenance,
        }
    }

    /// Form kind of the underlying filing.
    #[must_use]
    pub fn form(&self) -> FormKind {
        self.filing.form
    }
}

/// Trailing-twelve-month aggregate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TtmSummary {
    /// True when a TTM figure could be produced.
    pub available: bool,
    /// Which policy produced the figures.
    pub reason: String,
    /// Dividends over the trailing period.
    pub dividends: Option<f64>,
    /// Repurchases over the trailing period.
    pub share_repurchases: Option<f64>,
    /// Dividends plus repurchases.
    pub total_returned: Option<f64>,
    /// Employee count used for the ratios.
    pub employees: Option<u64>,
    /// How the employee count was obtained.
    pub employees_source: EmployeeCountSource,
    /// Dividends per employee.
    pub dividends_per_employee: Option<f64>,
    /// Repurchases per employee.
    pub repurchases_per_employee: Option<f64>,
    /// Total returned per employee.
    pub total_returned_per_employee: Option<f64>,
    /// Number of quarterly filings summed; 0 when an annual filing was used.
    pub quarters_used: usize,
}

/// Everything computed for one company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetricsReport {
    /// Company identifier.
    pub cik: Cik,
    /// Per-filing snapshots, newest first.
    pub snapshots: Vec<MetricSnapshot>,
    /// Trailing-twelve-month summary, if any snapshot exists.
    pub ttm: Option<TtmSummary>,
    /// When the report was computed.
    pub last_updated: DateTime<Utc>,
}

/// Adds two optional amounts; `None` only when both are unknown.
#[must_use]
pub fn sum_known(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// Divides an amount by a positive headcount, rounded to whole units.
#[must_use]
pub fn per_employee(amount: Option<f64>, employees: Option<u64>) -> Option<f64> {
    match (amount, employees) {
        (Some(amount), Some(count)) if count > 0 => {
            let ratio = (amount / count as f64).round();
            ratio.is_finite().then_some(ratio)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing() -> Filing {
        Filing::new(
            FormKind::Annual,
            "0000320193-24-000123",
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 28).unwrap(),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm",
        )
    }

    #[test]
    fn test_sum_known() {
        assert_eq!(sum_known(None, None), None);
        assert_eq!(sum_known(Some(5.0), None), Some(5.0));
        assert_eq!(sum_known(None, Some(7.0)), Some(7.0));
        assert_eq!(sum_known(Some(5.0), Some(7.0)), Some(12.0));
    }

    #[test]
    fn test_per_employee_requires_positive_count() {
        assert_eq!(per_employee(Some(1000.0), Some(3)), Some(333.0));
        assert_eq!(per_employee(Some(1000.0), Some(0)), None);
        assert_eq!(per_employee(None, Some(10)), None);
        assert_eq!(per_employee(Some(1000.0), None), None);
    }

    #[test]
    fn test_snapshot_derivations() {
        let snap = MetricSnapshot::new(
            filing(),
            Some(15_000_000_000.0),
            Some(95_000_000_000.0),
            Some(164_000),
            MetricProvenance::default(),
        );
        assert_eq!(snap.total_returned, Some(110_000_000_000.0));
        assert_eq!(snap.employees_source, EmployeeCountSource::Reported);
        assert_eq!(snap.dividends_per_employee, Some(91_463.0));
        assert_eq!(snap.total_returned_per_employee, Some(670_732.0));

        let empty = MetricSnapshot::new(filing(), None, None, None, MetricProvenance::default());
        assert_eq!(empty.total_returned, None);
        assert_eq!(empty.employees_source, EmployeeCountSource::Unknown);
        assert_eq!(empty.total_returned_per_employee, None);
    }

    #[test]
    fn test_provenance_deduplicates_tags() {
        let mut prov = MetricProvenance::default();
        assert!(!prov.used_structured);
        prov.record_tag("us-gaap:PaymentsOfDividends");
        prov.record_tag("us-gaap:PaymentsOfDividends");
        assert!(prov.used_structured);
        assert_eq!(prov.tags_used.len(), 1);
    }

    #[test]
    fn test_employee_source_serializes_lowercase() {
        let json = serde_json::to_string(&EmployeeCountSource::Reported).unwrap();
        assert_eq!(json, "\"reported\"");
    }
}
