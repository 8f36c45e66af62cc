//! Structured (XBRL) fact series.
//!
//! Mirrors the shape of the EDGAR company facts API: facts are grouped by
//! taxonomy (`us-gaap`, `dei`, ...), then by concept name, then by unit
//! (`USD`, `shares`, `pure`, ...). Each unit holds every observation ever
//! reported for that concept, amendments included.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All structured facts reported by one company.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    /// Entity name as reported.
    #[serde(default)]
    pub entity_name: Option<String>,
    /// Facts organized by taxonomy and concept.
    #[serde(default)]
    pub facts: HashMap<String, HashMap<String, ConceptFacts>>,
}

impl CompanyFacts {
    /// Looks up a concept under a taxonomy.
    #[must_use]
    pub fn concept(&self, taxonomy: &str, concept: &str) -> Option<&ConceptFacts> {
        self.facts.get(taxonomy)?.get(concept)
    }

    /// Returns true if no facts were reported at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.values().all(HashMap::is_empty)
    }
}

/// Observations for one concept, keyed by unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptFacts {
    /// Human readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Observations keyed by unit.
    #[serde(default)]
    pub units: HashMap<String, Vec<FactObservation>>,
}

/// A single reported value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactObservation {
    /// Reported value.
    pub val: f64,
    /// Start of the period (absent for instant facts).
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// End of the period.
    pub end: NaiveDate,
    /// Accession number of the filing that reported it.
    #[serde(default)]
    pub accn: Option<String>,
    /// Fiscal year.
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period (`FY`, `Q1`, ...).
    #[serde(default)]
    pub fp: Option<String>,
    /// Form the value was reported on.
    #[serde(default)]
    pub form: Option<String>,
    /// Date the reporting filing was submitted.
    #[serde(default)]
    pub filed: Option<NaiveDate>,
}

impl FactObservation {
    /// Creates an observation for a duration ending on `end`.
    #[must_use]
    pub fn new(val: f64, end: NaiveDate, form: impl Into<String>, filed: NaiveDate) -> Self {
        Self {
            val,
            start: None,
            end,
            accn: None,
            fy: None,
            fp: None,
            form: Some(form.into()),
            filed: Some(filed),
        }
    }

    /// Sets the period start.
    #[must_use]
    pub const fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Number of days covered, if the period has a start.
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        self.start.map(|start| (self.end - start).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_company_facts() {
        let json = r#"{
            "cik": 320193,
            "entityName": "Apple Inc.",
            "facts": {
                "us-gaap": {
                    "PaymentsOfDividends": {
                        "label": "Payments of Dividends",
                        "units": {
                            "USD": [
                                {"start": "2023-10-01", "end": "2024-09-28", "val": 15234000000,
                                 "accn": "0000320193-24-000123", "fy": 2024, "fp": "FY",
                                 "form": "10-K", "filed": "2024-11-01", "frame": "CY2024"}
                            ]
                        }
                    }
                }
            }
        }"#;

        let facts: CompanyFacts = serde_json::from_str(json).unwrap();
        assert_eq!(facts.entity_name.as_deref(), Some("Apple Inc."));
        let concept = facts.concept("us-gaap", "PaymentsOfDividends").unwrap();
        let obs = &concept.units["USD"][0];
        assert_eq!(obs.val, 15_234_000_000.0);
        assert_eq!(obs.form.as_deref(), Some("10-K"));
        assert_eq!(obs.duration_days(), Some(363));
        assert!(facts.concept("dei", "PaymentsOfDividends").is_none());
    }

    #[test]
    fn test_empty_facts() {
        let facts: CompanyFacts = serde_json::from_str(r#"{"cik": 1, "facts": {}}"#).unwrap();
        assert!(facts.is_empty());
    }
}
