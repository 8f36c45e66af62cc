//! Generic structured facts resolver.

use chrono::NaiveDate;
use payout_core::{CompanyFacts, FactObservation, FormKind};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::tags::TagCandidate;

/// Value resolved for one metric of one filing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Absolute value of the matched observation.
    pub value: Option<f64>,
    /// Qualified tag that matched, e.g. `us-gaap:PaymentsOfDividends`.
    pub tag_used: Option<String>,
    /// Caveats about the matched tag.
    pub warnings: Vec<String>,
}

/// Resolves a metric for the filing identified by `form` and `period_end`.
///
/// Candidates are walked in order; for each one every taxonomy, then every
/// unit, is tried. Only observations reported on the same form kind for the
/// same period end qualify. Among those the most recently filed wins, and
/// equal filing dates go to the shortest reporting period. The sign is
/// dropped: these metrics are always read as cash outflows.
#[must_use]
pub fn resolve(
    facts: &CompanyFacts,
    candidates: &[TagCandidate],
    form: FormKind,
    period_end: NaiveDate,
) -> Resolution {
    for candidate in candidates {
        for taxonomy in candidate.taxonomies {
            let Some(concept) = facts.concept(taxonomy, candidate.concept) else {
                continue;
            };

            for unit in candidate.units {
                let Some(observations) = concept.units.get(*unit) else {
                    continue;
                };

                if let Some(best) = latest_match(observations, form, period_end) {
                    let tag = candidate.qualified(taxonomy);
                    trace!(tag = %tag, unit, value = best.val, "Resolved structured fact");

                    let warnings = candidate
                        .caveat
                        .map(|caveat| format!("{tag}: {caveat}"))
                        .into_iter()
                        .collect();

                    return Resolution {
                        value: Some(best.val.abs()),
                        tag_used: Some(tag),
                        warnings,
                    };
                }
            }
        }
    }

    Resolution::default()
}

fn latest_match(
    observations: &[FactObservation],
    form: FormKind,
    period_end: NaiveDate,
) -> Option<&FactObservation> {
    observations
        .iter()
        .filter(|o| {
            o.end == period_end && o.form.as_deref() == Some(form.as_form()) && o.val.is_finite()
        })
        .max_by(|a, b| {
            a.filed
                .cmp(&b.filed)
                .then_with(|| b.duration_days().cmp(&a.duration_days()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{DIVIDEND_TAGS, EMPLOYEE_TAGS, REPURCHASE_TAGS};
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn facts(value: serde_json::Value) -> CompanyFacts {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_preferred_tag_wins_over_substitute() {
        let facts = facts(json!({
            "entityName": "Example Corp",
            "facts": {
                "us-gaap": {
                    "PaymentsOfDividends": {"units": {"USD": [
                        {"val": 16000, "start": "2023-10-01", "end": "2024-09-28", "form": "10-K", "filed": "2024-11-01"}
                    ]}},
                    "PaymentsOfDividendsCommonStock": {"units": {"USD": [
                        {"val": 15234, "start": "2023-10-01", "end": "2024-09-28", "form": "10-K", "filed": "2024-11-01"}
                    ]}}
                }
            }
        }));

        let res = resolve(&facts, DIVIDEND_TAGS, FormKind::Annual, date("2024-09-28"));
        assert_eq!(res.value, Some(15_234.0));
        assert_eq!(
            res.tag_used.as_deref(),
            Some("us-gaap:PaymentsOfDividendsCommonStock")
        );
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_broader_tag_emits_caveat_and_absolute_value() {
        let facts = facts(json!({
            "facts": {"us-gaap": {
                "PaymentsForRepurchaseOfEquity": {"units": {"USD": [
                    {"val": -94949, "start": "2023-10-01", "end": "2024-09-28", "form": "10-K", "filed": "2024-11-01"}
                ]}}
            }}
        }));

        let res = resolve(&facts, REPURCHASE_TAGS, FormKind::Annual, date("2024-09-28"));
        assert_eq!(res.value, Some(94_949.0));
        assert_eq!(
            res.tag_used.as_deref(),
            Some("us-gaap:PaymentsForRepurchaseOfEquity")
        );
        assert_eq!(res.warnings.len(), 1);
        assert!(res.warnings[0].contains("preferred"));
    }

    #[test]
    fn test_latest_filed_observation_wins() {
        let facts = facts(json!({
            "facts": {"us-gaap": {
                "PaymentsForRepurchaseOfCommonStock": {"units": {"USD": [
                    {"val": 1000, "start": "2023-01-01", "end": "2023-12-31", "form": "10-K", "filed": "2024-02-01"},
                    {"val": 1100, "start": "2023-01-01", "end": "2023-12-31", "form": "10-K", "filed": "2025-02-01"}
                ]}}
            }}
        }));

        let res = resolve(&facts, REPURCHASE_TAGS, FormKind::Annual, date("2023-12-31"));
        assert_eq!(res.value, Some(1_100.0));
    }

    #[test]
    fn test_form_and_period_must_match() {
        let facts = facts(json!({
            "facts": {"us-gaap": {
                "PaymentsOfDividendsCommonStock": {"units": {"USD": [
                    {"val": 500, "start": "2024-01-01", "end": "2024-03-31", "form": "10-Q", "filed": "2024-05-01"}
                ]}}
            }}
        }));

        let annual = resolve(&facts, DIVIDEND_TAGS, FormKind::Annual, date("2024-03-31"));
        assert_eq!(annual, Resolution::default());

        let other_period =
            resolve(&facts, DIVIDEND_TAGS, FormKind::Quarterly, date("2024-06-30"));
        assert_eq!(other_period.value, None);
        assert_eq!(other_period.tag_used, None);
        assert!(other_period.warnings.is_empty());

        let quarterly = resolve(&facts, DIVIDEND_TAGS, FormKind::Quarterly, date("2024-03-31"));
        assert_eq!(quarterly.value, Some(500.0));
    }

    #[test]
    fn test_equal_filing_dates_prefer_shortest_period() {
        // A 10-Q reports both the quarter and the year to date
        let facts = facts(json!({
            "facts": {"us-gaap": {
                "PaymentsOfDividendsCommonStock": {"units": {"USD": [
                    {"val": 1200, "start": "2024-01-01", "end": "2024-06-30", "form": "10-Q", "filed": "2024-08-01"},
                    {"val": 600, "start": "2024-04-01", "end": "2024-06-30", "form": "10-Q", "filed": "2024-08-01"}
                ]}}
            }}
        }));

        let res = resolve(&facts, DIVIDEND_TAGS, FormKind::Quarterly, date("2024-06-30"));
        assert_eq!(res.value, Some(600.0));
    }

    #[test]
    fn test_employee_count_from_cover_page() {
        let facts = facts(json!({
            "facts": {"dei": {
                "EntityNumberOfEmployees": {"units": {"pure": [
                    {"val": 164000, "end": "2024-09-28", "form": "10-K", "filed": "2024-11-01"}
                ]}}
            }}
        }));

        let res = resolve(&facts, EMPLOYEE_TAGS, FormKind::Annual, date("2024-09-28"));
        assert_eq!(res.value, Some(164_000.0));
        assert_eq!(res.tag_used.as_deref(), Some("dei:EntityNumberOfEmployees"));
    }

    #[test]
    fn test_empty_facts_resolve_to_nothing() {
        let res = resolve(
            &CompanyFacts::default(),
            DIVIDEND_TAGS,
            FormKind::Annual,
            date("2024-09-28"),
        );
        assert_eq!(res, Resolution::default());
    }
}
