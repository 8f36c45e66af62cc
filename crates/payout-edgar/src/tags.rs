//! Structured fact tag tables.
//!
//! Filers tag economically equivalent values with different concepts. Each
//! metric is resolved by walking an ordered list of acceptable concepts, most
//! precise first; broader substitutes carry a caveat that is surfaced as a
//! provenance warning whenever they are the ones that matched.

/// Taxonomy of US GAAP financial statement concepts.
pub const US_GAAP: &str = "us-gaap";
/// Taxonomy of document and entity information (cover page) concepts.
pub const DEI: &str = "dei";

/// Currency first, then dimensionless.
const MONETARY_UNITS: &[&str] = &["USD", "pure"];
const HEADCOUNT_UNITS: &[&str] = &["pure", "employee", "Employee"];

/// One acceptable concept for a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagCandidate {
    /// Concept name, e.g. `PaymentsOfDividendsCommonStock`.
    pub concept: &'static str,
    /// Taxonomies the concept may live under, in lookup order.
    pub taxonomies: &'static [&'static str],
    /// Unit kinds to try, in lookup order.
    pub units: &'static [&'static str],
    /// Why a match on this concept may not be exactly the intended figure.
    pub caveat: Option<&'static str>,
}

impl TagCandidate {
    const fn monetary(concept: &'static str, caveat: Option<&'static str>) -> Self {
        Self {
            concept,
            taxonomies: &[US_GAAP],
            units: MONETARY_UNITS,
            caveat,
        }
    }

    const fn headcount(concept: &'static str, taxonomy: &'static [&'static str]) -> Self {
        Self {
            concept,
            taxonomies: taxonomy,
            units: HEADCOUNT_UNITS,
            caveat: None,
        }
    }

    /// Qualified tag name, e.g. `us-gaap:PaymentsOfDividends`.
    #[must_use]
    pub fn qualified(&self, taxonomy: &str) -> String {
        format!("{taxonomy}:{}", self.concept)
    }
}

/// Cash dividends paid to common shareholders.
pub const DIVIDEND_TAGS: &[TagCandidate] = &[
    TagCandidate::monetary("PaymentsOfDividendsCommonStock", None),
    TagCandidate::monetary(
        "PaymentsOfDividends",
        Some("may include preferred and noncontrolling-interest dividends"),
    ),
    TagCandidate::monetary("PaymentsOfOrdinaryDividends", None),
    TagCandidate::monetary(
        "DividendsCommonStockCash",
        Some("dividends declared, which may differ from cash paid in the period"),
    ),
];

/// Cash spent repurchasing common stock.
pub const REPURCHASE_TAGS: &[TagCandidate] = &[
    TagCandidate::monetary("PaymentsForRepurchaseOfCommonStock", None),
    TagCandidate::monetary(
        "PaymentsForRepurchaseOfEquity",
        Some("may include preferred stock or other equity repurchases"),
    ),
    TagCandidate::monetary(
        "TreasuryStockValueAcquiredCostMethod",
        Some("treasury stock acquired at cost, which may differ from cash paid in the period"),
    ),
];

/// Reported headcount.
pub const EMPLOYEE_TAGS: &[TagCandidate] = &[
    TagCandidate::headcount("EntityNumberOfEmployees", &[DEI]),
    TagCandidate::headcount("NumberOfEmployees", &[US_GAAP, DEI]),
];
