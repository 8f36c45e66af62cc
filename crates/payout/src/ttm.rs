//! Trailing-twelve-month aggregation.

use payout_core::{
    EmployeeCountSource, FormKind, MetricSnapshot, TtmSummary, per_employee, sum_known,
};

/// Quarterly filings needed for a full trailing year.
pub const TTM_QUARTERS: usize = 4;

/// Folds newest-first snapshots into one trailing-twelve-month summary.
///
/// 1. With at least four quarterly snapshots, the four most recent are summed.
///    A summed field is absent only if it is absent in all four.
/// 2. Otherwise the most recent annual snapshot is used as is.
/// 3. Otherwise the summary is unavailable and reports how many quarters exist.
///
/// Returns `None` when there are no snapshots at all.
#[must_use]
pub fn compute_ttm(snapshots: &[MetricSnapshot]) -> Option<TtmSummary> {
    if snapshots.is_empty() {
        return None;
    }

    let quarterly: Vec<&MetricSnapshot> = snapshots
        .iter()
        .filter(|s| s.form() == FormKind::Quarterly)
        .collect();
    let annual = || snapshots.iter().filter(|s| s.form() == FormKind::Annual);

    if quarterly.len() >= TTM_QUARTERS {
        let window = &quarterly[..TTM_QUARTERS];
        let dividends = window.iter().map(|s| s.dividends).fold(None, sum_known);
        let repurchases = window
            .iter()
            .map(|s| s.share_repurchases)
            .fold(None, sum_known);

        let headcount = quarterly
            .iter()
            .copied()
            .find(|s| s.employees.is_some())
            .or_else(|| annual().find(|s| s.employees.is_some()));

        return Some(summary(
            format!("sum of the {TTM_QUARTERS} most recent quarterly filings"),
            dividends,
            repurchases,
            headcount,
            TTM_QUARTERS,
        ));
    }

    if let Some(latest) = annual().next() {
        return Some(summary(
            format!(
                "annual filing fallback: {} of {TTM_QUARTERS} quarterly filings available, using the {} for period ending {}",
                quarterly.len(),
                latest.filing.form,
                latest.filing.period_end
            ),
            latest.dividends,
            latest.share_repurchases,
            Some(latest),
            0,
        ));
    }

    Some(TtmSummary {
        available: false,
        reason: format!(
            "insufficient data: {} of {TTM_QUARTERS} quarterly filings and no annual filing",
            quarterly.len()
        ),
        quarters_used: quarterly.len(),
        ..TtmSummary::default()
    })
}

fn summary(
    reason: String,
    dividends: Option<f64>,
    share_repurchases: Option<f64>,
    headcount: Option<&MetricSnapshot>,
    quarters_used: usize,
) -> TtmSummary {
    let total_returned = sum_known(dividends, share_repurchases);
    let employees = headcount.and_then(|s| s.employees);
    let employees_source = headcount.map_or(EmployeeCountSource::Unknown, |s| s.employees_source);

    TtmSummary {
        available: true,
        reason,
        dividends,
        share_repurchases,
        total_returned,
        employees,
        employees_source,
        dividends_per_employee: per_employee(dividends, employees),
        repurchases_per_employee: per_employee(share_repurchases, employees),
        total_returned_per_employee: per_employee(total_returned, employees),
        quarters_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use payout_core::{Filing, MetricProvenance};

    fn snapshot(
        form: FormKind,
        period_end: (i32, u32, u32),
        dividends: Option<f64>,
        repurchases: Option<f64>,
        employees: Option<u64>,
    ) -> MetricSnapshot {
        let (y, m, d) = period_end;
        let end = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let filing = Filing::new(
            form,
            format!("0000000001-{y}-{m:02}{d:02}"),
            end,
            end,
            "https://www.sec.gov/Archives/edgar/data/1/doc.htm",
        );
        MetricSnapshot::new(
            filing,
            dividends,
            repurchases,
            employees,
            MetricProvenance::default(),
        )
    }

    fn quarter(
        period_end: (i32, u32, u32),
        dividends: Option<f64>,
        repurchases: Option<f64>,
    ) -> MetricSnapshot {
        snapshot(FormKind::Quarterly, period_end, dividends, repurchases, None)
    }

    #[test]
    fn test_no_snapshots() {
        assert_eq!(compute_ttm(&[]), None);
    }

    #[test]
    fn test_four_quarters_are_summed() {
        let snapshots = vec![
            quarter((2024, 12, 31), Some(500.0), Some(1000.0)),
            quarter((2024, 9, 30), Some(600.0), Some(2000.0)),
            quarter((2024, 6, 30), Some(400.0), Some(1500.0)),
            quarter((2024, 3, 31), Some(700.0), Some(3000.0)),
        ];

        let ttm = compute_ttm(&snapshots).unwrap();
        assert!(ttm.available);
        assert_eq!(ttm.share_repurchases, Some(7500.0));
        assert_eq!(ttm.dividends, Some(2200.0));
        assert_eq!(ttm.total_returned, Some(9700.0));
        assert_eq!(ttm.quarters_used, 4);
        assert_eq!(ttm.employees, None);
        assert_eq!(ttm.employees_source, EmployeeCountSource::Unknown);
        assert_eq!(ttm.total_returned_per_employee, None);
    }

    #[test]
    fn test_only_four_most_recent_quarters_count() {
        let snapshots = vec![
            quarter((2025, 3, 31), Some(1.0), None),
            quarter((2024, 12, 31), Some(1.0), None),
            quarter((2024, 9, 30), Some(1.0), None),
            quarter((2024, 6, 30), Some(1.0), None),
            quarter((2024, 3, 31), Some(1000.0), None),
        ];

        let ttm = compute_ttm(&snapshots).unwrap();
        assert_eq!(ttm.dividends, Some(4.0));
        assert_eq!(ttm.share_repurchases, None);
        assert_eq!(ttm.total_returned, Some(4.0));
    }

    #[test]
    fn test_null_quarters_sum_to_null() {
        let snapshots = vec![
            quarter((2024, 12, 31), None, None),
            quarter((2024, 9, 30), None, None),
            quarter((2024, 6, 30), None, None),
            quarter((2024, 3, 31), None, None),
        ];

        let ttm = compute_ttm(&snapshots).unwrap();
        assert!(ttm.available);
        assert_eq!(ttm.dividends, None);
        assert_eq!(ttm.share_repurchases, None);
        assert_eq!(ttm.total_returned, None);
        assert_eq!(ttm.quarters_used, 4);
    }

    #[test]
    fn test_partial_nulls_are_treated_as_zero() {
        let snapshots = vec![
            quarter((2024, 12, 31), Some(100.0), None),
            quarter((2024, 9, 30), None, None),
            quarter((2024, 6, 30), Some(50.0), None),
            quarter((2024, 3, 31), None, None),
        ];

        assert_eq!(compute_ttm(&snapshots).unwrap().dividends, Some(150.0));
    }

    #[test]
    fn test_headcount_prefers_latest_quarter_then_annual() {
        let mut snapshots = vec![
            quarter((2024, 12, 31), Some(100.0), Some(100.0)),
            snapshot(FormKind::Quarterly, (2024, 9, 30), Some(100.0), Some(100.0), Some(50)),
            quarter((2024, 6, 30), Some(100.0), Some(100.0)),
            quarter((2024, 3, 31), Some(100.0), Some(100.0)),
            snapshot(FormKind::Annual, (2023, 12, 31), None, None, Some(80)),
        ];

        let ttm = compute_ttm(&snapshots).unwrap();
        assert_eq!(ttm.employees, Some(50));
        assert_eq!(ttm.employees_source, EmployeeCountSource::Reported);
        assert_eq!(ttm.total_returned, Some(800.0));
        assert_eq!(ttm.total_returned_per_employee, Some(16.0));

        snapshots[1].employees = None;
        let ttm = compute_ttm(&snapshots).unwrap();
        assert_eq!(ttm.employees, Some(80));
        assert_eq!(ttm.total_returned_per_employee, Some(10.0));
    }

    #[test]
    fn test_annual_fallback() {
        let snapshots = vec![
            quarter((2024, 3, 31), Some(1.0), Some(1.0)),
            snapshot(
                FormKind::Annual,
                (2023, 12, 31),
                Some(5000.0),
                Some(10000.0),
                Some(100),
            ),
        ];

        let ttm = compute_ttm(&snapshots).unwrap();
        assert!(ttm.available);
        assert_eq!(ttm.share_repurchases, Some(10000.0));
        assert_eq!(ttm.dividends, Some(5000.0));
        assert_eq!(ttm.total_returned, Some(15000.0));
        assert_eq!(ttm.quarters_used, 0);
        assert!(ttm.reason.contains("annual"));
        assert_eq!(ttm.dividends_per_employee, Some(50.0));
    }

    #[test]
    fn test_insufficient_quarters_without_annual() {
        let snapshots = vec![
            quarter((2024, 9, 30), Some(1.0), Some(1.0)),
            quarter((2024, 6, 30), Some(1.0), Some(1.0)),
            quarter((2024, 3, 31), Some(1.0), Some(1.0)),
        ];

        let ttm = compute_ttm(&snapshots).unwrap();
        assert!(!ttm.available);
        assert_eq!(ttm.quarters_used, 3);
        assert_eq!(ttm.dividends, None);
        assert_eq!(ttm.share_repurchases, None);
        assert_eq!(ttm.total_returned, None);
        assert_eq!(ttm.employees, None);
        assert_eq!(ttm.total_returned_per_employee, None);
    }
}
