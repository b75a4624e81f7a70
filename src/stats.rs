use serde::Serialize;

use crate::data::model::{IpoRecord, NumericField, Status};

// ---------------------------------------------------------------------------
// Market snapshot (KPI row)
// ---------------------------------------------------------------------------

/// Headline statistics over a (possibly filtered) set of rows.
///
/// Means are `None` for an empty selection so the UI can print "N/A".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub total: usize,
    pub avg_listing_gain: Option<f64>,
    pub profitable: usize,
    /// Percentage of rows with a positive listing gain, 0 when empty.
    pub success_rate: f64,
    pub avg_issue_size: Option<f64>,
}

impl MarketSnapshot {
    pub fn compute(rows: &[&IpoRecord]) -> Self {
        let total = rows.len();
        let profitable = rows.iter().filter(|r| r.status() == Status::Profit).count();
        let success_rate = if total > 0 {
            profitable as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        MarketSnapshot {
            total,
            avg_listing_gain: mean_of(rows, NumericField::ListingGain),
            profitable,
            success_rate,
            avg_issue_size: mean_of(rows, NumericField::IssueSize),
        }
    }
}

/// Mean of a column over rows that carry a value for it.
pub fn mean_of(rows: &[&IpoRecord], field: NumericField) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .filter_map(|r| r.value(field))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Company scorecard
// ---------------------------------------------------------------------------

/// The figures shown for a single selected company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyScorecard {
    pub company_name: String,
    pub listing_year: i32,
    pub issue_price: f64,
    pub issue_size: f64,
    pub listing_gain_percent: f64,
    pub status: Status,
    pub qib_subscription: f64,
    pub hni_subscription: Option<f64>,
    pub rii_subscription: f64,
    pub total_subscription: Option<f64>,
}

impl CompanyScorecard {
    /// Scorecard of the first row named exactly `name`.
    pub fn for_company(rows: &[&IpoRecord], name: &str) -> Option<Self> {
        rows.iter().find(|r| r.company_name == name).map(|r| CompanyScorecard {
            company_name: r.company_name.clone(),
            listing_year: r.listing_year,
            issue_price: r.issue_price,
            issue_size: r.issue_size,
            listing_gain_percent: r.listing_gain_percent,
            status: r.status(),
            qib_subscription: r.qib_subscription,
            hni_subscription: r.hni_subscription,
            rii_subscription: r.rii_subscription,
            total_subscription: r.total_subscription,
        })
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation over rows where both fields are present.
pub fn correlation(rows: &[&IpoRecord], a: NumericField, b: NumericField) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.value(a)?, r.value(b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

/// Square matrix of pairwise correlations, `matrix[i][j]` for
/// `fields[i]` against `fields[j]`.
pub fn correlation_matrix(rows: &[&IpoRecord], fields: &[NumericField]) -> Vec<Vec<Option<f64>>> {
    fields
        .iter()
        .map(|&a| fields.iter().map(|&b| correlation(rows, a, b)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterCriteria};
    use crate::data::model::{record, IpoDataset};
    use std::collections::BTreeSet;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn success_rate_matches_hand_count() {
        let records = vec![
            record("A", 2019, 12.0),
            record("B", 2019, -3.0),
            record("C", 2020, 0.0),
            record("D", 2020, 45.5),
            record("E", 2021, 0.01),
        ];
        let rows: Vec<&IpoRecord> = records.iter().collect();
        let snap = MarketSnapshot::compute(&rows);

        assert_eq!(snap.total, 5);
        assert_eq!(snap.profitable, 3);
        assert!(approx(snap.success_rate, 3.0 / 5.0 * 100.0));
        assert!(approx(snap.avg_listing_gain.unwrap(), 54.51 / 5.0));
        assert_eq!(snap.avg_issue_size, Some(500.0));
    }

    #[test]
    fn year_subset_statistics() {
        let ds = IpoDataset::from_records(
            vec![record("A", 2021, 10.0), record("B", 2021, -5.0), record("C", 2022, 0.0)],
            Vec::new(),
        );
        let criteria = FilterCriteria {
            years: BTreeSet::from([2021]),
            company: None,
        };
        let rows = apply(&ds, &criteria);
        let snap = MarketSnapshot::compute(&rows);

        assert_eq!(snap.total, 2);
        assert!(approx(snap.avg_listing_gain.unwrap(), 2.5));
        assert!(approx(snap.success_rate, 50.0));
    }

    #[test]
    fn empty_selection_is_defined() {
        let snap = MarketSnapshot::compute(&[]);
        assert_eq!(snap.total, 0);
        assert_eq!(snap.profitable, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.avg_listing_gain, None);
        assert_eq!(snap.avg_issue_size, None);
    }

    #[test]
    fn scorecard_for_single_company() {
        let mut x = record("X Industries", 2021, -7.25);
        x.issue_price = 310.0;
        x.rii_subscription = 4.5;
        let ds = IpoDataset::from_records(vec![record("Y Corp", 2021, 3.0), x.clone()], Vec::new());
        let criteria = FilterCriteria {
            years: BTreeSet::new(),
            company: Some("X Industries".to_string()),
        };
        let rows = apply(&ds, &criteria);
        let card = CompanyScorecard::for_company(&rows, "X Industries").expect("scorecard");

        assert_eq!(card.company_name, "X Industries");
        assert_eq!(card.issue_price, 310.0);
        assert_eq!(card.listing_gain_percent, -7.25);
        assert_eq!(card.status, Status::Loss);
        assert_eq!(card.rii_subscription, 4.5);
        assert_eq!(card.total_subscription, x.total_subscription);
        assert!(CompanyScorecard::for_company(&rows, "Y Corp").is_none());
    }

    #[test]
    fn correlation_basics() {
        let mut records = Vec::new();
        for (i, gain) in [1.0, 2.0, 3.0, 4.0].into_iter().enumerate() {
            let mut r = record(&format!("R{i}"), 2020, gain);
            r.qib_subscription = gain * 2.0;
            r.rii_subscription = -gain;
            records.push(r);
        }
        let rows: Vec<&IpoRecord> = records.iter().collect();

        let qib = NumericField::SubscriptionQib;
        let rii = NumericField::SubscriptionRii;
        let gain = NumericField::ListingGain;
        assert!(approx(correlation(&rows, qib, gain).unwrap(), 1.0));
        assert!(approx(correlation(&rows, rii, gain).unwrap(), -1.0));
        // Constant column has no defined correlation.
        assert_eq!(correlation(&rows, NumericField::IssuePrice, gain), None);

        let m = correlation_matrix(&rows, &[qib, gain]);
        assert_eq!(m.len(), 2);
        assert!(approx(m[0][0].unwrap(), 1.0));
        assert!(approx(m[1][1].unwrap(), 1.0));
    }

    #[test]
    fn mean_skips_missing_optional_values() {
        let mut a = record("A", 2020, 1.0);
        a.hni_subscription = None;
        let mut b = record("B", 2020, 1.0);
        b.hni_subscription = Some(9.0);
        let rows = vec![&a, &b];
        assert_eq!(mean_of(&rows, NumericField::SubscriptionHni), Some(9.0));
        assert_eq!(mean_of(&[], NumericField::SubscriptionHni), None);
    }
}
