use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use super::model::{Transaction, TransactionSet};

/// Z-score magnitude beyond which an amount counts as anomalous.
const ANOMALY_THRESHOLD: f64 = 3.0;

/// Default per-region cutoff for the beneficiary ranking.
pub const DEFAULT_TOP_BENEFICIARIES: usize = 5;

// ---------------------------------------------------------------------------
// Summaries – everything the rendering layer needs for one pass
// ---------------------------------------------------------------------------

/// The five chart-ready aggregates of one dashboard pass.
///
/// Each summary is a pure function of the visible rows; they are mutually
/// independent, and a skipped one (the yearly trend on a dateless source)
/// never affects the others.
#[derive(Debug, Clone, Serialize)]
pub struct Summaries {
    /// Record count per account type (pie chart).
    pub account_type_distribution: BTreeMap<String, usize>,
    /// Per-region top beneficiaries by summed credit (bar chart).
    pub top_beneficiaries: Vec<BeneficiaryCredit>,
    /// Credit/debit totals per region (heat grid).
    pub regional_intensity: Vec<RegionFlow>,
    /// Year-by-year totals over the unfiltered dataset (trend lines);
    /// `None` when the source had no Date column.
    pub yearly_trend: Option<Vec<YearlyFlow>>,
    /// Statistical outliers among the visible rows (scatter highlight).
    pub anomalies: Vec<Anomaly>,
}

impl Summaries {
    /// Compute all five summaries for the rows selected by `visible`.
    ///
    /// The yearly trend reads the whole dataset rather than the visible rows:
    /// it shows the overall flow no matter what the user filtered down to.
    pub fn compute(dataset: &TransactionSet, visible: &[usize], top_beneficiaries: usize) -> Self {
        Summaries {
            account_type_distribution: account_type_distribution(dataset, visible),
            top_beneficiaries: top_beneficiaries_by_region(dataset, visible, top_beneficiaries),
            regional_intensity: regional_intensity(dataset, visible),
            yearly_trend: yearly_trend(dataset),
            anomalies: detect_anomalies(dataset, visible),
        }
    }
}

fn rows<'a>(
    dataset: &'a TransactionSet,
    visible: &'a [usize],
) -> impl Iterator<Item = &'a Transaction> + 'a {
    visible.iter().map(move |&i| &dataset.transactions[i])
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Count of visible transactions per account type.  The counts always sum to
/// the number of visible rows.
pub fn account_type_distribution(
    dataset: &TransactionSet,
    visible: &[usize],
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for txn in rows(dataset, visible) {
        *counts.entry(txn.account_type.clone()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Top beneficiaries per region
// ---------------------------------------------------------------------------

/// One row of the per-region beneficiary ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryCredit {
    pub region: String,
    pub beneficiary: String,
    pub credit: f64,
}

/// Sum credit per (region, beneficiary) pair and keep the `per_region`
/// largest sums within each region.
///
/// Output rows are grouped contiguously by region (sorted by name) and
/// descending by credit within a region; beneficiaries with equal sums keep
/// their first-seen order. A region with fewer distinct beneficiaries than
/// the cutoff contributes all of them.
pub fn top_beneficiaries_by_region(
    dataset: &TransactionSet,
    visible: &[usize],
    per_region: usize,
) -> Vec<BeneficiaryCredit> {
    // region → (beneficiary, summed credit) in first-seen order
    let mut grouped: BTreeMap<&str, Vec<(&str, f64)>> = BTreeMap::new();
    for txn in rows(dataset, visible) {
        let entries = grouped.entry(txn.region.as_str()).or_default();
        match entries.iter_mut().find(|entry| entry.0 == txn.beneficiary) {
            Some(entry) => entry.1 += txn.credit,
            None => entries.push((txn.beneficiary.as_str(), txn.credit)),
        }
    }

    let mut ranked = Vec::new();
    for (region, mut entries) in grouped {
        // Stable sort: equal sums keep their first-seen order.
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries.truncate(per_region);
        ranked.extend(
            entries
                .into_iter()
                .map(|(beneficiary, credit)| BeneficiaryCredit {
                    region: region.to_string(),
                    beneficiary: beneficiary.to_string(),
                    credit,
                }),
        );
    }
    ranked
}

// ---------------------------------------------------------------------------
// Regional intensity
// ---------------------------------------------------------------------------

/// Total credit and debit flow for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFlow {
    pub region: String,
    pub credit: f64,
    pub debit: f64,
}

/// Sum credit and debit per region, one row per distinct region present.
pub fn regional_intensity(dataset: &TransactionSet, visible: &[usize]) -> Vec<RegionFlow> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for txn in rows(dataset, visible) {
        let entry = totals.entry(txn.region.as_str()).or_insert((0.0, 0.0));
        entry.0 += txn.credit;
        entry.1 += txn.debit;
    }

    totals
        .into_iter()
        .map(|(region, (credit, debit))| RegionFlow {
            region: region.to_string(),
            credit,
            debit,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Yearly trend
// ---------------------------------------------------------------------------

/// Credit and debit totals for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyFlow {
    pub year: i32,
    pub credit: f64,
    pub debit: f64,
}

/// Year-by-year totals over the full (unfiltered) dataset, ascending by year.
///
/// `None` when the source had no Date column; that is a skip, not an error.
pub fn yearly_trend(dataset: &TransactionSet) -> Option<Vec<YearlyFlow>> {
    if !dataset.has_dates {
        return None;
    }

    let mut totals: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
    for txn in &dataset.transactions {
        let Some(date) = txn.date else { continue };
        let entry = totals.entry(date.year()).or_insert((0.0, 0.0));
        entry.0 += txn.credit;
        entry.1 += txn.debit;
    }

    Some(
        totals
            .into_iter()
            .map(|(year, (credit, debit))| YearlyFlow { year, credit, debit })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Anomaly detection
// ---------------------------------------------------------------------------

/// A transaction flagged as a statistical outlier, with its z-scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Index of the row within the full dataset.
    pub index: usize,
    pub transaction: Transaction,
    pub credit_z: f64,
    pub debit_z: f64,
}

/// Flag visible rows whose credit or debit lies more than three population
/// standard deviations from the mean of the visible rows.
///
/// A zero standard deviation (all amounts equal, or a single row) makes that
/// amount's z-scores 0 instead of letting a division by zero leak NaN into
/// the output; empty input yields an empty set.
pub fn detect_anomalies(dataset: &TransactionSet, visible: &[usize]) -> Vec<Anomaly> {
    if visible.is_empty() {
        return Vec::new();
    }

    let credits: Vec<f64> = rows(dataset, visible).map(|t| t.credit).collect();
    let debits: Vec<f64> = rows(dataset, visible).map(|t| t.debit).collect();
    let credit_stats = MeanStd::of(&credits);
    let debit_stats = MeanStd::of(&debits);

    visible
        .iter()
        .copied()
        .filter_map(|i| {
            let txn = &dataset.transactions[i];
            let credit_z = credit_stats.z_score(txn.credit);
            let debit_z = debit_stats.z_score(txn.debit);
            let anomalous =
                credit_z.abs() > ANOMALY_THRESHOLD || debit_z.abs() > ANOMALY_THRESHOLD;
            anomalous.then(|| Anomaly {
                index: i,
                transaction: txn.clone(),
                credit_z,
                debit_z,
            })
        })
        .collect()
}

/// Population mean and standard deviation of a non-empty sample.
struct MeanStd {
    mean: f64,
    std_dev: f64,
}

impl MeanStd {
    fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        MeanStd {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    fn z_score(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterSelection};
    use chrono::NaiveDate;

    fn txn(
        account_type: &str,
        region: &str,
        beneficiary: &str,
        credit: f64,
        debit: f64,
    ) -> Transaction {
        Transaction {
            account_type: account_type.to_string(),
            region: region.to_string(),
            beneficiary: beneficiary.to_string(),
            credit,
            debit,
            date: None,
        }
    }

    fn dated(mut t: Transaction, year: i32) -> Transaction {
        t.date = NaiveDate::from_ymd_opt(year, 6, 15);
        t
    }

    /// The three-row scenario used across the filter and summary tests.
    fn scenario() -> TransactionSet {
        TransactionSet::from_transactions(
            vec![
                txn("Retail", "North", "Apex Bank", 100.0, 50.0),
                txn("Retail", "North", "Harbor Bank", 200.0, 60.0),
                txn("Corporate", "South", "Apex Bank", 300.0, 70.0),
            ],
            false,
        )
    }

    fn retail_north(ds: &TransactionSet) -> Vec<usize> {
        let selection = FilterSelection {
            account_types: ["Retail".to_string()].into(),
            regions: ["North".to_string()].into(),
        };
        filtered_indices(ds, &selection)
    }

    #[test]
    fn distribution_counts_filtered_rows() {
        let ds = scenario();
        let visible = retail_north(&ds);
        assert_eq!(visible, vec![0, 1]);

        let counts = account_type_distribution(&ds, &visible);
        assert_eq!(counts, BTreeMap::from([("Retail".to_string(), 2)]));
        assert_eq!(counts.values().sum::<usize>(), visible.len());
    }

    #[test]
    fn regional_intensity_conserves_totals() {
        let ds = scenario();
        let visible = retail_north(&ds);

        let intensity = regional_intensity(&ds, &visible);
        assert_eq!(
            intensity,
            vec![RegionFlow {
                region: "North".to_string(),
                credit: 300.0,
                debit: 110.0,
            }]
        );

        // Conservation over the full selection too.
        let all: Vec<usize> = (0..ds.len()).collect();
        let total_credit: f64 = regional_intensity(&ds, &all).iter().map(|r| r.credit).sum();
        assert_eq!(total_credit, 600.0);
    }

    #[test]
    fn top_beneficiaries_ranks_within_each_region() {
        let ds = TransactionSet::from_transactions(
            vec![
                txn("Retail", "North", "Apex Bank", 300.0, 0.0),
                txn("Retail", "North", "Harbor Bank", 600.0, 0.0),
                txn("Retail", "North", "Apex Bank", 200.0, 0.0),
                txn("Retail", "South", "Crescent Bank", 50.0, 0.0),
            ],
            false,
        );
        let all: Vec<usize> = (0..ds.len()).collect();

        let ranked = top_beneficiaries_by_region(&ds, &all, 2);
        assert_eq!(ranked.len(), 3);
        // North: Harbor (600) before Apex (300 + 200); South: just Crescent.
        assert_eq!(ranked[0].beneficiary, "Harbor Bank");
        assert_eq!(ranked[1].beneficiary, "Apex Bank");
        assert_eq!(ranked[1].credit, 500.0);
        assert_eq!(ranked[2].region, "South");
    }

    #[test]
    fn top_beneficiaries_caps_rows_and_breaks_ties_by_first_seen() {
        // D and E tie at 100; D appears first in the input and must stay
        // ahead of E. F and G fall below the cutoff.
        let banks = [
            ("A", 500.0),
            ("B", 450.0),
            ("C", 400.0),
            ("D", 100.0),
            ("E", 100.0),
            ("F", 50.0),
            ("G", 40.0),
        ];
        let transactions: Vec<Transaction> = banks
            .iter()
            .map(|&(bank, credit)| txn("Retail", "North", bank, credit, 0.0))
            .collect();
        let ds = TransactionSet::from_transactions(transactions, false);
        let all: Vec<usize> = (0..ds.len()).collect();

        let ranked = top_beneficiaries_by_region(&ds, &all, 5);
        assert_eq!(ranked.len(), 5);
        for pair in ranked.windows(2) {
            assert!(pair[0].credit >= pair[1].credit);
        }
        assert_eq!(ranked[3].beneficiary, "D");
        assert_eq!(ranked[4].beneficiary, "E");
    }

    #[test]
    fn yearly_trend_uses_the_unfiltered_dataset() {
        let ds = TransactionSet::from_transactions(
            vec![
                dated(txn("Retail", "North", "Apex Bank", 100.0, 10.0), 2021),
                dated(txn("Retail", "North", "Apex Bank", 200.0, 20.0), 2021),
                dated(txn("Corporate", "South", "Harbor Bank", 400.0, 40.0), 2022),
            ],
            true,
        );

        // Filter down to a single row; the trend still covers every row.
        let summaries = Summaries::compute(&ds, &[0], DEFAULT_TOP_BENEFICIARIES);
        let trend = summaries.yearly_trend.unwrap();
        assert_eq!(
            trend,
            vec![
                YearlyFlow { year: 2021, credit: 300.0, debit: 30.0 },
                YearlyFlow { year: 2022, credit: 400.0, debit: 40.0 },
            ]
        );
    }

    #[test]
    fn yearly_trend_is_skipped_without_dates() {
        let ds = scenario();
        let all: Vec<usize> = (0..ds.len()).collect();

        let summaries = Summaries::compute(&ds, &all, DEFAULT_TOP_BENEFICIARIES);
        assert!(summaries.yearly_trend.is_none());
        // The skip never blocks the sibling summaries.
        assert_eq!(summaries.account_type_distribution.len(), 2);
        assert_eq!(summaries.regional_intensity.len(), 2);
    }

    #[test]
    fn zero_variance_amounts_are_not_anomalous() {
        let transactions = vec![txn("Retail", "North", "Apex Bank", 100.0, 100.0); 10];
        let ds = TransactionSet::from_transactions(transactions, false);
        let all: Vec<usize> = (0..ds.len()).collect();

        assert!(detect_anomalies(&ds, &all).is_empty());
    }

    #[test]
    fn extreme_outlier_is_flagged() {
        let mut transactions: Vec<Transaction> =
            (0..30).map(|_| txn("Retail", "North", "Apex Bank", 100.0, 10.0)).collect();
        transactions.push(txn("Retail", "North", "Harbor Bank", 10_000.0, 10.0));
        let ds = TransactionSet::from_transactions(transactions, false);
        let all: Vec<usize> = (0..ds.len()).collect();

        let anomalies = detect_anomalies(&ds, &all);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].index, 30);
        assert!(anomalies[0].credit_z > ANOMALY_THRESHOLD);
        assert!(anomalies[0].credit_z.is_finite());
        assert!(anomalies[0].debit_z.abs() <= ANOMALY_THRESHOLD);
    }

    #[test]
    fn empty_input_yields_empty_summaries() {
        let ds = scenario();

        let summaries = Summaries::compute(&ds, &[], DEFAULT_TOP_BENEFICIARIES);
        assert!(summaries.account_type_distribution.is_empty());
        assert!(summaries.top_beneficiaries.is_empty());
        assert!(summaries.regional_intensity.is_empty());
        assert!(summaries.anomalies.is_empty());
    }
}
