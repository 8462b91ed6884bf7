use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Transaction – one row of the source table
// ---------------------------------------------------------------------------

/// A single bank transaction (one row of the source file).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Account category, e.g. "Savings" or "Corporate".
    pub account_type: String,
    /// Geographic region the transaction belongs to.
    pub region: String,
    /// Beneficiary identifier ("Transaction To" in the source file).
    pub beneficiary: String,
    /// Incoming amount, non-negative and finite.
    pub credit: f64,
    /// Outgoing amount, non-negative and finite.
    pub debit: f64,
    /// Transaction date; present exactly when the source has a Date column.
    pub date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// TransactionSet – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed category indices.
///
/// Built once per run by the loader and treated as immutable afterwards;
/// filtering and summarising only ever read it.
#[derive(Debug, Clone)]
pub struct TransactionSet {
    /// All transactions (rows) in file order.
    pub transactions: Vec<Transaction>,
    /// Sorted set of distinct account types observed in the data.
    pub account_types: BTreeSet<String>,
    /// Sorted set of distinct regions observed in the data.
    pub regions: BTreeSet<String>,
    /// Whether the source file carried a Date column.
    pub has_dates: bool,
}

impl TransactionSet {
    /// Build category indices from the loaded rows.
    pub fn from_transactions(transactions: Vec<Transaction>, has_dates: bool) -> Self {
        let mut account_types = BTreeSet::new();
        let mut regions = BTreeSet::new();

        for txn in &transactions {
            account_types.insert(txn.account_type.clone());
            regions.insert(txn.region.clone());
        }
        TransactionSet {
            transactions,
            account_types,
            regions,
            has_dates,
        }
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
