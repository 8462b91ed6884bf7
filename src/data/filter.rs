use std::collections::BTreeSet;

use super::model::{Transaction, TransactionSet};

// ---------------------------------------------------------------------------
// Filter selection: which category values are allowed per field
// ---------------------------------------------------------------------------

/// Allow-sets for the two categorical filter fields.
///
/// A row passes when both its account type and its region are members of the
/// respective set. An empty set therefore hides everything; the "no filter"
/// default is a selection containing every observed value, see
/// [`FilterSelection::all_from`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub account_types: BTreeSet<String>,
    pub regions: BTreeSet<String>,
}

impl FilterSelection {
    /// A selection with every value observed in `dataset` selected (show all).
    pub fn all_from(dataset: &TransactionSet) -> Self {
        FilterSelection {
            account_types: dataset.account_types.clone(),
            regions: dataset.regions.clone(),
        }
    }

    /// Whether a single transaction passes this selection.
    pub fn matches(&self, txn: &Transaction) -> bool {
        self.account_types.contains(&txn.account_type) && self.regions.contains(&txn.region)
    }
}

/// Return indices of transactions that pass the selection, in input order.
pub fn filtered_indices(dataset: &TransactionSet, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, txn)| selection.matches(txn))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(account_type: &str, region: &str) -> Transaction {
        Transaction {
            account_type: account_type.to_string(),
            region: region.to_string(),
            beneficiary: "Apex Bank".to_string(),
            credit: 0.0,
            debit: 0.0,
            date: None,
        }
    }

    fn dataset() -> TransactionSet {
        TransactionSet::from_transactions(
            vec![
                txn("Retail", "North"),
                txn("Retail", "South"),
                txn("Corporate", "North"),
            ],
            false,
        )
    }

    #[test]
    fn full_selection_is_identity() {
        let ds = dataset();
        let all = FilterSelection::all_from(&ds);
        assert_eq!(filtered_indices(&ds, &all), vec![0, 1, 2]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        assert!(filtered_indices(&ds, &FilterSelection::default()).is_empty());
    }

    #[test]
    fn both_fields_must_match() {
        let ds = dataset();
        let selection = FilterSelection {
            account_types: ["Retail".to_string()].into(),
            regions: ["North".to_string()].into(),
        };
        // Row 1 has the right account type, row 2 the right region; only
        // row 0 has both.
        assert_eq!(filtered_indices(&ds, &selection), vec![0]);
    }

    #[test]
    fn partial_selection_preserves_input_order() {
        let ds = dataset();
        let selection = FilterSelection {
            account_types: ["Retail".to_string(), "Corporate".to_string()].into(),
            regions: ["North".to_string()].into(),
        };
        assert_eq!(filtered_indices(&ds, &selection), vec![0, 2]);
    }
}
