use std::collections::BTreeSet;

use crate::data::filter::{filtered_indices, FilterSelection};
use crate::data::model::{Transaction, TransactionSet};
use crate::data::summary::{Summaries, DEFAULT_TOP_BENEFICIARIES};

// ---------------------------------------------------------------------------
// Dashboard session state
// ---------------------------------------------------------------------------

/// One dashboard session, independent of rendering.
///
/// A front end loads a dataset once, mutates the selection through the
/// toggle/select methods, and reads back [`DashboardState::summaries`] plus
/// [`DashboardState::visible_transactions`] after every change.
#[derive(Debug)]
pub struct DashboardState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<TransactionSet>,

    /// Current allow-sets for the two filter fields.
    pub selection: FilterSelection,

    /// Indices of rows passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Per-region cutoff for the beneficiary ranking.
    pub top_beneficiaries: usize,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: FilterSelection::default(),
            visible_indices: Vec::new(),
            top_beneficiaries: DEFAULT_TOP_BENEFICIARIES,
        }
    }
}

impl DashboardState {
    /// Ingest a newly loaded dataset; every category value starts selected.
    pub fn set_dataset(&mut self, dataset: TransactionSet) {
        self.selection = FilterSelection::all_from(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.dataset = Some(dataset);
    }

    /// Recompute `visible_indices` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.selection);
        }
    }

    /// Toggle a single account-type value in the selection.
    pub fn toggle_account_type(&mut self, value: &str) {
        toggle(&mut self.selection.account_types, value);
        self.refilter();
    }

    /// Toggle a single region value in the selection.
    pub fn toggle_region(&mut self, value: &str) {
        toggle(&mut self.selection.regions, value);
        self.refilter();
    }

    /// Select every observed account type.
    pub fn select_all_account_types(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection.account_types = ds.account_types.clone();
            self.refilter();
        }
    }

    /// Deselect every account type (hides all rows).
    pub fn select_none_account_types(&mut self) {
        self.selection.account_types.clear();
        self.refilter();
    }

    /// Select every observed region.
    pub fn select_all_regions(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection.regions = ds.regions.clone();
            self.refilter();
        }
    }

    /// Deselect every region (hides all rows).
    pub fn select_none_regions(&mut self) {
        self.selection.regions.clear();
        self.refilter();
    }

    /// The rows passing the current selection, for tabular display.
    pub fn visible_transactions(&self) -> Vec<&Transaction> {
        match &self.dataset {
            Some(ds) => self
                .visible_indices
                .iter()
                .map(|&i| &ds.transactions[i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Compute the chart summaries for the current selection.
    pub fn summaries(&self) -> Option<Summaries> {
        self.dataset
            .as_ref()
            .map(|ds| Summaries::compute(ds, &self.visible_indices, self.top_beneficiaries))
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
