//! Settlement resolution — final result per selection.

use std::collections::HashMap;

use crate::domain::{BetResult, MarketSnapshot, RunnerStatus, SelectionId};

/// Final results keyed by selection. Selections without an entry are `Unknown`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerResults {
    results: HashMap<SelectionId, BetResult>,
}

impl RunnerResults {
    /// Extract results from a settlement snapshot. `None` yields an empty set,
    /// so every lookup resolves to `Unknown`.
    pub fn from_settlement(settled: Option<&MarketSnapshot>) -> Self {
        let results = settled
            .map(|market| {
                market
                    .runners
                    .iter()
                    .filter_map(|r| settled_result(r.status).map(|res| (r.selection_id, res)))
                    .collect()
            })
            .unwrap_or_default();
        Self { results }
    }

    pub fn result_for(&self, selection_id: SelectionId) -> BetResult {
        self.results
            .get(&selection_id)
            .copied()
            .unwrap_or(BetResult::Unknown)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn settled_result(status: RunnerStatus) -> Option<BetResult> {
    match status {
        RunnerStatus::Winner => Some(BetResult::Winner),
        RunnerStatus::Loser => Some(BetResult::Loser),
        RunnerStatus::Removed => Some(BetResult::Removed),
        _ => None,
    }
}
