//! Active runner ranking — the single definition of "favourite".
//!
//! Every consumer (market filter, field resolver, target resolver, diagnostics)
//! goes through `ActiveRanking`, so the tie-break is applied identically.

use crate::domain::{MarketSnapshot, RunnerSnapshot, RunnerStatus};

/// A ranked runner together with the lay price it was ranked by.
#[derive(Debug, Clone, Copy)]
pub struct RankedRunner<'a> {
    pub runner: &'a RunnerSnapshot,
    pub lay_price: f64,
}

/// Active runners with a lay price, ascending by best lay price.
///
/// Equal prices keep the snapshot's runner order (stable sort).
#[derive(Debug, Clone)]
pub struct ActiveRanking<'a> {
    ranked: Vec<RankedRunner<'a>>,
}

impl<'a> ActiveRanking<'a> {
    pub fn of(market: &'a MarketSnapshot) -> Self {
        let mut ranked: Vec<RankedRunner<'a>> = market
            .runners
            .iter()
            .filter(|r| r.status == RunnerStatus::Active)
            .filter_map(|r| {
                r.best_available_to_lay
                    .map(|lay_price| RankedRunner { runner: r, lay_price })
            })
            .collect();
        ranked.sort_by(|a, b| a.lay_price.total_cmp(&b.lay_price));
        Self { ranked }
    }

    /// Runner at zero-based rank, if the market has that many.
    pub fn get(&self, rank: usize) -> Option<RankedRunner<'a>> {
        self.ranked.get(rank).copied()
    }

    pub fn favourite(&self) -> Option<RankedRunner<'a>> {
        self.get(0)
    }

    pub fn second_favourite(&self) -> Option<RankedRunner<'a>> {
        self.get(1)
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedRunner<'a>> {
        self.ranked.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, MarketStatus, SelectionId};

    fn runner(id: u64, lay: Option<f64>, status: RunnerStatus) -> RunnerSnapshot {
        RunnerSnapshot {
            selection_id: SelectionId(id),
            runner_name: format!("R{id}"),
            handicap: 0.0,
            status,
            best_available_to_lay: lay,
            best_available_to_back: lay.map(|p| p - 0.1),
            lay_depth: vec![],
            back_depth: vec![],
            last_price_traded: None,
            total_matched: 0.0,
        }
    }

    fn market(runners: Vec<RunnerSnapshot>) -> MarketSnapshot {
        MarketSnapshot {
            market_id: MarketId::new("1.1"),
            market_name: "R1".into(),
            venue: "Kempton".into(),
            market_start_time: String::new(),
            event_name: String::new(),
            event_country: "GB".into(),
            status: MarketStatus::Open,
            inplay: false,
            recorded_at: String::new(),
            number_of_winners: 1,
            total_matched: 0.0,
            runners,
        }
    }

    #[test]
    fn sorted_ascending_by_lay_price() {
        let m = market(vec![
            runner(1, Some(5.0), RunnerStatus::Active),
            runner(2, Some(1.9), RunnerStatus::Active),
            runner(3, Some(3.2), RunnerStatus::Active),
        ]);
        let ranking = ActiveRanking::of(&m);
        let ids: Vec<u64> = ranking.iter().map(|r| r.runner.selection_id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranking.favourite().unwrap().lay_price, 1.9);
    }

    #[test]
    fn excludes_inactive_and_unpriced() {
        let m = market(vec![
            runner(1, Some(2.0), RunnerStatus::Removed),
            runner(2, None, RunnerStatus::Active),
            runner(3, Some(4.0), RunnerStatus::Active),
        ]);
        let ranking = ActiveRanking::of(&m);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.favourite().unwrap().runner.selection_id, SelectionId(3));
        assert!(ranking.second_favourite().is_none());
    }

    #[test]
    fn ties_keep_input_order() {
        let m = market(vec![
            runner(9, Some(3.0), RunnerStatus::Active),
            runner(4, Some(3.0), RunnerStatus::Active),
            runner(7, Some(2.0), RunnerStatus::Active),
        ]);
        let ranking = ActiveRanking::of(&m);
        let ids: Vec<u64> = ranking.iter().map(|r| r.runner.selection_id.0).collect();
        assert_eq!(ids, vec![7, 9, 4]);
    }
}
