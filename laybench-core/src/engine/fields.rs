//! Condition field resolution.

use crate::domain::MarketSnapshot;
use crate::strategy::{Condition, FieldRef};

use super::ranking::ActiveRanking;

/// Resolves named numeric fields against one market snapshot.
pub struct FieldResolver<'a> {
    market: &'a MarketSnapshot,
    ranking: &'a ActiveRanking<'a>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(market: &'a MarketSnapshot, ranking: &'a ActiveRanking<'a>) -> Self {
        Self { market, ranking }
    }

    /// Value of `field`, or `None` when the referenced runner does not exist.
    pub fn resolve(&self, field: FieldRef) -> Option<f64> {
        let fav = self.ranking.favourite();
        let second = self.ranking.second_favourite();
        match field {
            FieldRef::FavLayOdds => fav.map(|r| r.lay_price),
            FieldRef::FavBackOdds => fav.and_then(|r| r.runner.best_available_to_back),
            FieldRef::SecondFavLayOdds => second.map(|r| r.lay_price),
            FieldRef::SecondFavBackOdds => second.and_then(|r| r.runner.best_available_to_back),
            FieldRef::GapToSecond => match (fav, second) {
                (Some(f), Some(s)) => Some(s.lay_price - f.lay_price),
                _ => None,
            },
            FieldRef::RunnerCount => Some(self.ranking.len() as f64),
            FieldRef::TotalMatched => Some(self.market.total_matched),
            FieldRef::FavTotalMatched => fav.map(|r| r.runner.total_matched),
        }
    }

    /// Fails closed: an unavailable field makes the condition false.
    pub fn holds(&self, condition: &Condition) -> bool {
        match self.resolve(condition.field) {
            Some(actual) => {
                condition
                    .operator
                    .compare(actual, condition.value, condition.value_high)
            }
            None => false,
        }
    }
}

/// Convenience wrapper computing the ranking for a one-off lookup.
pub fn resolve_field(field: FieldRef, market: &MarketSnapshot) -> Option<f64> {
    let ranking = ActiveRanking::of(market);
    FieldResolver::new(market, &ranking).resolve(field)
}
