//! MarketSnapshot — one market at one recorded instant.

use serde::{Deserialize, Serialize};

use super::bet::BetSide;
use super::ids::{MarketId, SelectionId};

/// Market lifecycle status as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Inactive,
    Open,
    Suspended,
    Closed,
    #[serde(other)]
    Unknown,
}

/// Runner status within a market.
///
/// `Winner`/`Loser`/`Removed` only appear once the market has settled
/// (or, for `Removed`, once a runner is withdrawn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerStatus {
    Active,
    Winner,
    Loser,
    Placed,
    RemovedVacant,
    Removed,
    Hidden,
    #[serde(other)]
    Unknown,
}

impl RunnerStatus {
    /// True for the statuses that mark a settled race outcome.
    pub fn is_settled(self) -> bool {
        matches!(self, RunnerStatus::Winner | RunnerStatus::Loser)
    }
}

/// One rung of a price ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSize {
    pub price: f64,
    pub size: f64,
}

/// A competitor within a market at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSnapshot {
    pub selection_id: SelectionId,
    pub runner_name: String,
    pub handicap: f64,
    pub status: RunnerStatus,
    /// Best price available to lay at; `None` when there is no liquidity.
    pub best_available_to_lay: Option<f64>,
    /// Best price available to back at; `None` when there is no liquidity.
    pub best_available_to_back: Option<f64>,
    pub lay_depth: Vec<PriceSize>,
    pub back_depth: Vec<PriceSize>,
    pub last_price_traded: Option<f64>,
    pub total_matched: f64,
}

impl RunnerSnapshot {
    /// Best available price for placing a bet on the given side.
    pub fn best_price(&self, side: BetSide) -> Option<f64> {
        match side {
            BetSide::Lay => self.best_available_to_lay,
            BetSide::Back => self.best_available_to_back,
        }
    }
}

/// Immutable view of one market at one recorded instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_id: MarketId,
    pub market_name: String,
    pub venue: String,
    pub market_start_time: String,
    pub event_name: String,
    pub event_country: String,
    pub status: MarketStatus,
    pub inplay: bool,
    pub recorded_at: String,
    pub number_of_winners: u32,
    pub total_matched: f64,
    pub runners: Vec<RunnerSnapshot>,
}

impl MarketSnapshot {
    /// Open for betting and not yet in-play.
    pub fn is_pre_race(&self) -> bool {
        self.status == MarketStatus::Open && !self.inplay
    }

    /// At least one runner carries a WINNER or LOSER status.
    pub fn has_settled_runners(&self) -> bool {
        self.runners.iter().any(|r| r.status.is_settled())
    }
}
