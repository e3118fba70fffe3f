//! Bet instructions and their settled outcomes.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::ids::{MarketId, SelectionId};
use crate::pnl::round2;

/// Which side of the exchange a bet is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetSide {
    /// Bet that the selection will NOT win.
    #[default]
    Lay,
    /// Bet that the selection WILL win.
    Back,
}

/// Final result of a selection, as far as a bet is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetResult {
    Winner,
    Loser,
    Removed,
    /// No settlement data was observed for the selection.
    Unknown,
}

impl BetSide {
    pub fn as_str(self) -> &'static str {
        match self {
            BetSide::Lay => "LAY",
            BetSide::Back => "BACK",
        }
    }
}

impl BetResult {
    pub fn as_str(self) -> &'static str {
        match self {
            BetResult::Winner => "WINNER",
            BetResult::Loser => "LOSER",
            BetResult::Removed => "REMOVED",
            BetResult::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete bet produced by a matched rule.
///
/// Liability is never stored; it is recomputed from price and stake.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BetInstruction {
    pub market_id: MarketId,
    pub selection_id: SelectionId,
    pub runner_name: String,
    pub bet_type: BetSide,
    pub price: f64,
    pub stake: f64,
    pub rule_id: String,
    pub rule_name: String,
}

impl BetInstruction {
    /// Maximum loss: `stake × (price − 1)` for a lay, the stake for a back.
    pub fn liability(&self) -> f64 {
        match self.bet_type {
            BetSide::Lay => (self.stake * (self.price - 1.0)).max(0.0),
            BetSide::Back => self.stake,
        }
    }
}

impl Serialize for BetInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BetInstruction", 9)?;
        s.serialize_field("market_id", &self.market_id)?;
        s.serialize_field("selection_id", &self.selection_id)?;
        s.serialize_field("runner_name", &self.runner_name)?;
        s.serialize_field("bet_type", &self.bet_type)?;
        s.serialize_field("price", &self.price)?;
        s.serialize_field("stake", &self.stake)?;
        s.serialize_field("liability", &round2(self.liability()))?;
        s.serialize_field("rule_id", &self.rule_id)?;
        s.serialize_field("rule_name", &self.rule_name)?;
        s.end()
    }
}

/// An instruction resolved against its selection's final result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOutcome {
    #[serde(flatten)]
    pub instruction: BetInstruction,
    pub runner_result: BetResult,
    #[serde(serialize_with = "serialize_rounded")]
    pub profit: f64,
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}
