//! Profit and loss — per-bet resolution and batch aggregation.
//!
//! Per-bet values are kept unrounded; rounding to pence happens only when a
//! figure is aggregated or written out.

use serde::{Deserialize, Serialize};

use crate::domain::{BetInstruction, BetOutcome, BetResult, BetSide};

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Signed profit of one instruction given its selection's result.
///
/// | side | WINNER | LOSER | REMOVED / UNKNOWN |
/// |------|--------|-------|-------------------|
/// | LAY  | −liability | +stake | 0 |
/// | BACK | +stake × (price − 1), 2 dp | −stake | 0 |
pub fn resolve_pnl(instruction: &BetInstruction, result: BetResult) -> f64 {
    match (instruction.bet_type, result) {
        (BetSide::Lay, BetResult::Loser) => instruction.stake,
        (BetSide::Lay, BetResult::Winner) => -instruction.liability(),
        (BetSide::Back, BetResult::Winner) => round2(instruction.stake * (instruction.price - 1.0)),
        (BetSide::Back, BetResult::Loser) => -instruction.stake,
        (_, BetResult::Removed) | (_, BetResult::Unknown) => 0.0,
    }
}

/// Pair an instruction with its result and profit.
pub fn settle(instruction: BetInstruction, result: BetResult) -> BetOutcome {
    let profit = resolve_pnl(&instruction, result);
    BetOutcome {
        instruction,
        runner_result: result,
        profit,
    }
}

/// Summary statistics over a batch of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlSummary {
    pub total_pnl: f64,
    pub win_count: usize,
    pub loss_count: usize,
    pub void_count: usize,
    pub total_stake: f64,
    pub total_liability: f64,
    pub roi_percent: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
}

impl PnlSummary {
    /// Aggregate outcomes. A win is profit > 0, a loss profit < 0, anything
    /// else is void. ROI is relative to total liability (0 when there is none).
    pub fn aggregate(outcomes: &[BetOutcome]) -> Self {
        let mut total_pnl = 0.0;
        let mut total_stake = 0.0;
        let mut total_liability = 0.0;
        let mut win_sum = 0.0;
        let mut loss_sum = 0.0;
        let mut win_count = 0;
        let mut loss_count = 0;
        let mut void_count = 0;

        for o in outcomes {
            total_pnl += o.profit;
            total_stake += o.instruction.stake;
            total_liability += o.instruction.liability();
            if o.profit > 0.0 {
                win_count += 1;
                win_sum += o.profit;
            } else if o.profit < 0.0 {
                loss_count += 1;
                loss_sum += o.profit;
            } else {
                void_count += 1;
            }
        }

        let roi_percent = if total_liability > 0.0 {
            total_pnl / total_liability * 100.0
        } else {
            0.0
        };

        Self {
            total_pnl: round2(total_pnl),
            win_count,
            loss_count,
            void_count,
            total_stake: round2(total_stake),
            total_liability: round2(total_liability),
            roi_percent: round2(roi_percent),
            avg_win: mean_or_zero(win_sum, win_count),
            avg_loss: mean_or_zero(loss_sum, loss_count),
        }
    }

    pub fn bet_count(&self) -> usize {
        self.win_count + self.loss_count + self.void_count
    }
}

fn mean_or_zero(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}
