//! Domain types for Laybench

pub mod bet;
pub mod ids;
pub mod market;

pub use bet::{BetInstruction, BetOutcome, BetResult, BetSide};
pub use ids::{MarketId, SelectionId};
pub use market::{MarketSnapshot, MarketStatus, PriceSize, RunnerSnapshot, RunnerStatus};
