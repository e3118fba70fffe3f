//! Laybench Core — market snapshots, strategy documents, rule interpreter, settlement, P&L.
//!
//! This crate contains the pure part of the workbench:
//! - Domain types (market/runner snapshots, bet instructions, outcomes)
//! - Strategy schema with boundary validation and the default strategy
//! - Per-market timelines with pre-race and settlement snapshot selection
//! - Active runner ranking, field resolution and market filtering
//! - The rule interpreter producing bet instructions
//! - Settlement results and profit/loss aggregation
//!
//! Nothing here performs I/O or keeps state between calls.

pub mod domain;
pub mod engine;
pub mod pnl;
pub mod settlement;
pub mod strategy;
pub mod timeline;

pub use engine::{evaluate_strategy, EvaluationResult};
pub use pnl::{resolve_pnl, PnlSummary};
pub use settlement::RunnerResults;
pub use strategy::{default_strategy, Strategy, StrategyError};
pub use timeline::{build_timelines, MarketTimeline, TimelineBuilder};
