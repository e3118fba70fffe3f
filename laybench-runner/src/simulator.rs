//! Simulation orchestrator — one strategy against one recorded date.
//!
//! Pipeline:
//! 1. List the date's snapshot pairs and load them in time order
//! 2. Build per-market timelines
//! 3. Keep single-winner main-race markets (optionally allow-listed)
//! 4. Per market: pre-race snapshot → evaluate → settle → P&L
//! 5. Aggregate into a [`SimulationReport`]
//!
//! Step 4 runs on the rayon pool when parallelism is enabled. Results are
//! collected in timeline order, so a parallel run produces the same report as
//! a sequential one.

use std::collections::HashSet;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use laybench_core::domain::{BetOutcome, MarketId};
use laybench_core::pnl::settle;
use laybench_core::{
    evaluate_strategy, EvaluationResult, MarketTimeline, PnlSummary, RunnerResults, Strategy,
    StrategyError, TimelineBuilder,
};

use crate::records::is_main_race;
use crate::store::{SnapshotSource, StoreError};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
    #[error("snapshot store: {0}")]
    Store(#[from] StoreError),
}

/// What to simulate.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub date: NaiveDate,
    pub strategy: Strategy,
    /// Restrict to these markets. `None` or an empty list means all.
    pub market_ids: Option<Vec<MarketId>>,
}

impl SimulationRequest {
    pub fn new(date: NaiveDate, strategy: Strategy) -> Self {
        Self {
            date,
            strategy,
            market_ids: None,
        }
    }

    pub fn with_market_ids(mut self, ids: Vec<MarketId>) -> Self {
        self.market_ids = Some(ids);
        self
    }
}

/// Complete result of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub date: NaiveDate,
    pub strategy_id: String,
    pub strategy_name: String,
    /// BLAKE3 of the strategy's canonical JSON.
    pub strategy_hash: String,
    pub markets_evaluated: usize,
    pub markets_with_bets: usize,
    pub bets_placed: usize,
    pub bet_outcomes: Vec<BetOutcome>,
    pub evaluations: Vec<EvaluationResult>,
    pub summary: PnlSummary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SimulationReport {
    fn empty(request: &SimulationRequest) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            date: request.date,
            strategy_id: request.strategy.id.clone(),
            strategy_name: request.strategy.name.clone(),
            strategy_hash: request.strategy.content_hash(),
            markets_evaluated: 0,
            markets_with_bets: 0,
            bets_placed: 0,
            bet_outcomes: Vec::new(),
            evaluations: Vec::new(),
            summary: PnlSummary::default(),
        }
    }
}

/// Evaluation and settled outcomes for one market.
#[derive(Debug)]
struct MarketRun {
    evaluation: EvaluationResult,
    outcomes: Vec<BetOutcome>,
}

/// Runs simulations against a snapshot source.
pub struct Simulator<'a, S: SnapshotSource + ?Sized> {
    source: &'a S,
    parallel: bool,
}

impl<'a, S: SnapshotSource + ?Sized> Simulator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            parallel: true,
        }
    }

    /// Enables or disables parallel market evaluation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationReport, SimulationError> {
        request.strategy.validate()?;

        let pairs = self.source.list_snapshot_pairs(request.date)?;
        if pairs.is_empty() {
            info!(date = %request.date, "no snapshots recorded for date");
            return Ok(SimulationReport::empty(request));
        }

        let mut builder = TimelineBuilder::new();
        for pair in &pairs {
            builder.extend(pair.timestamp, self.source.load_pair(pair)?);
        }
        let total_markets = builder.market_count();

        let allow: Option<HashSet<&MarketId>> = request
            .market_ids
            .as_ref()
            .filter(|ids| !ids.is_empty())
            .map(|ids| ids.iter().collect());

        let timelines: Vec<MarketTimeline> = builder
            .build()
            .into_iter()
            .filter(|t| t.is_single_winner_main_race(is_main_race))
            .filter(|t| allow.as_ref().map_or(true, |a| a.contains(&t.market_id)))
            .collect();

        debug!(
            pairs = pairs.len(),
            total_markets,
            selected = timelines.len(),
            "timelines built"
        );

        let strategy = &request.strategy;
        let runs: Vec<Option<MarketRun>> = if self.parallel {
            timelines
                .par_iter()
                .map(|t| simulate_market(strategy, t))
                .collect()
        } else {
            timelines.iter().map(|t| simulate_market(strategy, t)).collect()
        };

        let mut report = SimulationReport::empty(request);
        for run in runs.into_iter().flatten() {
            if run.evaluation.has_bets() {
                report.markets_with_bets += 1;
            }
            report.evaluations.push(run.evaluation);
            report.bet_outcomes.extend(run.outcomes);
        }
        report.markets_evaluated = report.evaluations.len();
        report.bets_placed = report.bet_outcomes.len();
        report.summary = PnlSummary::aggregate(&report.bet_outcomes);

        info!(
            date = %report.date,
            strategy = %report.strategy_name,
            markets = report.markets_evaluated,
            with_bets = report.markets_with_bets,
            bets = report.bets_placed,
            pnl = report.summary.total_pnl,
            "simulation complete"
        );
        Ok(report)
    }
}

/// Run a simulation with the default (parallel) settings.
pub fn run_simulation<S: SnapshotSource + ?Sized>(
    source: &S,
    request: &SimulationRequest,
) -> Result<SimulationReport, SimulationError> {
    Simulator::new(source).run(request)
}

/// Evaluate one market and settle its instructions.
///
/// `None` when the market never had a pre-race snapshot.
fn simulate_market(strategy: &Strategy, timeline: &MarketTimeline) -> Option<MarketRun> {
    let pre_race = timeline.pre_race_snapshot()?;
    let evaluation = evaluate_strategy(strategy, pre_race);

    let outcomes = if evaluation.has_bets() {
        let results = RunnerResults::from_settlement(timeline.settlement_snapshot());
        evaluation
            .instructions
            .iter()
            .map(|i| settle(i.clone(), results.result_for(i.selection_id)))
            .collect()
    } else {
        Vec::new()
    };

    Some(MarketRun {
        evaluation,
        outcomes,
    })
}
