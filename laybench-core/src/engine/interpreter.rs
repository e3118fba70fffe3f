//! Rule interpreter — evaluates a strategy document against one market snapshot.
//!
//! Evaluation order:
//! 1. Favourite / second-favourite display info (always recorded)
//! 2. Market filter (a rejection skips the market, no rules run)
//! 3. Rules by ascending priority; all conditions must hold
//! 4. Matched rule → one instruction per priced target runner
//! 5. `stop_on_match` ends evaluation after the first matching rule

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{BetInstruction, MarketId, MarketSnapshot, SelectionId};
use crate::pnl::round2;
use crate::strategy::{Rule, Strategy};

use super::fields::FieldResolver;
use super::filter::check_market;
use super::ranking::{ActiveRanking, RankedRunner};

/// Skip reason recorded when evaluation produced no instruction.
pub const NO_RULES_MATCHED: &str = "No rules matched";

/// Display block for a ranked runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerInfo {
    pub name: String,
    pub odds: f64,
    pub selection_id: SelectionId,
}

impl From<RankedRunner<'_>> for RunnerInfo {
    fn from(r: RankedRunner<'_>) -> Self {
        Self {
            name: r.runner.runner_name.clone(),
            odds: r.lay_price,
            selection_id: r.runner.selection_id,
        }
    }
}

/// Outcome of evaluating one strategy against one market.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvaluationResult {
    pub market_id: MarketId,
    pub market_name: String,
    pub venue: String,
    pub market_start_time: String,
    pub instructions: Vec<BetInstruction>,
    pub matched_rule_id: Option<String>,
    pub matched_rule_name: Option<String>,
    pub favourite: Option<RunnerInfo>,
    pub second_favourite: Option<RunnerInfo>,
    pub skipped: bool,
    pub skip_reason: String,
    /// Targets a matched rule resolved to a runner with no price on the
    /// requested side. Those bets are dropped.
    #[serde(default)]
    pub unpriced_targets: usize,
}

impl EvaluationResult {
    fn for_market(market: &MarketSnapshot) -> Self {
        Self {
            market_id: market.market_id.clone(),
            market_name: market.market_name.clone(),
            venue: market.venue.clone(),
            market_start_time: market.market_start_time.clone(),
            instructions: Vec::new(),
            matched_rule_id: None,
            matched_rule_name: None,
            favourite: None,
            second_favourite: None,
            skipped: false,
            skip_reason: String::new(),
            unpriced_targets: 0,
        }
    }

    fn skip(&mut self, reason: impl Into<String>) {
        self.skipped = true;
        self.skip_reason = reason.into();
    }

    /// Has at least one instruction and was not skipped.
    pub fn has_bets(&self) -> bool {
        !self.skipped && !self.instructions.is_empty()
    }

    pub fn total_stake(&self) -> f64 {
        self.instructions.iter().map(|i| i.stake).sum()
    }

    pub fn total_liability(&self) -> f64 {
        self.instructions.iter().map(|i| i.liability()).sum()
    }
}

impl Serialize for EvaluationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("EvaluationResult", 14)?;
        s.serialize_field("market_id", &self.market_id)?;
        s.serialize_field("market_name", &self.market_name)?;
        s.serialize_field("venue", &self.venue)?;
        s.serialize_field("market_start_time", &self.market_start_time)?;
        s.serialize_field("instructions", &self.instructions)?;
        s.serialize_field("matched_rule_id", &self.matched_rule_id)?;
        s.serialize_field("matched_rule_name", &self.matched_rule_name)?;
        s.serialize_field("favourite", &self.favourite)?;
        s.serialize_field("second_favourite", &self.second_favourite)?;
        s.serialize_field("skipped", &self.skipped)?;
        s.serialize_field("skip_reason", &self.skip_reason)?;
        s.serialize_field("unpriced_targets", &self.unpriced_targets)?;
        s.serialize_field("total_stake", &round2(self.total_stake()))?;
        s.serialize_field("total_liability", &round2(self.total_liability()))?;
        s.end()
    }
}

/// Evaluate `strategy` against a single market snapshot.
pub fn evaluate_strategy(strategy: &Strategy, market: &MarketSnapshot) -> EvaluationResult {
    let mut result = EvaluationResult::for_market(market);
    let ranking = ActiveRanking::of(market);

    result.favourite = ranking.favourite().map(RunnerInfo::from);
    result.second_favourite = ranking.second_favourite().map(RunnerInfo::from);

    if let Some(filter) = &strategy.market_filters {
        if let Err(rejection) = check_market(filter, market, &ranking) {
            result.skip(rejection.to_string());
            return result;
        }
    }

    let resolver = FieldResolver::new(market, &ranking);
    for rule in strategy.rules_by_priority() {
        if !rule.conditions.iter().all(|c| resolver.holds(c)) {
            continue;
        }

        apply_rule(rule, market, &ranking, &mut result);
        result.matched_rule_id = Some(rule.id.clone());
        result.matched_rule_name = Some(rule.name.clone());

        if rule.stop_on_match {
            break;
        }
    }

    if result.instructions.is_empty() {
        result.skip(NO_RULES_MATCHED);
    }
    result
}

/// Materialize the instructions for a matched rule.
fn apply_rule(
    rule: &Rule,
    market: &MarketSnapshot,
    ranking: &ActiveRanking<'_>,
    result: &mut EvaluationResult,
) {
    for action in &rule.actions {
        // A missing rank (e.g. third favourite in a two-runner race) is not an error.
        let Some(target) = ranking.get(action.target.rank()) else {
            continue;
        };
        let Some(price) = target.runner.best_price(action.bet_type) else {
            result.unpriced_targets += 1;
            continue;
        };
        result.instructions.push(BetInstruction {
            market_id: market.market_id.clone(),
            selection_id: target.runner.selection_id,
            runner_name: target.runner.runner_name.clone(),
            bet_type: action.bet_type,
            price,
            stake: action.stake,
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
        });
    }
}
