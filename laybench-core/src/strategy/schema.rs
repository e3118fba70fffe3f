//! Strategy document schema.
//!
//! Rules are structured data, not code: every field, operator and target is a
//! closed enum, and a document is validated once at the boundary before any
//! evaluation happens.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::BetSide;

// ─── Error type ──────────────────────────────────────────────────────

/// Structural problems with a strategy document.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid strategy document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("strategy id must not be empty")]
    EmptyId,
    #[error("strategy '{0}' has an empty name")]
    EmptyName(String),
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),
    #[error("rule '{rule_id}': stake must be a positive finite number, got {stake}")]
    InvalidStake { rule_id: String, stake: f64 },
    #[error("rule '{rule_id}': condition on {field} has a non-finite threshold")]
    NonFiniteThreshold { rule_id: String, field: FieldRef },
    #[error("rule '{rule_id}': between bounds are inverted ({low} > {high})")]
    InvertedBetween { rule_id: String, low: f64, high: f64 },
    #[error("market filter: min_runners {min} exceeds max_runners {max}")]
    InvalidRunnerRange { min: usize, max: usize },
}

// ─── Enumerations ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    Between,
}

impl ComparisonOperator {
    /// Compare `actual` against the threshold(s).
    ///
    /// `Between` is inclusive on both ends; without a high bound it collapses
    /// to `value <= actual <= value`.
    pub fn compare(self, actual: f64, value: f64, value_high: Option<f64>) -> bool {
        match self {
            ComparisonOperator::Lt => actual < value,
            ComparisonOperator::Lte => actual <= value,
            ComparisonOperator::Gt => actual > value,
            ComparisonOperator::Gte => actual >= value,
            ComparisonOperator::Eq => actual == value,
            ComparisonOperator::Neq => actual != value,
            ComparisonOperator::Between => {
                let high = value_high.unwrap_or(value);
                value <= actual && actual <= high
            }
        }
    }
}

/// Which ranked runner an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerTarget {
    Favourite,
    SecondFavourite,
    ThirdFavourite,
}

impl RunnerTarget {
    /// Zero-based position in the active runner ranking.
    pub fn rank(self) -> usize {
        match self {
            RunnerTarget::Favourite => 0,
            RunnerTarget::SecondFavourite => 1,
            RunnerTarget::ThirdFavourite => 2,
        }
    }
}

/// Named numeric field a condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    FavLayOdds,
    FavBackOdds,
    SecondFavLayOdds,
    SecondFavBackOdds,
    GapToSecond,
    RunnerCount,
    TotalMatched,
    FavTotalMatched,
}

impl FieldRef {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldRef::FavLayOdds => "fav_lay_odds",
            FieldRef::FavBackOdds => "fav_back_odds",
            FieldRef::SecondFavLayOdds => "second_fav_lay_odds",
            FieldRef::SecondFavBackOdds => "second_fav_back_odds",
            FieldRef::GapToSecond => "gap_to_second",
            FieldRef::RunnerCount => "runner_count",
            FieldRef::TotalMatched => "total_matched",
            FieldRef::FavTotalMatched => "fav_total_matched",
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Document types ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: FieldRef,
    pub operator: ComparisonOperator,
    #[serde(deserialize_with = "threshold")]
    pub value: f64,
    /// Upper bound, only meaningful for `between`.
    #[serde(default)]
    pub value_high: Option<f64>,
}

/// Thresholds may be written as numbers, numeric strings or booleans.
fn threshold<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Flag(bool),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("threshold '{s}' is not a number"))),
        Raw::Flag(b) => Ok(if b { 1.0 } else { 0.0 }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetAction {
    pub target: RunnerTarget,
    #[serde(default)]
    pub bet_type: BetSide,
    pub stake: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub priority: i64,
    pub conditions: Vec<Condition>,
    pub actions: Vec<BetAction>,
    #[serde(default = "default_true")]
    pub stop_on_match: bool,
}

/// Market eligibility predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketFilter {
    /// Allowed country codes; empty means any.
    pub countries: Vec<String>,
    pub min_runners: usize,
    pub max_runners: Option<usize>,
    pub exclude_inplay: bool,
    /// Kept for document compatibility; snapshots carry no market type.
    pub market_types: Vec<String>,
    pub venue_contains: Vec<String>,
    pub venue_excludes: Vec<String>,
}

impl Default for MarketFilter {
    fn default() -> Self {
        Self {
            countries: vec!["GB".into(), "IE".into()],
            min_runners: 2,
            max_runners: None,
            exclude_inplay: true,
            market_types: Vec::new(),
            venue_contains: Vec::new(),
            venue_excludes: Vec::new(),
        }
    }
}

impl MarketFilter {
    /// Effective runner cap. `max_runners: 0` means no cap.
    pub fn runner_cap(&self) -> Option<usize> {
        self.max_runners.filter(|&max| max > 0)
    }
}

/// A named, versioned strategy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub market_filters: Option<MarketFilter>,
}

/// Ids double as file and directory names: ASCII letters, digits, `-` and
/// `_` only, and not empty.
pub fn is_filename_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0".into()
}

impl Strategy {
    /// Parse and validate a JSON strategy document.
    pub fn from_json(json: &str) -> Result<Self, StrategyError> {
        let strategy: Strategy = serde_json::from_str(json)?;
        strategy.validate()?;
        Ok(strategy)
    }

    /// Check the structural invariants the schema alone cannot express.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.id.trim().is_empty() {
            return Err(StrategyError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(StrategyError::EmptyName(self.id.clone()));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(StrategyError::DuplicateRuleId(rule.id.clone()));
            }
            for condition in &rule.conditions {
                let high_ok = condition.value_high.map_or(true, f64::is_finite);
                if !condition.value.is_finite() || !high_ok {
                    return Err(StrategyError::NonFiniteThreshold {
                        rule_id: rule.id.clone(),
                        field: condition.field,
                    });
                }
                if let (ComparisonOperator::Between, Some(high)) =
                    (condition.operator, condition.value_high)
                {
                    if high < condition.value {
                        return Err(StrategyError::InvertedBetween {
                            rule_id: rule.id.clone(),
                            low: condition.value,
                            high,
                        });
                    }
                }
            }
            for action in &rule.actions {
                if !action.stake.is_finite() || action.stake <= 0.0 {
                    return Err(StrategyError::InvalidStake {
                        rule_id: rule.id.clone(),
                        stake: action.stake,
                    });
                }
            }
        }

        if let Some(filter) = &self.market_filters {
            if let Some(max) = filter.runner_cap() {
                if filter.min_runners > max {
                    return Err(StrategyError::InvalidRunnerRange {
                        min: filter.min_runners,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Rules in evaluation order: ascending priority, ties keep document order.
    pub fn rules_by_priority(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// BLAKE3 hash of the canonical JSON form, recorded in reports.
    pub fn content_hash(&self) -> String {
        let json = serde_json::to_string(self).expect("Strategy must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
