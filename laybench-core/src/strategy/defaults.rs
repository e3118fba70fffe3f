//! The baseline strategy shipped with the workbench.
//!
//! Kept as a JSON document so its thresholds and stakes stay data.

use super::schema::Strategy;

/// Id under which the default strategy is always available.
pub const DEFAULT_STRATEGY_ID: &str = "chimera_default";

/// The default strategy document, verbatim.
pub const DEFAULT_STRATEGY_JSON: &str = include_str!("default_strategy.json");

/// Four prioritised lay-the-favourite rules keyed on favourite lay odds
/// and the gap to the second favourite.
pub fn default_strategy() -> Strategy {
    Strategy::from_json(DEFAULT_STRATEGY_JSON).expect("embedded default strategy must be valid")
}
