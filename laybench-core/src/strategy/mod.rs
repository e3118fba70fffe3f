//! Strategy documents: schema, validation and the default strategy.

pub mod defaults;
pub mod schema;

pub use defaults::{default_strategy, DEFAULT_STRATEGY_ID, DEFAULT_STRATEGY_JSON};
pub use schema::{
    is_filename_safe_id, BetAction, ComparisonOperator, Condition, FieldRef, MarketFilter, Rule,
    RunnerTarget, Strategy, StrategyError,
};
