//! Strategy evaluation engine.
//!
//! Pure functions of a strategy document and one market snapshot:
//! ranking → field resolution → market filter → rule interpreter.

pub mod fields;
pub mod filter;
pub mod interpreter;
pub mod ranking;

pub use fields::{resolve_field, FieldResolver};
pub use filter::{check_market, FilterRejection};
pub use interpreter::{evaluate_strategy, EvaluationResult, RunnerInfo, NO_RULES_MATCHED};
pub use ranking::{ActiveRanking, RankedRunner};
