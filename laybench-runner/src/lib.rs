//! Laybench Runner — snapshot store, simulation orchestration, export.
//!
//! This crate builds on `laybench-core` to provide:
//! - NDJSON snapshot store with capture pairing and date listing
//! - Book/catalogue join and main-race classification
//! - The simulation orchestrator (sequential or rayon-parallel)
//! - Market listing per date, grouped by venue
//! - A directory-backed strategy store
//! - JSON / CSV report export
//! - TOML runner configuration

pub mod config;
pub mod export;
pub mod listing;
pub mod records;
pub mod simulator;
pub mod store;
pub mod strategy_store;

pub use config::{ConfigError, LogFormat, LoggingConfig, RunnerConfig};
pub use export::{export_json, export_outcomes_csv, import_json, load_report, save_report};
pub use listing::{list_markets, DateListing, MarketListing, VenueListing};
pub use records::{build_snapshot, is_main_race, join_records};
pub use simulator::{
    run_simulation, SimulationError, SimulationReport, SimulationRequest, Simulator,
    SCHEMA_VERSION,
};
pub use store::{parse_date, LocalSnapshotStore, SnapshotPair, SnapshotSource, StoreError};
pub use strategy_store::{StrategyStore, StrategySummary};
