//! Report export — JSON report and CSV bet tape.
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use laybench_core::domain::BetOutcome;
use laybench_core::pnl::round2;
use laybench_core::strategy::is_filename_safe_id;

use crate::simulator::{SimulationReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &SimulationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SimulationReport to JSON")
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<SimulationReport> {
    let report: SimulationReport =
        serde_json::from_str(json).context("failed to deserialize SimulationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export settled bets as CSV, one row per outcome.
///
/// Columns: market_id, selection_id, runner_name, bet_type, price, stake,
/// liability, rule_id, rule_name, runner_result, profit
pub fn export_outcomes_csv(outcomes: &[BetOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "market_id",
        "selection_id",
        "runner_name",
        "bet_type",
        "price",
        "stake",
        "liability",
        "rule_id",
        "rule_name",
        "runner_result",
        "profit",
    ])?;

    for o in outcomes {
        let i = &o.instruction;
        wtr.write_record([
            i.market_id.as_str(),
            &i.selection_id.to_string(),
            &i.runner_name,
            i.bet_type.as_str(),
            &format!("{:.2}", i.price),
            &format!("{:.2}", i.stake),
            &format!("{:.2}", round2(i.liability())),
            &i.rule_id,
            &i.rule_name,
            o.runner_result.as_str(),
            &format!("{:.2}", round2(o.profit)),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Report bundle ──────────────────────────────────────────────────

/// Save a report under `output_dir/{date}_{strategy_id}_{timestamp}/` as
/// `report.json` and `bets.csv`. Returns the created directory.
///
/// The strategy id becomes part of a path, so it must be filename-safe.
pub fn save_report(report: &SimulationReport, output_dir: &Path) -> Result<PathBuf> {
    if !is_filename_safe_id(&report.strategy_id) {
        bail!(
            "strategy id '{}' cannot be used in a report directory name \
             (letters, digits, '-' and '_' only)",
            report.strategy_id
        );
    }
    let dirname = format!(
        "{}_{}_{}",
        report.date,
        report.strategy_id,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create report dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)
        .with_context(|| format!("failed to write {}", run_dir.join("report.json").display()))?;

    let bets_csv = export_outcomes_csv(&report.bet_outcomes)?;
    std::fs::write(run_dir.join("bets.csv"), &bets_csv)
        .with_context(|| format!("failed to write {}", run_dir.join("bets.csv").display()))?;

    Ok(run_dir)
}

/// Load a report from a directory written by [`save_report`].
pub fn load_report(dir: &Path) -> Result<SimulationReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
