//! Laybench CLI — inspect recorded race days and simulate strategies on them.
//!
//! Commands:
//! - `dates` — list dates with recorded snapshots
//! - `markets <date>` — main-race markets on the card, grouped by venue
//! - `simulate <date>` — run a strategy over a date and settle its bets
//! - `strategy default|list|show|save|validate` — manage strategy documents

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use laybench_core::domain::MarketId;
use laybench_core::strategy::{default_strategy, DEFAULT_STRATEGY_ID};
use laybench_core::Strategy;
use laybench_runner::{
    export_json, list_markets, parse_date, save_report, DateListing, LocalSnapshotStore,
    RunnerConfig, SimulationReport, SimulationRequest, Simulator, SnapshotSource, StrategyStore,
};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "laybench",
    about = "Laybench CLI — replay recorded exchange markets against betting strategies"
)]
struct Cli {
    /// Path to a TOML runner config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot directory. Overrides config and LOCAL_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Saved strategy directory. Overrides config and STRATEGIES_DIR.
    #[arg(long, global = true)]
    strategies_dir: Option<PathBuf>,

    /// Output directory for saved reports.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log level filter (e.g. info, debug). RUST_LOG still wins.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: pretty or json.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List dates with recorded snapshots, newest first.
    Dates,
    /// List single-winner main-race markets for a date.
    Markets {
        /// Date (YYYY-MM-DD).
        date: String,

        /// Print the listing as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Simulate a strategy over a recorded date.
    Simulate {
        /// Date (YYYY-MM-DD).
        date: String,

        /// Saved strategy id. Defaults to the built-in strategy.
        #[arg(long)]
        strategy: Option<String>,

        /// Strategy JSON file (instead of a saved id).
        #[arg(long)]
        strategy_file: Option<PathBuf>,

        /// Restrict to these market ids (repeatable).
        #[arg(long = "market")]
        markets: Vec<String>,

        /// Evaluate markets on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Save report.json and bets.csv under the output directory.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Strategy document commands.
    Strategy {
        #[command(subcommand)]
        action: StrategyAction,
    },
}

#[derive(Subcommand)]
enum StrategyAction {
    /// Print the built-in default strategy as JSON.
    Default,
    /// List the default and all saved strategies.
    List,
    /// Print a strategy as JSON.
    Show {
        /// Strategy id.
        id: String,
    },
    /// Validate a strategy file and save it under its id.
    Save {
        /// Strategy JSON file.
        file: PathBuf,
    },
    /// Validate a strategy file without saving it.
    Validate {
        /// Strategy JSON file.
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    logging::init(&config.logging);
    debug!(
        data_dir = %config.data_dir.display(),
        strategies_dir = %config.strategies_dir.display(),
        parallel = config.parallel,
        "config resolved"
    );

    match cli.command {
        Commands::Dates => run_dates(&config),
        Commands::Markets { date, json } => run_markets(&config, &date, json),
        Commands::Simulate {
            date,
            strategy,
            strategy_file,
            markets,
            sequential,
            save,
            json,
        } => run_simulate(
            &config,
            &date,
            strategy,
            strategy_file,
            markets,
            sequential,
            save,
            json,
        ),
        Commands::Strategy { action } => {
            let store = StrategyStore::new(&config.strategies_dir);
            match action {
                StrategyAction::Default => print_strategy(&default_strategy()),
                StrategyAction::List => run_strategy_list(&store),
                StrategyAction::Show { id } => {
                    let strategy = store
                        .get(&id)
                        .with_context(|| format!("failed to load strategy '{id}'"))?;
                    print_strategy(&strategy)
                }
                StrategyAction::Save { file } => run_strategy_save(&store, &file),
                StrategyAction::Validate { file } => run_strategy_validate(&file),
            }
        }
    }
}

/// Config file (or defaults), then environment, then CLI flags.
fn resolve_config(cli: &Cli) -> Result<RunnerConfig> {
    let mut config = RunnerConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.strategies_dir {
        config.strategies_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.parse()?;
    }
    Ok(config)
}

fn run_dates(config: &RunnerConfig) -> Result<()> {
    let store = LocalSnapshotStore::new(&config.data_dir);
    let mut dates = store
        .list_available_dates()
        .with_context(|| format!("failed to scan {}", config.data_dir.display()))?;
    dates.reverse();

    if dates.is_empty() {
        println!("No recorded dates in {}", config.data_dir.display());
        return Ok(());
    }
    for date in &dates {
        println!("{date}");
    }
    Ok(())
}

fn run_markets(config: &RunnerConfig, date: &str, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let store = LocalSnapshotStore::new(&config.data_dir);
    let listing = list_markets(&store, date)
        .with_context(|| format!("failed to list markets for {date}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print_listing(&listing);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    config: &RunnerConfig,
    date: &str,
    strategy_id: Option<String>,
    strategy_file: Option<PathBuf>,
    markets: Vec<String>,
    sequential: bool,
    save: bool,
    json: bool,
) -> Result<()> {
    if strategy_id.is_some() && strategy_file.is_some() {
        bail!("--strategy and --strategy-file are mutually exclusive");
    }
    let date = parse_date(date)?;

    let strategy = match strategy_file {
        Some(path) => read_strategy_file(&path)?,
        None => {
            let id = strategy_id.as_deref().unwrap_or(DEFAULT_STRATEGY_ID);
            StrategyStore::new(&config.strategies_dir)
                .get(id)
                .with_context(|| format!("failed to load strategy '{id}'"))?
        }
    };

    let mut request = SimulationRequest::new(date, strategy);
    if !markets.is_empty() {
        request = request.with_market_ids(markets.into_iter().map(MarketId::new).collect());
    }

    let store = LocalSnapshotStore::new(&config.data_dir);
    let report = Simulator::new(&store)
        .with_parallelism(config.parallel && !sequential)
        .run(&request)
        .with_context(|| format!("simulation failed for {date}"))?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_summary(&report);
    }

    if save {
        let run_dir = save_report(&report, &config.output_dir)?;
        eprintln!("Report saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_strategy_list(store: &StrategyStore) -> Result<()> {
    let strategies = store
        .list()
        .with_context(|| format!("failed to list {}", store.dir().display()))?;

    println!("{:<24} {:<8} {}", "Id", "Default", "Name");
    println!("{}", "-".repeat(72));
    for s in &strategies {
        let marker = if s.is_default { "yes" } else { "" };
        println!("{:<24} {:<8} {}", s.id, marker, s.name);
    }
    Ok(())
}

fn run_strategy_save(store: &StrategyStore, file: &Path) -> Result<()> {
    let strategy = read_strategy_file(file)?;
    let path = store
        .save(&strategy)
        .with_context(|| format!("failed to save strategy '{}'", strategy.id))?;
    println!("Saved {} to {}", strategy.id, path.display());
    Ok(())
}

fn run_strategy_validate(file: &Path) -> Result<()> {
    let strategy = read_strategy_file(file)?;
    println!(
        "OK: {} ({} rules, hash {})",
        strategy.id,
        strategy.rules.len(),
        strategy.content_hash()
    );
    Ok(())
}

fn read_strategy_file(path: &Path) -> Result<Strategy> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Strategy::from_json(&json).with_context(|| format!("invalid strategy in {}", path.display()))
}

fn print_strategy(strategy: &Strategy) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(strategy)?);
    Ok(())
}

// ── Output ───────────────────────────────────────────────────────────

fn print_listing(listing: &DateListing) {
    println!();
    println!(
        "=== {} — {} markets, {} captures ===",
        listing.date, listing.total_markets, listing.snapshot_count
    );
    for venue in &listing.venues {
        println!();
        println!("{}", venue.venue);
        for m in &venue.markets {
            let fav = m
                .runners
                .iter()
                .filter_map(|r| r.best_lay_odds)
                .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.min(p))));
            let fav = fav.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
            println!(
                "  {:<14} {:<25} {:<24} {:>2} runners  fav {:>6}",
                m.market_id.as_str(),
                m.market_start_time,
                m.market_name,
                m.runner_count,
                fav
            );
        }
    }
    println!();
}

fn print_summary(report: &SimulationReport) {
    let s = &report.summary;
    println!();
    println!("=== Simulation Result ===");
    println!("Date:           {}", report.date);
    println!("Strategy:       {} ({})", report.strategy_name, report.strategy_id);
    println!("Markets:        {}", report.markets_evaluated);
    println!("With bets:      {}", report.markets_with_bets);
    println!("Bets:           {}", report.bets_placed);
    println!();
    println!("--- P&L ---");
    println!("Total P&L:      {:.2}", s.total_pnl);
    println!("Won/Lost/Void:  {}/{}/{}", s.win_count, s.loss_count, s.void_count);
    println!("Total Stake:    {:.2}", s.total_stake);
    println!("Liability:      {:.2}", s.total_liability);
    println!("ROI:            {:.2}%", s.roi_percent);
    println!("Avg Win:        {:.2}", s.avg_win);
    println!("Avg Loss:       {:.2}", s.avg_loss);

    if !report.bet_outcomes.is_empty() {
        println!();
        println!(
            "{:<14} {:<24} {:<5} {:>6} {:>6} {:<8} {:<8} {:>8}",
            "Market", "Runner", "Side", "Price", "Stake", "Rule", "Result", "P&L"
        );
        println!("{}", "-".repeat(86));
        for o in &report.bet_outcomes {
            let i = &o.instruction;
            println!(
                "{:<14} {:<24} {:<5} {:>6.2} {:>6.2} {:<8} {:<8} {:>8.2}",
                i.market_id.as_str(),
                i.runner_name,
                i.bet_type.as_str(),
                i.price,
                i.stake,
                i.rule_id,
                o.runner_result.as_str(),
                o.profit
            );
        }
    }

    let unsettled = report
        .bet_outcomes
        .iter()
        .filter(|o| o.runner_result == laybench_core::domain::BetResult::Unknown)
        .count();
    if unsettled > 0 {
        println!();
        println!("WARNING: {unsettled} bet(s) had no settlement snapshot");
    }
    println!();
}
