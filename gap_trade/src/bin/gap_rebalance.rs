//! Run one month-start and one trading day of the strategy from CSV inputs
//!
//! ```text
//! gap_rebalance --history bars.csv --coarse coarse.csv --fine fine.csv \
//!     [--holdings holdings.csv] [--config strategy.toml]
//! ```
//!
//! Instructions are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use gap_trade::utils::{load_coarse, load_daily_history, load_fine, load_holdings};
use gap_trade::{
    GapStrategy, Holdings, Instruction, LeverageState, RecordingPlatform, StrategyConfig,
    StrategyState, StrategyVariant, Symbol,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute one day of long/short rebalance instructions")]
struct Args {
    /// Strategy configuration (TOML); defaults apply when omitted
    #[arg(long, env = "GAP_TRADE_CONFIG")]
    config: Option<PathBuf>,

    /// Daily bars: symbol,date,open,high,low,close,volume
    #[arg(long)]
    history: PathBuf,

    /// Coarse fundamentals: symbol,dollar_volume,price,has_fundamental_data
    #[arg(long)]
    coarse: PathBuf,

    /// Fine fundamentals: symbol,ev_to_ebitda
    #[arg(long)]
    fine: PathBuf,

    /// Current positions: symbol,quantity
    #[arg(long)]
    holdings: Option<PathBuf>,

    /// Override the configured strategy variant
    #[arg(long, value_parser = parse_variant)]
    variant: Option<StrategyVariant>,
}

fn parse_variant(value: &str) -> std::result::Result<StrategyVariant, String> {
    match value {
        "gap_threshold" => Ok(StrategyVariant::GapThreshold),
        "quantile_rebalance" => Ok(StrategyVariant::QuantileRebalance),
        other => Err(format!(
            "unknown variant '{}', expected gap_threshold or quantile_rebalance",
            other
        )),
    }
}

#[derive(Serialize)]
struct RunOutput {
    variant: StrategyVariant,
    universe: Vec<Symbol>,
    leverage: LeverageState,
    instructions: Vec<Instruction>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StrategyConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StrategyConfig::default(),
    };
    if let Some(variant) = args.variant {
        config.variant = variant;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let history = load_daily_history(&args.history)
        .with_context(|| format!("loading history {}", args.history.display()))?;
    let coarse_path = args.coarse.display();
    let coarse = load_coarse(&args.coarse)
        .with_context(|| format!("loading coarse fundamentals {}", coarse_path))?;
    let fine_path = args.fine.display();
    let fine = load_fine(&args.fine)
        .with_context(|| format!("loading fine fundamentals {}", fine_path))?;
    let holdings = match &args.holdings {
        Some(path) => load_holdings(path)
            .with_context(|| format!("loading holdings {}", path.display()))?,
        None => Holdings::new(),
    };

    info!(
        variant = ?config.variant,
        symbols = history.len(),
        coarse = coarse.len(),
        held = holdings.len(),
        "inputs loaded"
    );

    let strategy = GapStrategy::new(config)?;
    let mut platform = RecordingPlatform::new(history).with_holdings(holdings);
    let mut state = StrategyState::default();

    let (monthly, daily): (Vec<_>, Vec<_>) = strategy
        .registrations()
        .into_iter()
        .partition(|r| r.is_monthly());

    for registration in monthly {
        state = strategy.dispatch(state, registration.action, &mut platform);
    }
    state = strategy.select_universe(state, &coarse, &fine);
    for registration in daily {
        state = strategy.dispatch(state, registration.action, &mut platform);
    }

    let output = RunOutput {
        variant: strategy.variant(),
        universe: state
            .universe
            .as_ref()
            .map(|u| u.symbols().to_vec())
            .unwrap_or_default(),
        leverage: state.leverage,
        instructions: platform.take_instructions(),
    };

    info!(instructions = output.instructions.len(), "run complete");
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
