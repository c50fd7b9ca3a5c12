//! CLI interface for smart-loss
//!
//! Provides subcommands for:
//! - `run`: Scheduled evaluation cycles over file market data with paper execution
//! - `evaluate`: One-shot recommendation for a position
//! - `size`: Position size and admission for a candidate entry
//! - `config`: Show derived configuration values

mod evaluate;
mod run;
mod size;

pub use evaluate::EvaluateArgs;
pub use run::RunArgs;
pub use size::SizeArgs;

use crate::config::{Config, ExecutionMode};
use crate::engine::{EngineSettings, SmartLossManager};
use crate::execution::{ExecutionEngine, PaperEngine};
use crate::history::MetricHistory;
use crate::market::JsonFileMarketData;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "smart-loss")]
#[command(about = "Hold/sell decision engine and risk budget for crypto positions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run evaluation cycles with paper execution
    Run(RunArgs),
    /// Evaluate a single position
    Evaluate(EvaluateArgs),
    /// Size and admit a candidate entry
    Size(SizeArgs),
    /// Show configuration and derived risk values
    Config,
}

/// Decision engine over JSON candle files in `data_dir`
pub(crate) fn build_engine(config: &Config, data_dir: Option<&Path>) -> Arc<SmartLossManager> {
    let dir: PathBuf = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.market.data_dir.clone());
    Arc::new(SmartLossManager::new(
        Arc::new(JsonFileMarketData::new(dir)),
        Arc::new(MetricHistory::in_memory(config.history.clone())),
        Arc::new(config.portfolio.clone()),
        EngineSettings::from_config(config),
    ))
}

pub(crate) fn build_executor(config: &Config) -> anyhow::Result<Arc<dyn ExecutionEngine>> {
    match config.execution.mode {
        ExecutionMode::Paper => Ok(Arc::new(PaperEngine::new(config.execution.fee_rate))),
        ExecutionMode::Live => anyhow::bail!("Live execution is not available; set execution.mode = \"paper\""),
    }
}

/// Print configuration and the values derived from it
pub fn show_config(config: &Config) {
    let p = &config.portfolio;
    println!("Current configuration:");
    println!("  Capital: {} (reserve {}%)", p.total_capital, p.reserve_percentage);
    println!("  Available capital: {}", p.available_capital());
    println!("  Reserve amount: {}", p.reserve_amount());
    println!(
        "  Max total loss: {} ({}%)",
        p.max_total_loss_amount(),
        p.max_loss_percentage
    );
    println!(
        "  Position size: {}..{} (calculated max {})",
        p.min_position_size,
        p.max_position_size,
        p.max_position_size_calculated()
    );
    println!(
        "  Limits: {} symbols, {} concurrent orders",
        p.max_active_symbols, p.max_concurrent_orders
    );
    println!(
        "  Exits: stop loss {}%, take profit {}%",
        p.stop_loss_percentage, p.take_profit_percentage
    );
    println!(
        "  Holding period: {} days + {}h grace (accept loss: {}, threshold {}%)",
        p.period_days, p.grace_period_hours, p.accept_loss_after_period, p.accept_loss_threshold
    );
    println!("  Sizing: {}", p.sizing_strategy.as_str());
    println!(
        "  Market: {:?} on {} / {}",
        config.market.symbols, config.market.candle_interval, config.market.confirmation_interval
    );
    println!("  Execution: {:?}", config.execution.mode);
}
