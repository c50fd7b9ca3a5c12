//! Run command implementation

use super::{build_engine, build_executor};
use crate::config::Config;
use crate::engine::analyze_volatility;
use crate::market::{fetch_candles, JsonFileMarketData, MarketDataProvider};
use crate::portfolio::{CycleReport, PortfolioManager};
use crate::risk::Position;
use clap::Args;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON file with positions to manage
    #[arg(long)]
    pub positions: Option<PathBuf>,

    /// Candle directory, overriding market.data_dir
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Stop after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Open entries for configured symbols without a position
    #[arg(long)]
    pub open_entries: bool,

    /// Win rate assumed when sizing entries
    #[arg(long, default_value = "0.55")]
    pub win_rate: f64,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config.market.data_dir.clone());
        let market = JsonFileMarketData::new(&data_dir);
        let engine = build_engine(config, Some(&data_dir));
        let manager = Arc::new(PortfolioManager::new(
            engine,
            build_executor(config)?,
            config.execution.clone(),
        ));

        if let Some(path) = &self.positions {
            let content = tokio::fs::read_to_string(path).await?;
            let positions: Vec<Position> = serde_json::from_str(&content)?;
            for position in positions {
                let symbol = position.symbol.clone();
                if let Err(e) = manager.adopt(position).await {
                    tracing::warn!(symbol = %symbol, error = %e, "Position not adopted");
                }
            }
        }

        let mut interval =
            tokio::time::interval(Duration::from_secs(config.scheduler.cycle_interval_secs));
        let mut completed = 0u64;
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    break;
                }
            }

            let prices = self.latest_prices(config, &market, &manager).await;
            if self.open_entries {
                self.open_new_entries(config, &market, &manager, &prices).await;
            }
            let report = manager.run_cycle(&prices).await;
            print_report(&report);

            completed += 1;
            if self.cycles.is_some_and(|n| completed >= n) {
                break;
            }
        }

        Ok(())
    }

    /// Last close per managed or configured symbol
    async fn latest_prices(
        &self,
        config: &Config,
        market: &JsonFileMarketData,
        manager: &PortfolioManager,
    ) -> HashMap<String, Decimal> {
        let mut symbols: Vec<String> = manager
            .positions()
            .await
            .into_iter()
            .map(|p| p.symbol)
            .collect();
        symbols.extend(config.market.symbols.iter().cloned());
        symbols.sort();
        symbols.dedup();

        let mut prices = HashMap::new();
        for symbol in symbols {
            let candles = fetch_candles(
                market as &dyn MarketDataProvider,
                &symbol,
                config.market.candle_interval,
                1,
                config.market.fetch_timeout(),
            )
            .await;
            match candles {
                Ok(candles) => {
                    if let Some(price) = candles.last().and_then(|c| Decimal::from_f64(c.close)) {
                        prices.insert(symbol, price);
                    }
                }
                Err(e) => tracing::warn!(symbol = %symbol, error = %e, "No price"),
            }
        }
        prices
    }

    async fn open_new_entries(
        &self,
        config: &Config,
        market: &JsonFileMarketData,
        manager: &PortfolioManager,
        prices: &HashMap<String, Decimal>,
    ) {
        for symbol in &config.market.symbols {
            let Some(&price) = prices.get(symbol) else {
                continue;
            };
            let closes: Vec<f64> = match market
                .get_candles(symbol, config.market.candle_interval, config.market.candle_limit)
                .await
            {
                Ok(candles) => candles.iter().map(|c| c.close).collect(),
                Err(_) => continue,
            };
            let volatility = analyze_volatility(&closes, config.market.candle_interval).current;

            match manager.try_open(symbol, price, volatility, self.win_rate).await {
                Ok(position) => println!(
                    "Opened {} qty {} @ {}",
                    position.symbol,
                    position.quantity.round_dp(6),
                    position.entry_price
                ),
                Err(e) => tracing::debug!(symbol = %symbol, error = %e, "Entry not opened"),
            }
        }
    }
}

fn print_report(report: &CycleReport) {
    println!("Cycle: {} evaluated", report.recommendations.len());
    for (symbol, rec) in &report.recommendations {
        println!(
            "  {:<12} {:<16} confidence {:.2} urgency {:?}",
            symbol,
            rec.decision.as_str(),
            rec.confidence,
            rec.urgency()
        );
    }
    for closed in &report.closed {
        println!(
            "  Closed {} @ {} ({}) pnl {}",
            closed.symbol,
            closed.exit_price,
            closed.decision,
            closed.realized_pnl.round_dp(2)
        );
    }
    for (symbol, error) in &report.failures {
        println!("  Failed to sell {}: {}", symbol, error);
    }
    println!(
        "  Risk: {} of {} (remaining {})",
        report.budget.total_risk.round_dp(2),
        report.budget.max_total_loss_amount.round_dp(2),
        report.budget.remaining().round_dp(2)
    );
}
