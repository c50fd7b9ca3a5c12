//! Size command implementation

use crate::config::Config;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct SizeArgs {
    /// Candidate symbol
    #[arg(long)]
    pub symbol: String,

    /// Observed per-bar return volatility
    #[arg(long, default_value = "0.02")]
    pub volatility: f64,

    /// Historical win rate in [0, 1]
    #[arg(long, default_value = "0.55")]
    pub win_rate: f64,

    /// Loss already counted against the budget
    #[arg(long, default_value = "0")]
    pub current_risk: Decimal,

    /// Orders currently working
    #[arg(long, default_value = "0")]
    pub active_orders: usize,
}

impl SizeArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let portfolio = &config.portfolio;
        let size =
            portfolio.calculate_optimal_position_size(&self.symbol, self.volatility, self.win_rate);

        println!("{} ({})", self.symbol, portfolio.sizing_strategy.as_str());
        println!("  Size: {}", size.round_dp(2));
        println!("  Worst-case loss: {}", portfolio.worst_case_loss(size).round_dp(2));
        match portfolio.check_new_order(self.current_risk, size, self.active_orders) {
            Ok(()) => println!("  Admission: accepted"),
            Err(e) => println!("  Admission: refused ({})", e),
        }
        Ok(())
    }
}
