//! Position sizing strategies
//!
//! Every sizer reads the same validated portfolio configuration and a
//! candidate's observed volatility and win rate.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use super::kelly::KellyCalculator;
use crate::config::{PortfolioConfig, SizingStrategy};

/// Inputs observed for a sizing candidate
#[derive(Debug, Clone, Copy)]
pub struct SizingInput {
    /// Per-bar return volatility
    pub volatility: Decimal,
    /// Historical win rate in [0, 1]
    pub win_rate: Decimal,
}

impl SizingInput {
    /// Build from engine-side floats; non-finite values become zero
    pub fn from_f64(volatility: f64, win_rate: f64) -> Self {
        Self {
            volatility: Decimal::from_f64(volatility).unwrap_or_default(),
            win_rate: Decimal::from_f64(win_rate).unwrap_or_default(),
        }
    }
}

/// Trait for position sizing implementations
pub trait PositionSizer: Send + Sync {
    /// Position size in quote currency
    fn calculate(&self, config: &PortfolioConfig, input: &SizingInput) -> Decimal;

    /// Get the sizing mode name
    fn mode_name(&self) -> &'static str;
}

fn base_size(config: &PortfolioConfig) -> Decimal {
    config.available_capital() / Decimal::from(config.max_active_symbols.max(1))
}

/// Available capital split evenly across active symbols
#[derive(Debug, Clone, Default)]
pub struct EqualWeightSizer;

impl PositionSizer for EqualWeightSizer {
    fn calculate(&self, config: &PortfolioConfig, _input: &SizingInput) -> Decimal {
        base_size(config)
    }

    fn mode_name(&self) -> &'static str {
        "equal_weight"
    }
}

/// Inverse-volatility sizing.
///
/// The equal-weight base is scaled by `assumed_average_volatility /
/// max(volatility, volatility_floor)` and capped at the configured maximum.
#[derive(Debug, Clone, Default)]
pub struct RiskParitySizer;

impl PositionSizer for RiskParitySizer {
    fn calculate(&self, config: &PortfolioConfig, input: &SizingInput) -> Decimal {
        let volatility = input.volatility.max(config.volatility_floor);
        let scaled = base_size(config) * config.assumed_average_volatility / volatility;
        scaled.min(config.max_position_size)
    }

    fn mode_name(&self) -> &'static str {
        "risk_parity"
    }
}

/// Kelly-criterion sizing, clamped to the configured size range.
///
/// Below a 50% win rate the minimum size is used outright.
#[derive(Debug, Clone)]
pub struct KellySizer {
    calculator: KellyCalculator,
}

impl KellySizer {
    pub fn from_config(config: &PortfolioConfig) -> Self {
        Self {
            calculator: KellyCalculator::new(config.kelly_average_win, config.kelly_average_loss),
        }
    }
}

impl PositionSizer for KellySizer {
    fn calculate(&self, config: &PortfolioConfig, input: &SizingInput) -> Decimal {
        if input.win_rate <= Decimal::new(5, 1) {
            return config.min_position_size;
        }
        let fraction = self.calculator.fraction(input.win_rate);
        (config.available_capital() * fraction)
            .max(config.min_position_size)
            .min(config.max_position_size)
    }

    fn mode_name(&self) -> &'static str {
        "kelly_criterion"
    }
}

/// Always the minimum position size
#[derive(Debug, Clone, Default)]
pub struct FixedAmountSizer;

impl PositionSizer for FixedAmountSizer {
    fn calculate(&self, config: &PortfolioConfig, _input: &SizingInput) -> Decimal {
        config.min_position_size
    }

    fn mode_name(&self) -> &'static str {
        "fixed_amount"
    }
}

/// Create a position sizer based on configuration
pub fn create_sizer(config: &PortfolioConfig) -> Box<dyn PositionSizer> {
    match config.sizing_strategy {
        SizingStrategy::EqualWeight => Box::new(EqualWeightSizer),
        SizingStrategy::RiskParity => Box::new(RiskParitySizer),
        SizingStrategy::KellyCriterion => Box::new(KellySizer::from_config(config)),
        SizingStrategy::FixedAmount => Box::new(FixedAmountSizer),
    }
}

impl PortfolioConfig {
    /// Size a new position for `symbol` with the configured strategy
    pub fn calculate_optimal_position_size(
        &self,
        symbol: &str,
        volatility: f64,
        win_rate: f64,
    ) -> Decimal {
        let sizer = create_sizer(self);
        let input = SizingInput::from_f64(volatility, win_rate);
        let size = sizer.calculate(self, &input);
        debug!(
            symbol,
            strategy = sizer.mode_name(),
            volatility,
            win_rate,
            %size,
            "Calculated position size"
        );
        size
    }
}
