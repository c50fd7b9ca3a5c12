//! Configuration types for smart-loss

use crate::history::{Metric, Retention};
use crate::market::CandleInterval;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.portfolio.validate()?;
        if self.market.candle_limit == 0 {
            return Err(invalid("market.candle_limit", "must be positive"));
        }
        if self.market.fetch_timeout_ms == 0 {
            return Err(invalid("market.fetch_timeout_ms", "must be positive"));
        }
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity", "must be positive"));
        }
        if self.cache.max_entries == 0 {
            return Err(invalid("cache.max_entries", "must be positive"));
        }
        if self.scheduler.cycle_interval_secs == 0 {
            return Err(invalid("scheduler.cycle_interval_secs", "must be positive"));
        }
        Ok(())
    }
}

/// Position sizing strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizingStrategy {
    /// Available capital split evenly across active symbols
    #[default]
    EqualWeight,
    /// Inverse-volatility sizing
    RiskParity,
    /// Kelly fraction from assumed average win/loss and observed win rate
    KellyCriterion,
    /// Always the minimum position size
    FixedAmount,
}

impl SizingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizingStrategy::EqualWeight => "equal_weight",
            SizingStrategy::RiskParity => "risk_parity",
            SizingStrategy::KellyCriterion => "kelly_criterion",
            SizingStrategy::FixedAmount => "fixed_amount",
        }
    }
}

/// Capital, loss budget and sizing configuration.
///
/// Percentages are expressed in percent (8 = 8%). Instances are immutable
/// once validated; use [`PortfolioConfig::apply`] to derive a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioConfig {
    pub total_capital: Decimal,
    #[serde(default = "default_max_loss_percentage")]
    pub max_loss_percentage: Decimal,
    #[serde(default = "default_reserve_percentage")]
    pub reserve_percentage: Decimal,
    #[serde(default = "default_min_position_size")]
    pub min_position_size: Decimal,
    #[serde(default = "default_max_position_size")]
    pub max_position_size: Decimal,
    #[serde(default = "default_max_active_symbols")]
    pub max_active_symbols: usize,
    #[serde(default = "default_max_concurrent_orders")]
    pub max_concurrent_orders: usize,
    #[serde(default = "default_stop_loss_percentage")]
    pub stop_loss_percentage: Decimal,
    #[serde(default = "default_take_profit_percentage")]
    pub take_profit_percentage: Decimal,

    /// Target holding horizon
    #[serde(default = "default_period_days")]
    pub period_days: u32,
    /// Extra time past the horizon before a loss is accepted regardless of size
    #[serde(default = "default_grace_period_hours")]
    pub grace_period_hours: u32,
    #[serde(default = "default_true")]
    pub accept_loss_after_period: bool,
    /// Loss (percent) past which an overdue position is sold inside the grace period
    #[serde(default = "default_accept_loss_threshold")]
    pub accept_loss_threshold: Decimal,

    #[serde(default = "default_true")]
    pub include_unrealized_in_risk: bool,
    /// Share of unrealized loss counted against the budget (0..=1)
    #[serde(default = "default_unrealized_loss_weight")]
    pub unrealized_loss_weight: Decimal,
    #[serde(default)]
    pub only_realized_losses: bool,

    #[serde(default)]
    pub sizing_strategy: SizingStrategy,
    /// Per-bar volatility a risk-parity base size is calibrated for
    #[serde(default = "default_assumed_average_volatility")]
    pub assumed_average_volatility: Decimal,
    /// Lower bound on volatility in risk-parity sizing
    #[serde(default = "default_volatility_floor")]
    pub volatility_floor: Decimal,
    /// Assumed average winning trade return for Kelly sizing
    #[serde(default = "default_kelly_average_win")]
    pub kelly_average_win: Decimal,
    /// Assumed average losing trade return for Kelly sizing
    #[serde(default = "default_kelly_average_loss")]
    pub kelly_average_loss: Decimal,
}

fn default_true() -> bool {
    true
}
fn default_max_loss_percentage() -> Decimal {
    dec!(10)
}
fn default_reserve_percentage() -> Decimal {
    dec!(20)
}
fn default_min_position_size() -> Decimal {
    dec!(10)
}
fn default_max_position_size() -> Decimal {
    dec!(200)
}
fn default_max_active_symbols() -> usize {
    5
}
fn default_max_concurrent_orders() -> usize {
    3
}
fn default_stop_loss_percentage() -> Decimal {
    dec!(8)
}
fn default_take_profit_percentage() -> Decimal {
    dec!(15)
}
fn default_period_days() -> u32 {
    7
}
fn default_grace_period_hours() -> u32 {
    24
}
fn default_accept_loss_threshold() -> Decimal {
    dec!(5)
}
fn default_unrealized_loss_weight() -> Decimal {
    dec!(0.5)
}
fn default_assumed_average_volatility() -> Decimal {
    dec!(0.02)
}
fn default_volatility_floor() -> Decimal {
    dec!(0.005)
}
fn default_kelly_average_win() -> Decimal {
    dec!(0.10)
}
fn default_kelly_average_loss() -> Decimal {
    dec!(0.08)
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            total_capital: dec!(1000),
            max_loss_percentage: default_max_loss_percentage(),
            reserve_percentage: default_reserve_percentage(),
            min_position_size: default_min_position_size(),
            max_position_size: default_max_position_size(),
            max_active_symbols: default_max_active_symbols(),
            max_concurrent_orders: default_max_concurrent_orders(),
            stop_loss_percentage: default_stop_loss_percentage(),
            take_profit_percentage: default_take_profit_percentage(),
            period_days: default_period_days(),
            grace_period_hours: default_grace_period_hours(),
            accept_loss_after_period: true,
            accept_loss_threshold: default_accept_loss_threshold(),
            include_unrealized_in_risk: true,
            unrealized_loss_weight: default_unrealized_loss_weight(),
            only_realized_losses: false,
            sizing_strategy: SizingStrategy::EqualWeight,
            assumed_average_volatility: default_assumed_average_volatility(),
            volatility_floor: default_volatility_floor(),
            kelly_average_win: default_kelly_average_win(),
            kelly_average_loss: default_kelly_average_loss(),
        }
    }
}

fn check_percentage(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(invalid(field, format!("{value} is outside 0..=100")));
    }
    Ok(())
}

fn check_positive(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO {
        return Err(invalid(field, format!("{value} must be positive")));
    }
    Ok(())
}

impl PortfolioConfig {
    /// Reject inconsistent values at write time
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("total_capital", self.total_capital)?;
        check_percentage("max_loss_percentage", self.max_loss_percentage)?;
        check_percentage("reserve_percentage", self.reserve_percentage)?;
        if self.reserve_percentage >= dec!(100) {
            return Err(invalid("reserve_percentage", "must leave capital available"));
        }
        check_percentage("stop_loss_percentage", self.stop_loss_percentage)?;
        check_positive("take_profit_percentage", self.take_profit_percentage)?;
        check_percentage("accept_loss_threshold", self.accept_loss_threshold)?;
        check_positive("min_position_size", self.min_position_size)?;
        if self.min_position_size > self.max_position_size {
            return Err(invalid(
                "min_position_size",
                format!(
                    "{} exceeds max_position_size {}",
                    self.min_position_size, self.max_position_size
                ),
            ));
        }
        if self.max_active_symbols == 0 {
            return Err(invalid("max_active_symbols", "must be positive"));
        }
        if self.max_concurrent_orders == 0 {
            return Err(invalid("max_concurrent_orders", "must be positive"));
        }
        if self.unrealized_loss_weight < Decimal::ZERO || self.unrealized_loss_weight > Decimal::ONE
        {
            return Err(invalid("unrealized_loss_weight", "must be within 0..=1"));
        }
        check_positive("assumed_average_volatility", self.assumed_average_volatility)?;
        check_positive("volatility_floor", self.volatility_floor)?;
        check_positive("kelly_average_win", self.kelly_average_win)?;
        check_positive("kelly_average_loss", self.kelly_average_loss)?;
        Ok(())
    }

    /// Produce a new validated configuration with `update` applied
    pub fn apply(&self, update: PortfolioUpdate) -> Result<PortfolioConfig, ConfigError> {
        let mut next = self.clone();

        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = update.$field {
                    next.$field = value;
                })*
            };
        }
        merge!(
            total_capital,
            max_loss_percentage,
            reserve_percentage,
            min_position_size,
            max_position_size,
            max_active_symbols,
            max_concurrent_orders,
            stop_loss_percentage,
            take_profit_percentage,
            period_days,
            grace_period_hours,
            accept_loss_after_period,
            accept_loss_threshold,
            include_unrealized_in_risk,
            unrealized_loss_weight,
            only_realized_losses,
            sizing_strategy,
            assumed_average_volatility,
            volatility_floor,
            kelly_average_win,
            kelly_average_loss,
        );

        next.validate()?;
        Ok(next)
    }
}

/// Partial update to a [`PortfolioConfig`]; unset fields are kept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioUpdate {
    pub total_capital: Option<Decimal>,
    pub max_loss_percentage: Option<Decimal>,
    pub reserve_percentage: Option<Decimal>,
    pub min_position_size: Option<Decimal>,
    pub max_position_size: Option<Decimal>,
    pub max_active_symbols: Option<usize>,
    pub max_concurrent_orders: Option<usize>,
    pub stop_loss_percentage: Option<Decimal>,
    pub take_profit_percentage: Option<Decimal>,
    pub period_days: Option<u32>,
    pub grace_period_hours: Option<u32>,
    pub accept_loss_after_period: Option<bool>,
    pub accept_loss_threshold: Option<Decimal>,
    pub include_unrealized_in_risk: Option<bool>,
    pub unrealized_loss_weight: Option<Decimal>,
    pub only_realized_losses: Option<bool>,
    pub sizing_strategy: Option<SizingStrategy>,
    pub assumed_average_volatility: Option<Decimal>,
    pub volatility_floor: Option<Decimal>,
    pub kelly_average_win: Option<Decimal>,
    pub kelly_average_loss: Option<Decimal>,
}

/// Market data collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Symbols the orchestrator considers for entries
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Interval of the primary decision window
    #[serde(default = "default_candle_interval")]
    pub candle_interval: CandleInterval,
    /// Longer timeframe used for flash-crash and trend confirmation
    #[serde(default = "default_confirmation_interval")]
    pub confirmation_interval: CandleInterval,
    #[serde(default = "default_candle_limit")]
    pub candle_limit: usize,
    #[serde(default = "default_confirmation_limit")]
    pub confirmation_limit: usize,
    /// Deadline for a single candle fetch
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Directory of `<SYMBOL>_<interval>.json` candle files for the file provider
    #[serde(default = "default_data_dir")]
    pub data_dir: std::path::PathBuf,
}

fn default_candle_interval() -> CandleInterval {
    CandleInterval::FifteenMinutes
}
fn default_confirmation_interval() -> CandleInterval {
    CandleInterval::OneHour
}
fn default_candle_limit() -> usize {
    100
}
fn default_confirmation_limit() -> usize {
    50
}
fn default_fetch_timeout_ms() -> u64 {
    5_000
}
fn default_data_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("./data")
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            candle_interval: default_candle_interval(),
            confirmation_interval: default_confirmation_interval(),
            candle_limit: default_candle_limit(),
            confirmation_limit: default_confirmation_limit(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            data_dir: default_data_dir(),
        }
    }
}

impl MarketConfig {
    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Historical metric store retention
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum samples kept per symbol and metric
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    #[serde(default = "default_rsi_ttl_hours")]
    pub rsi_ttl_hours: i64,
    #[serde(default = "default_volatility_ttl_days")]
    pub volatility_ttl_days: i64,
    #[serde(default = "default_price_ttl_hours")]
    pub price_ttl_hours: i64,
}

fn default_history_capacity() -> usize {
    100
}
fn default_rsi_ttl_hours() -> i64 {
    24
}
fn default_volatility_ttl_days() -> i64 {
    30
}
fn default_price_ttl_hours() -> i64 {
    2
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            rsi_ttl_hours: default_rsi_ttl_hours(),
            volatility_ttl_days: default_volatility_ttl_days(),
            price_ttl_hours: default_price_ttl_hours(),
        }
    }
}

impl HistoryConfig {
    pub fn retention(&self, metric: Metric) -> Retention {
        let ttl = match metric {
            Metric::Rsi => chrono::Duration::hours(self.rsi_ttl_hours),
            Metric::Volatility => chrono::Duration::days(self.volatility_ttl_days),
            Metric::Price => chrono::Duration::hours(self.price_ttl_hours),
        };
        Retention {
            capacity: self.capacity,
            ttl,
        }
    }
}

/// Trend/volatility cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_cache_max_entries() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

/// Evaluation cadence
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
}

fn default_cycle_interval_secs() -> u64 {
    900
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
        }
    }
}

/// Execution mode: paper trading or live
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Live,
}

/// Order execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// How long a medium-urgency limit order may rest before falling back to market
    #[serde(default = "default_limit_timeout_secs")]
    pub limit_timeout_secs: u64,
    /// Limit price offset from the current price, in percent
    #[serde(default = "default_limit_offset_percentage")]
    pub limit_offset_percentage: Decimal,
}

fn default_fee_rate() -> Decimal {
    dec!(0.001)
}
fn default_limit_timeout_secs() -> u64 {
    30
}
fn default_limit_offset_percentage() -> Decimal {
    dec!(0.1)
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Paper,
            fee_rate: default_fee_rate(),
            limit_timeout_secs: default_limit_timeout_secs(),
            limit_offset_percentage: default_limit_offset_percentage(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: crate::telemetry::LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: crate::telemetry::LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [portfolio]
            total_capital = 5000
            max_loss_percentage = 12
            sizing_strategy = "risk_parity"

            [market]
            symbols = ["BTCUSDT", "ETHUSDT"]
            candle_interval = "15m"
            fetch_timeout_ms = 2000

            [telemetry]
            metrics_port = 9090
            log_level = "debug"
            log_format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.portfolio.total_capital, dec!(5000));
        assert_eq!(config.portfolio.max_loss_percentage, dec!(12));
        assert_eq!(config.portfolio.reserve_percentage, dec!(20));
        assert_eq!(config.portfolio.sizing_strategy, SizingStrategy::RiskParity);
        assert_eq!(config.market.symbols.len(), 2);
        assert_eq!(config.market.candle_limit, 100);
        assert_eq!(config.history.capacity, 100);
        assert_eq!(config.scheduler.cycle_interval_secs, 900);
        assert_eq!(config.execution.mode, ExecutionMode::Paper);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_requires_portfolio() {
        let result: Result<Config, _> = toml::from_str("[market]\ncandle_limit = 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_portfolio_is_valid() {
        assert!(PortfolioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let config = PortfolioConfig {
            min_position_size: dec!(500),
            max_position_size: dec!(100),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "min_position_size",
                ..
            }
        ));
    }

    #[test]
    fn test_percentage_out_of_range_rejected() {
        let config = PortfolioConfig {
            max_loss_percentage: dec!(150),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PortfolioConfig {
            reserve_percentage: dec!(100),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_returns_new_config() {
        let original = PortfolioConfig::default();
        let updated = original
            .apply(PortfolioUpdate {
                total_capital: Some(dec!(2500)),
                sizing_strategy: Some(SizingStrategy::KellyCriterion),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(original.total_capital, dec!(1000));
        assert_eq!(updated.total_capital, dec!(2500));
        assert_eq!(updated.sizing_strategy, SizingStrategy::KellyCriterion);
        assert_eq!(updated.stop_loss_percentage, original.stop_loss_percentage);
    }

    #[test]
    fn test_apply_rejects_invalid_update() {
        let original = PortfolioConfig::default();
        let result = original.apply(PortfolioUpdate {
            min_position_size: Some(dec!(1000)),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_history_retention_per_metric() {
        let history = HistoryConfig::default();
        assert_eq!(history.retention(Metric::Rsi).ttl, chrono::Duration::hours(24));
        assert_eq!(
            history.retention(Metric::Volatility).ttl,
            chrono::Duration::days(30)
        );
        assert_eq!(history.retention(Metric::Price).ttl, chrono::Duration::hours(2));
        assert_eq!(history.retention(Metric::Price).capacity, 100);
    }

    #[test]
    fn test_zero_cycle_interval_rejected() {
        let config = Config {
            portfolio: PortfolioConfig::default(),
            market: MarketConfig::default(),
            history: HistoryConfig::default(),
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig {
                cycle_interval_secs: 0,
            },
            execution: ExecutionConfig::default(),
            telemetry: TelemetryConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sizing_strategy_names() {
        assert_eq!(SizingStrategy::EqualWeight.as_str(), "equal_weight");
        assert_eq!(SizingStrategy::FixedAmount.as_str(), "fixed_amount");
    }
}
