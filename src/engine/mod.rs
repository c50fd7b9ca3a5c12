//! Decision engine
//!
//! Evaluates one open position per call and recommends holding or selling,
//! together with a confidence and the urgency the sale should be worked
//! with.

mod analysis;
mod manager;
mod rules;
mod types;

pub use analysis::{
    analyze_momentum, analyze_trend, analyze_volatility, hourly_change, is_extreme_bearish_macd,
};
pub use manager::{EngineSettings, SmartLossManager, RSI_WEAKENING_PERIODS};
pub use rules::{
    check_emergency, check_stop_loss, check_take_profit, check_time_based_loss,
    check_trend_reversal, emergency_evidence, evaluate_rules, hold_evidence, reversal_threshold,
    trend_reversal_evidence, Evidence, MarketContext,
};
pub use types::{
    Action, Decision, MomentumDirection, MomentumState, Recommendation, TrendDirection,
    TrendState, Urgency, VolatilityState,
};
