//! Decision cascade
//!
//! Rules run in a fixed order and the first one that fires wins:
//! emergency sell, trend reversal, stop loss, time-based loss, take profit.
//! When none fires the position is held with a confidence built from trend,
//! momentum and P&L.

use super::analysis::is_extreme_bearish_macd;
use super::types::{
    Decision, MomentumDirection, MomentumState, Recommendation, TrendDirection, TrendState,
    VolatilityState,
};
use crate::config::PortfolioConfig;
use crate::indicators::{IndicatorSnapshot, VolumeSignal};
use crate::risk::Position;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

/// Emergency sell fires strictly above this accumulated confidence
pub const EMERGENCY_THRESHOLD: f64 = 0.7;
/// Reversal threshold while the loss is still shallow
pub const SHALLOW_LOSS_REVERSAL_THRESHOLD: f64 = 0.8;
/// Reversal threshold once the loss is material
pub const DEEP_LOSS_REVERSAL_THRESHOLD: f64 = 0.6;
/// Losses above this fraction count as shallow
pub const SHALLOW_LOSS: f64 = -0.03;

/// Everything the cascade reads about the market for one position
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub price: f64,
    /// Signed return since entry as a fraction
    pub pnl: f64,
    pub snapshot: IndicatorSnapshot,
    /// Trend on the decision interval
    pub trend: TrendState,
    /// Trend on the confirmation (1h) interval
    pub hourly_trend: TrendState,
    pub momentum: MomentumState,
    pub volatility: VolatilityState,
    /// Close-to-close change of the last hourly bar
    pub hourly_change: f64,
    /// Stored RSI has been falling significantly
    pub rsi_weakening: bool,
    /// Heavy-volume read of the latest decision bar
    pub volume_signal: VolumeSignal,
}

impl MarketContext {
    /// Context with neutral analyses at `price`
    pub fn neutral(price: f64, pnl: f64) -> Self {
        Self {
            price,
            pnl,
            snapshot: IndicatorSnapshot::neutral(price),
            trend: TrendState::sideways(),
            hourly_trend: TrendState::sideways(),
            momentum: MomentumState::neutral(),
            volatility: VolatilityState::default(),
            hourly_change: 0.0,
            rsi_weakening: false,
            volume_signal: VolumeSignal::Neutral,
        }
    }
}

/// Accumulated confidence and the evidence behind it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    pub confidence: f64,
    pub details: Vec<String>,
}

impl Evidence {
    fn add(&mut self, weight: f64, detail: String) {
        self.confidence += weight;
        self.details.push(detail);
    }

    fn capped(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// Independent emergency triggers, summed and capped at 1
pub fn emergency_evidence(ctx: &MarketContext) -> Evidence {
    let mut evidence = Evidence::default();
    let snap = &ctx.snapshot;

    if ctx.hourly_change < -0.08 {
        evidence.add(
            0.9,
            format!("Flash crash: {:.2}% in the last hour", ctx.hourly_change * 100.0),
        );
    }
    if snap.rsi < 20.0 && snap.volume > snap.volume_ma * 2.0 {
        evidence.add(
            0.7,
            format!(
                "Panic selling: RSI {:.1} on volume {:.1}x average",
                snap.rsi,
                snap.volume / snap.volume_ma
            ),
        );
    }
    if ctx.trend.direction == TrendDirection::StrongDown && ctx.pnl < -0.12 {
        evidence.add(
            0.8,
            format!("Strong downtrend with {:.2}% loss", ctx.pnl * 100.0),
        );
    }
    if is_extreme_bearish_macd(&snap.macd, ctx.price) {
        evidence.add(
            0.6,
            format!("Extreme bearish MACD: histogram {:.4}", snap.macd.histogram),
        );
    }
    let width = snap.bollinger.width_ratio();
    if width < 0.02 && ctx.price < snap.bollinger.lower * 0.98 {
        evidence.add(
            0.7,
            format!("Bollinger squeeze breakdown: width {:.2}%", width * 100.0),
        );
    }

    evidence.capped()
}

/// Required reversal confidence for a given P&L fraction
pub fn reversal_threshold(pnl: f64) -> f64 {
    if pnl > SHALLOW_LOSS {
        SHALLOW_LOSS_REVERSAL_THRESHOLD
    } else {
        DEEP_LOSS_REVERSAL_THRESHOLD
    }
}

/// Evidence that the trend has turned against the position
pub fn trend_reversal_evidence(ctx: &MarketContext) -> Evidence {
    let mut evidence = Evidence::default();
    let snap = &ctx.snapshot;

    if ctx.trend.direction.is_confirmed_down() {
        evidence.add(
            ctx.trend.strength * 0.4,
            format!(
                "Trend {} (strength {:.2})",
                ctx.trend.direction.as_str(),
                ctx.trend.strength
            ),
        );
    }
    if ctx.price < snap.sma20 && ctx.price < snap.sma50 {
        evidence.add(0.3, "Price below SMA20 and SMA50".to_string());
    }
    if ctx.momentum.direction == MomentumDirection::Weakening && ctx.momentum.strength > 0.6 {
        evidence.add(
            0.2,
            format!("Weakening momentum (strength {:.2})", ctx.momentum.strength),
        );
    }
    if ctx.rsi_weakening && snap.rsi < 45.0 {
        evidence.add(0.2, format!("Sustained RSI weakness at {:.1}", snap.rsi));
    }
    if snap.volume_ma > 0.0 && snap.volume > snap.volume_ma * 1.2 {
        let ratio = snap.volume / snap.volume_ma;
        let detail = match ctx.volume_signal {
            VolumeSignal::Bearish => {
                format!("Volume confirms at {ratio:.1}x average on a down bar")
            }
            _ => format!("Volume confirms at {ratio:.1}x average"),
        };
        evidence.add(0.2, detail);
    }
    if ctx.pnl < -0.06 {
        evidence.add(
            (ctx.pnl.abs() / 0.15).min(1.0) * 0.3,
            format!("Loss of {:.2}%", ctx.pnl * 100.0),
        );
    }
    if ctx.hourly_trend.direction.is_confirmed_down() {
        evidence.add(
            0.2,
            format!("1h trend {}", ctx.hourly_trend.direction.as_str()),
        );
    }

    evidence.capped()
}

/// Confidence in holding, from a base of 0.5
pub fn hold_evidence(trend: &TrendState, momentum: &MomentumState, pnl_percentage: f64) -> Evidence {
    let mut evidence = Evidence {
        confidence: 0.5,
        details: Vec::new(),
    };

    if trend.direction.is_up() {
        evidence.add(
            trend.strength * 0.3,
            format!("Trend {} supports holding", trend.direction.as_str()),
        );
    }
    if momentum.direction == MomentumDirection::Strengthening {
        evidence.add(momentum.strength * 0.2, "Momentum strengthening".to_string());
    }
    if pnl_percentage > 0.0 {
        evidence.add(
            (pnl_percentage / 10.0).min(0.2),
            format!("In profit by {:.2}%", pnl_percentage),
        );
    }
    if trend.direction.is_down() {
        evidence.add(
            -trend.strength * 0.4,
            format!("Trend {} weighs against holding", trend.direction.as_str()),
        );
    }
    if pnl_percentage < -5.0 {
        evidence.add(
            -(pnl_percentage.abs() / 20.0).min(0.3),
            format!("Loss of {:.2}%", pnl_percentage),
        );
    }

    evidence.capped()
}

pub fn check_emergency(ctx: &MarketContext) -> Option<Recommendation> {
    let evidence = emergency_evidence(ctx);
    (evidence.confidence > EMERGENCY_THRESHOLD)
        .then(|| Recommendation::new(Decision::EmergencySell, evidence.confidence, evidence.details))
}

pub fn check_trend_reversal(ctx: &MarketContext) -> Option<Recommendation> {
    let evidence = trend_reversal_evidence(ctx);
    let threshold = reversal_threshold(ctx.pnl);
    debug!(
        confidence = evidence.confidence,
        threshold, "Trend reversal evidence"
    );
    (evidence.confidence >= threshold)
        .then(|| Recommendation::new(Decision::TrendReversal, evidence.confidence, evidence.details))
}

pub fn check_stop_loss(
    position: &Position,
    config: &PortfolioConfig,
    current_price: Decimal,
) -> Option<Recommendation> {
    let pnl = position.pnl_fraction(current_price);
    let floor = -config.stop_loss_percentage / Decimal::ONE_HUNDRED;
    if current_price <= position.stop_loss || pnl <= floor {
        return Some(Recommendation::new(
            Decision::StopLoss,
            1.0,
            vec![format!(
                "Price {} at or below stop {} (P&L {:.2}%)",
                current_price,
                position.stop_loss,
                pnl * Decimal::ONE_HUNDRED
            )],
        ));
    }
    None
}

pub fn check_time_based_loss(
    position: &Position,
    config: &PortfolioConfig,
    current_price: Decimal,
    now: DateTime<Utc>,
) -> Option<Recommendation> {
    if !config.accept_loss_after_period || !config.should_accept_loss(position, current_price, now) {
        return None;
    }
    let age = position.age(now);
    Some(Recommendation::new(
        Decision::TimeBasedLoss,
        0.8,
        vec![format!(
            "Held {}h past the {}-day horizon",
            (age - config.holding_period()).num_hours(),
            config.period_days
        )],
    ))
}

pub fn check_take_profit(
    position: &Position,
    config: &PortfolioConfig,
    current_price: Decimal,
) -> Option<Recommendation> {
    let pnl = position.pnl_fraction(current_price);
    let target = config.take_profit_percentage / Decimal::ONE_HUNDRED;
    if current_price >= position.take_profit || pnl >= target {
        return Some(Recommendation::new(
            Decision::TakeProfit,
            1.0,
            vec![format!(
                "Price {} reached target {} (P&L {:.2}%)",
                current_price,
                position.take_profit,
                pnl * Decimal::ONE_HUNDRED
            )],
        ));
    }
    None
}

/// Run the cascade and return the first verdict, or hold
pub fn evaluate_rules(
    ctx: &MarketContext,
    position: &Position,
    config: &PortfolioConfig,
    current_price: Decimal,
    now: DateTime<Utc>,
) -> Recommendation {
    check_emergency(ctx)
        .or_else(|| check_trend_reversal(ctx))
        .or_else(|| check_stop_loss(position, config, current_price))
        .or_else(|| check_time_based_loss(position, config, current_price, now))
        .or_else(|| check_take_profit(position, config, current_price))
        .unwrap_or_else(|| {
            let evidence = hold_evidence(&ctx.trend, &ctx.momentum, ctx.pnl * 100.0);
            Recommendation::new(Decision::Hold, evidence.confidence, evidence.details)
        })
}
