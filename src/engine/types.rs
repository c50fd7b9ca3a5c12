//! Decision engine types

use crate::indicators::TrendSignal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multi-timeframe trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    StrongUp,
    Up,
    WeakUp,
    Sideways,
    WeakDown,
    Down,
    StrongDown,
}

impl TrendDirection {
    pub fn is_up(&self) -> bool {
        matches!(
            self,
            TrendDirection::StrongUp | TrendDirection::Up | TrendDirection::WeakUp
        )
    }

    pub fn is_down(&self) -> bool {
        matches!(
            self,
            TrendDirection::StrongDown | TrendDirection::Down | TrendDirection::WeakDown
        )
    }

    /// Down or strong down; a weak down trend is not a confirmed reversal
    pub fn is_confirmed_down(&self) -> bool {
        matches!(self, TrendDirection::StrongDown | TrendDirection::Down)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::StrongUp => "STRONG_UP",
            TrendDirection::Up => "UP",
            TrendDirection::WeakUp => "WEAK_UP",
            TrendDirection::Sideways => "SIDEWAYS",
            TrendDirection::WeakDown => "WEAK_DOWN",
            TrendDirection::Down => "DOWN",
            TrendDirection::StrongDown => "STRONG_DOWN",
        }
    }
}

/// Trend direction with strength in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendState {
    pub direction: TrendDirection,
    pub strength: f64,
    /// Per-window reads: last 20, last 50 and full window
    pub short: TrendSignal,
    pub medium: TrendSignal,
    pub long: TrendSignal,
}

impl TrendState {
    pub fn new(direction: TrendDirection, strength: f64) -> Self {
        Self {
            direction,
            strength: strength.clamp(0.0, 1.0),
            short: TrendSignal::Sideways,
            medium: TrendSignal::Sideways,
            long: TrendSignal::Sideways,
        }
    }

    pub fn sideways() -> Self {
        Self::new(TrendDirection::Sideways, 0.0)
    }
}

/// Momentum direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MomentumDirection {
    Strengthening,
    Weakening,
    Neutral,
}

/// Momentum read from MACD histogram and RSI change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumState {
    pub direction: MomentumDirection,
    pub strength: f64,
    /// RSI change versus the previous stored sample
    pub rsi_change: f64,
}

impl MomentumState {
    pub fn new(direction: MomentumDirection, strength: f64) -> Self {
        Self {
            direction,
            strength: strength.clamp(0.0, 1.0),
            rsi_change: 0.0,
        }
    }

    pub fn neutral() -> Self {
        Self::new(MomentumDirection::Neutral, 0.0)
    }
}

/// Return volatility of the decision window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityState {
    /// Per-bar standard deviation of returns
    pub current: f64,
    /// Per-bar volatility scaled to one day
    pub daily: f64,
    /// Rank of `current` within stored history
    pub percentile: f64,
}

impl Default for VolatilityState {
    fn default() -> Self {
        Self {
            current: 0.0,
            daily: 0.0,
            percentile: 0.5,
        }
    }
}

/// What the orchestrator should do with a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Sell,
    Hold,
}

/// Execution urgency, decided solely by which rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    None,
    Low,
    Medium,
    High,
}

/// The rule that produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    EmergencySell,
    TrendReversal,
    StopLoss,
    TimeBasedLoss,
    TakeProfit,
    Hold,
}

impl Decision {
    pub fn action(&self) -> Action {
        match self {
            Decision::Hold => Action::Hold,
            Decision::EmergencySell
            | Decision::TrendReversal
            | Decision::StopLoss
            | Decision::TimeBasedLoss
            | Decision::TakeProfit => Action::Sell,
        }
    }

    pub fn urgency(&self) -> Urgency {
        match self {
            Decision::EmergencySell | Decision::StopLoss => Urgency::High,
            Decision::TrendReversal => Urgency::Medium,
            Decision::TimeBasedLoss | Decision::TakeProfit => Urgency::Low,
            Decision::Hold => Urgency::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::EmergencySell => "EMERGENCY_SELL",
            Decision::TrendReversal => "TREND_REVERSAL",
            Decision::StopLoss => "STOP_LOSS",
            Decision::TimeBasedLoss => "TIME_BASED_LOSS",
            Decision::TakeProfit => "TAKE_PROFIT",
            Decision::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine output for one position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable evidence, in the order it was gathered
    pub details: Vec<String>,
}

impl Recommendation {
    pub fn new(decision: Decision, confidence: f64, details: Vec<String>) -> Self {
        Self {
            decision,
            confidence: confidence.clamp(0.0, 1.0),
            details,
        }
    }

    pub fn action(&self) -> Action {
        self.decision.action()
    }

    pub fn urgency(&self) -> Urgency {
        self.decision.urgency()
    }

    pub fn is_sell(&self) -> bool {
        self.action() == Action::Sell
    }
}
