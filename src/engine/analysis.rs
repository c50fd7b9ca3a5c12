//! Trend, momentum and volatility analyses
//!
//! Pure functions over candle windows and indicator snapshots. Every one of
//! them degrades to its neutral value on short or empty input.

use super::types::{
    MomentumDirection, MomentumState, TrendDirection, TrendState, VolatilityState,
};
use crate::indicators::{identify_window_trend, return_volatility, IndicatorSnapshot, Macd, TrendSignal};
use crate::market::{Candle, CandleInterval};

/// Short trend window in bars
pub const SHORT_WINDOW: usize = 20;
/// Medium trend window in bars
pub const MEDIUM_WINDOW: usize = 50;
/// Bars whose high/low range positions the current price
pub const RANGE_WINDOW: usize = 10;

/// RSI change that, together with the MACD histogram sign, sets momentum
pub const RSI_MOMENTUM_THRESHOLD: f64 = 2.0;

fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

/// Position of the latest close within the recent high/low range, in [0, 1]
fn range_position(candles: &[Candle]) -> f64 {
    let window = tail(candles, RANGE_WINDOW);
    let Some(last) = window.last() else {
        return 0.5;
    };
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    if high - low <= f64::EPSILON {
        return 0.5;
    }
    ((last.close - low) / (high - low)).clamp(0.0, 1.0)
}

/// Classify the candle window across three overlapping sub-windows.
///
/// Short and medium both up with the full window confirming is a strong
/// uptrend; short and medium up alone is an uptrend; only one of them up is
/// a weak uptrend. Down trends mirror this. Strength starts at 0.6 and
/// rises with the price's position in the recent range (measured from the
/// top for down trends); weak trends get half of that.
pub fn analyze_trend(candles: &[Candle]) -> TrendState {
    if candles.len() < 2 {
        return TrendState::sideways();
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let short = identify_window_trend(tail(&closes, SHORT_WINDOW));
    let medium = identify_window_trend(tail(&closes, MEDIUM_WINDOW));
    let long = identify_window_trend(&closes);

    let direction = combine_windows(short, medium, long);
    let position = range_position(candles);
    let strength = match direction {
        TrendDirection::StrongUp | TrendDirection::Up => 0.6 + 0.4 * position,
        TrendDirection::StrongDown | TrendDirection::Down => 0.6 + 0.4 * (1.0 - position),
        TrendDirection::WeakUp => 0.3 + 0.2 * position,
        TrendDirection::WeakDown => 0.3 + 0.2 * (1.0 - position),
        TrendDirection::Sideways => 0.0,
    };

    TrendState {
        short,
        medium,
        long,
        ..TrendState::new(direction, strength)
    }
}

fn combine_windows(short: TrendSignal, medium: TrendSignal, long: TrendSignal) -> TrendDirection {
    use TrendSignal::{Downtrend, Uptrend};

    match (short, medium) {
        (Uptrend, Uptrend) if long == Uptrend => TrendDirection::StrongUp,
        (Uptrend, Uptrend) => TrendDirection::Up,
        (Uptrend, _) | (_, Uptrend) => TrendDirection::WeakUp,
        (Downtrend, Downtrend) if long == Downtrend => TrendDirection::StrongDown,
        (Downtrend, Downtrend) => TrendDirection::Down,
        (Downtrend, _) | (_, Downtrend) => TrendDirection::WeakDown,
        _ => TrendDirection::Sideways,
    }
}

/// Momentum from the MACD histogram and the RSI change since the previous
/// stored sample.
///
/// Strength averages the histogram size relative to price (saturating at
/// 0.5% of price) with the RSI change (saturating at 10 points).
pub fn analyze_momentum(snapshot: &IndicatorSnapshot, previous_rsi: Option<f64>) -> MomentumState {
    let rsi_change = previous_rsi.map(|p| snapshot.rsi - p).unwrap_or(0.0);
    let histogram = snapshot.macd.histogram;

    let direction = if histogram > 0.0 && rsi_change > RSI_MOMENTUM_THRESHOLD {
        MomentumDirection::Strengthening
    } else if histogram < 0.0 && rsi_change < -RSI_MOMENTUM_THRESHOLD {
        MomentumDirection::Weakening
    } else {
        MomentumDirection::Neutral
    };

    let histogram_pct = if snapshot.current_price > 0.0 {
        histogram.abs() / snapshot.current_price * 100.0
    } else {
        0.0
    };
    let strength = (histogram_pct / 0.5).min(1.0) * 0.5 + (rsi_change.abs() / 10.0).min(1.0) * 0.5;

    MomentumState {
        rsi_change,
        ..MomentumState::new(direction, strength)
    }
}

/// Per-bar and daily return volatility of a close series.
///
/// The percentile is left neutral; the caller ranks `current` against
/// stored history.
pub fn analyze_volatility(closes: &[f64], interval: CandleInterval) -> VolatilityState {
    let current = return_volatility(closes);
    VolatilityState {
        current,
        daily: current * interval.periods_per_day().sqrt(),
        ..VolatilityState::default()
    }
}

/// Close-to-close change of the last two bars as a fraction
pub fn hourly_change(candles: &[Candle]) -> f64 {
    match candles {
        [.., previous, last] if previous.close > 0.0 => (last.close - previous.close) / previous.close,
        _ => 0.0,
    }
}

/// MACD below zero with a falling histogram larger than 0.5% of price
pub fn is_extreme_bearish_macd(macd: &Macd, price: f64) -> bool {
    price > 0.0 && macd.macd < 0.0 && macd.histogram < 0.0 && macd.histogram.abs() / price > 0.005
}
