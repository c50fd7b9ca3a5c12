//! Coarse trend and volume classification

use super::moving_average::sma;
use crate::market::Candle;
use serde::{Deserialize, Serialize};

/// Coarse trend of a single window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendSignal {
    Uptrend,
    Downtrend,
    Sideways,
}

/// Classify a close series by stacking price, short SMA and long SMA.
///
/// Uptrend when price > short SMA > long SMA, downtrend when
/// price < short SMA < long SMA, sideways otherwise.
pub fn identify_trend(closes: &[f64], short_period: usize, long_period: usize) -> TrendSignal {
    let Some(&price) = closes.last() else {
        return TrendSignal::Sideways;
    };
    let short = sma(closes, short_period);
    let long = sma(closes, long_period);

    if price > short && short > long {
        TrendSignal::Uptrend
    } else if price < short && short < long {
        TrendSignal::Downtrend
    } else {
        TrendSignal::Sideways
    }
}

/// Classify a window with SMA periods scaled to its length (quarter and half)
pub fn identify_window_trend(closes: &[f64]) -> TrendSignal {
    let len = closes.len();
    identify_trend(closes, (len / 4).max(2), (len / 2).max(3))
}

/// Volume read of the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeSignal {
    /// Heavy volume on an up bar
    Bullish,
    /// Heavy volume on a down bar
    Bearish,
    Neutral,
}

/// Volume above this multiple of the 20-bar average counts as heavy
pub const HEAVY_VOLUME_RATIO: f64 = 1.5;

pub fn classify_volume(candles: &[Candle]) -> VolumeSignal {
    let Some(last) = candles.last() else {
        return VolumeSignal::Neutral;
    };
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let average = sma(&volumes, 20);
    if average <= 0.0 || last.volume <= average * HEAVY_VOLUME_RATIO {
        return VolumeSignal::Neutral;
    }

    if last.is_bullish() {
        VolumeSignal::Bullish
    } else if last.is_bearish() {
        VolumeSignal::Bearish
    } else {
        VolumeSignal::Neutral
    }
}
