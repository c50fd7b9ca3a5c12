//! Moving averages and MACD

use serde::{Deserialize, Serialize};

/// Simple moving average of the last `period` values.
///
/// With fewer than `period` values the last available value is returned
/// (0.0 for an empty slice).
pub fn sma(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period {
        return values.last().copied().unwrap_or(0.0);
    }
    let window = &values[values.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// Exponential moving average, `k = 2 / (period + 1)`.
///
/// Seeded with the first value rather than an SMA of the first `period`
/// values. Every downstream threshold is calibrated against this seeding.
pub fn ema(values: &[f64], period: usize) -> f64 {
    ema_series(values, period).last().copied().unwrap_or(0.0)
}

/// Running EMA over every prefix of `values`.
///
/// Element `i` equals `ema(&values[..=i], period)` exactly, since the
/// first-value seed makes each prefix EMA the running recurrence value.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let k = 2.0 / (period as f64 + 1.0);

    let mut series = Vec::with_capacity(values.len());
    let mut current = first;
    series.push(current);
    for &value in &values[1..] {
        current = value * k + current * (1.0 - k);
        series.push(current);
    }
    series
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD with the given fast/slow/signal periods.
///
/// The signal line is the EMA of the MACD value at every prefix of the
/// input. Computed with the running recurrence, which yields the same
/// numbers as recomputing both EMAs over each growing prefix.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    if values.is_empty() {
        return Macd::default();
    }

    let fast_series = ema_series(values, fast);
    let slow_series = ema_series(values, slow);
    let macd_series: Vec<f64> = fast_series
        .iter()
        .zip(&slow_series)
        .map(|(f, s)| f - s)
        .collect();

    let macd_line = macd_series.last().copied().unwrap_or(0.0);
    let signal_line = ema(&macd_series, signal);

    Macd {
        macd: macd_line,
        signal: signal_line,
        histogram: macd_line - signal_line,
    }
}
