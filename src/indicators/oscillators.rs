//! Bounded oscillators: RSI, Stochastic, Williams %R

use serde::{Deserialize, Serialize};

/// Relative strength index over the trailing `period` deltas.
///
/// Averages are plain means of gains and losses. Returns 50 with fewer than
/// `period + 1` values and 100 when there were no losses.
pub fn rsi(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period + 1 {
        return 50.0;
    }

    let window = &values[values.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Stochastic oscillator lines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self { k: 50.0, d: 50.0 }
    }
}

fn percent_k(highs: &[f64], lows: &[f64], close: f64) -> f64 {
    let highest = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lowest = lows.iter().copied().fold(f64::INFINITY, f64::min);
    let range = highest - lowest;
    if range <= 0.0 || !range.is_finite() {
        return 50.0;
    }
    (close - lowest) / range * 100.0
}

/// Stochastic %K over `k_period` bars, %D as the mean of the last `d_period` %K values
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> Stochastic {
    let len = highs.len().min(lows.len()).min(closes.len());
    if k_period == 0 || len < k_period {
        return Stochastic::default();
    }

    let available = len - k_period + 1;
    let samples = d_period.max(1).min(available);
    let ks: Vec<f64> = (len - samples..len)
        .map(|end| {
            let start = end + 1 - k_period;
            percent_k(&highs[start..=end], &lows[start..=end], closes[end])
        })
        .collect();

    let k = ks.last().copied().unwrap_or(50.0);
    let d = ks.iter().sum::<f64>() / ks.len() as f64;
    Stochastic { k, d }
}

/// Williams %R in [-100, 0]; -50 with insufficient history or a flat range
pub fn williams_r(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let len = highs.len().min(lows.len()).min(closes.len());
    if period == 0 || len < period {
        return -50.0;
    }

    let start = len - period;
    let highest = highs[start..len]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let lowest = lows[start..len].iter().copied().fold(f64::INFINITY, f64::min);
    let range = highest - lowest;
    if range <= 0.0 {
        return -50.0;
    }
    (highest - closes[len - 1]) / range * -100.0
}
