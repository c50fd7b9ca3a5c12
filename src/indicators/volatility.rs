//! Volatility measures: Bollinger Bands, ATR, return dispersion

use super::moving_average::sma;
use serde::{Deserialize, Serialize};

/// Bollinger band levels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    fn flat(price: f64) -> Self {
        Self {
            upper: price,
            middle: price,
            lower: price,
        }
    }

    /// Band width relative to the middle band
    pub fn width_ratio(&self) -> f64 {
        if self.middle == 0.0 {
            return 0.0;
        }
        (self.upper - self.lower) / self.middle
    }
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Bollinger Bands over the trailing `period`; a flat band at the last value
/// when history is short.
pub fn bollinger_bands(values: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let last = values.last().copied().unwrap_or(0.0);
    if period == 0 || values.len() < period {
        return BollingerBands::flat(last);
    }

    let middle = sma(values, period);
    let deviation = std_dev(&values[values.len() - period..]);
    BollingerBands {
        upper: middle + deviation * multiplier,
        middle,
        lower: middle - deviation * multiplier,
    }
}

/// Average true range over the trailing `period` bars, 0 when history is short
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let len = highs.len().min(lows.len()).min(closes.len());
    if period == 0 || len < period + 1 {
        return 0.0;
    }

    let true_ranges: Vec<f64> = (len - period..len)
        .map(|i| {
            let prev_close = closes[i - 1];
            (highs[i] - lows[i])
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        })
        .collect();

    true_ranges.iter().sum::<f64>() / period as f64
}

/// Simple per-step returns, skipping non-positive reference prices
pub fn returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Standard deviation of per-step returns
pub fn return_volatility(values: &[f64]) -> f64 {
    let r = returns(values);
    if r.len() < 2 {
        return 0.0;
    }
    std_dev(&r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_population() {
        // mean 5, squared deviations sum 32 over 8 values
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_insufficient_is_flat() {
        let bands = bollinger_bands(&[10.0, 11.0], 20, 2.0);
        assert_eq!(bands.upper, 11.0);
        assert_eq!(bands.middle, 11.0);
        assert_eq!(bands.lower, 11.0);
        assert_eq!(bands.width_ratio(), 0.0);
    }

    #[test]
    fn test_bollinger_symmetric() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = bollinger_bands(&values, 8, 2.0);
        assert!((bands.middle - 5.0).abs() < 1e-12);
        assert!((bands.upper - 9.0).abs() < 1e-12);
        assert!((bands.lower - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_atr_uses_gaps() {
        let highs = [10.0, 12.0];
        let lows = [9.0, 11.5];
        let closes = [9.5, 12.0];
        // TR = max(0.5, |12 - 9.5|, |11.5 - 9.5|) = 2.5
        assert!((atr(&highs, &lows, &closes, 1) - 2.5).abs() < 1e-12);
        assert_eq!(atr(&highs, &lows, &closes, 14), 0.0);
    }

    #[test]
    fn test_return_volatility_constant_is_zero() {
        assert_eq!(return_volatility(&[100.0; 10]), 0.0);
    }

    #[test]
    fn test_return_volatility_positive() {
        let values = [100.0, 102.0, 99.0, 103.0, 98.0];
        assert!(return_volatility(&values) > 0.0);
    }
}
