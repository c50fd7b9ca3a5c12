//! Indicator snapshot over a candle window

use super::{
    atr, bollinger_bands, ema, macd, rsi, sma, stochastic, williams_r, BollingerBands, Macd,
    Stochastic,
};
use crate::market::Candle;
use serde::{Deserialize, Serialize};

/// Every indicator the decision engine reads, computed from one candle window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub current_price: f64,
    pub rsi: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub macd: Macd,
    pub bollinger: BollingerBands,
    pub stochastic: Stochastic,
    pub williams_r: f64,
    pub atr: f64,
    /// Volume of the latest bar
    pub volume: f64,
    /// 20-bar volume average
    pub volume_ma: f64,
}

impl IndicatorSnapshot {
    /// Compute from candles ordered oldest to newest
    pub fn from_candles(candles: &[Candle]) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        Self {
            current_price: closes.last().copied().unwrap_or(0.0),
            rsi: rsi(&closes, 14),
            sma20: sma(&closes, 20),
            sma50: sma(&closes, 50),
            ema12: ema(&closes, 12),
            ema26: ema(&closes, 26),
            macd: macd(&closes, 12, 26, 9),
            bollinger: bollinger_bands(&closes, 20, 2.0),
            stochastic: stochastic(&highs, &lows, &closes, 14, 3),
            williams_r: williams_r(&highs, &lows, &closes, 14),
            atr: atr(&highs, &lows, &closes, 14),
            volume: volumes.last().copied().unwrap_or(0.0),
            volume_ma: sma(&volumes, 20),
        }
    }

    /// Snapshot used when no market data is available: every level sits at
    /// the current price and every oscillator at its neutral value.
    pub fn neutral(price: f64) -> Self {
        Self {
            current_price: price,
            rsi: 50.0,
            sma20: price,
            sma50: price,
            ema12: price,
            ema26: price,
            macd: Macd::default(),
            bollinger: BollingerBands {
                upper: price,
                middle: price,
                lower: price,
            },
            stochastic: Stochastic::default(),
            williams_r: -50.0,
            atr: 0.0,
            volume: 0.0,
            volume_ma: 0.0,
        }
    }
}
