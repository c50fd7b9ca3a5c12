//! Market data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Candle interval understood by the market data collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
        }
    }

    /// Number of bars of this interval in one day
    pub fn periods_per_day(&self) -> f64 {
        match self {
            CandleInterval::FiveMinutes => 288.0,
            CandleInterval::FifteenMinutes => 96.0,
            CandleInterval::OneHour => 24.0,
            CandleInterval::FourHours => 6.0,
            CandleInterval::OneDay => 1.0,
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(CandleInterval::FiveMinutes),
            "15m" => Ok(CandleInterval::FifteenMinutes),
            "1h" => Ok(CandleInterval::OneHour),
            "4h" => Ok(CandleInterval::FourHours),
            "1d" => Ok(CandleInterval::OneDay),
            other => Err(MarketDataError::UnknownInterval(other.to_string())),
        }
    }
}

/// Market data errors
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// No candles known for the symbol/interval
    #[error("No candles for {symbol} {interval}")]
    Unavailable {
        symbol: String,
        interval: CandleInterval,
    },
    /// Fetch exceeded the caller's deadline
    #[error("Candle fetch for {symbol} timed out after {timeout_ms}ms")]
    Timeout { symbol: String, timeout_ms: u64 },
    /// Unrecognised interval string
    #[error("Unknown candle interval: {0}")]
    UnknownInterval(String),
    #[error("Failed to read candle file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse candle file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_round_trip_str() {
        for interval in [
            CandleInterval::FiveMinutes,
            CandleInterval::FifteenMinutes,
            CandleInterval::OneHour,
            CandleInterval::FourHours,
            CandleInterval::OneDay,
        ] {
            assert_eq!(interval.as_str().parse::<CandleInterval>().unwrap(), interval);
        }
    }

    #[test]
    fn test_unknown_interval() {
        let err = "3m".parse::<CandleInterval>().unwrap_err();
        assert!(matches!(err, MarketDataError::UnknownInterval(_)));
    }

    #[test]
    fn test_fifteen_minute_periods_per_day() {
        assert_eq!(CandleInterval::FifteenMinutes.periods_per_day(), 96.0);
    }

    #[test]
    fn test_candle_direction() {
        let candle = Candle {
            open_time: Utc::now(),
            open: 100.0,
            high: 105.0,
            low: 99.0,
            close: 104.0,
            volume: 10.0,
        };
        assert!(candle.is_bullish());
        assert!(!candle.is_bearish());
    }

    #[test]
    fn test_interval_serde_name() {
        let json = serde_json::to_string(&CandleInterval::OneHour).unwrap();
        assert_eq!(json, "\"1h\"");
    }
}
