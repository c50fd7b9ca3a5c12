//! Historical metric types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Metric classes tracked per symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Rsi,
    Volatility,
    Price,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rsi => "rsi",
            Metric::Volatility => "volatility",
            Metric::Price => "price",
        }
    }

    /// Whether a drop from `first` to `last` is large enough to count as weakening
    pub fn is_significant_decline(&self, first: f64, last: f64) -> bool {
        let decline = first - last;
        match self {
            // RSI points
            Metric::Rsi => decline > 5.0,
            // Absolute return volatility
            Metric::Volatility => decline > 0.005,
            // One percent of the starting price
            Metric::Price => first > 0.0 && decline / first > 0.01,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one bounded series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub symbol: String,
    pub metric: Metric,
}

impl SeriesKey {
    pub fn new(symbol: &str, metric: Metric) -> Self {
        Self {
            symbol: symbol.to_string(),
            metric,
        }
    }
}

/// A recorded metric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Retention policy for one metric class
#[derive(Debug, Clone, Copy)]
pub struct Retention {
    pub capacity: usize,
    pub ttl: Duration,
}

/// Historical store backend errors
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History backend unavailable: {0}")]
    Unavailable(String),
}
