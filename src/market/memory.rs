//! In-memory candle source

use super::{Candle, CandleInterval, MarketDataError, MarketDataProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

/// Candle source backed by a concurrent map, used for replay and tests
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    series: DashMap<(String, CandleInterval), Vec<Candle>>,
    latency: Option<Duration>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch, to simulate a slow upstream
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replace the series for a symbol/interval
    pub fn insert(&self, symbol: &str, interval: CandleInterval, candles: Vec<Candle>) {
        self.series.insert((symbol.to_string(), interval), candles);
    }

    /// Append a closed candle to an existing series
    pub fn push(&self, symbol: &str, interval: CandleInterval, candle: Candle) {
        self.series
            .entry((symbol.to_string(), interval))
            .or_default()
            .push(candle);
    }

    pub fn remove(&self, symbol: &str, interval: CandleInterval) {
        self.series.remove(&(symbol.to_string(), interval));
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryMarketData {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let series = self
            .series
            .get(&(symbol.to_string(), interval))
            .ok_or_else(|| MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                interval,
            })?;

        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }
}
