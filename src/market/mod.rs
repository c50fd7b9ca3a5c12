//! Market data module
//!
//! Candle types and the market data collaborator consumed by the decision
//! engine. Fetches are the only suspension points in an evaluation, so every
//! call goes through [`fetch_candles`] which applies the caller's deadline.

mod file;
mod memory;
mod types;

pub use file::JsonFileMarketData;
pub use memory::InMemoryMarketData;
pub use types::{Candle, CandleInterval, MarketDataError};

use async_trait::async_trait;
use std::time::Duration;

/// Trait for candle sources
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch up to `limit` candles, oldest first
    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// Fetch candles with a deadline; elapse is reported as a fetch failure
pub async fn fetch_candles(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    interval: CandleInterval,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<Candle>, MarketDataError> {
    match tokio::time::timeout(timeout, provider.get_candles(symbol, interval, limit)).await {
        Ok(result) => result,
        Err(_) => Err(MarketDataError::Timeout {
            symbol: symbol.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
