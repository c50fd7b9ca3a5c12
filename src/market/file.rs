//! JSON file candle source
//!
//! Reads `<dir>/<SYMBOL>_<interval>.json`, each file holding an array of
//! candles oldest first.

use super::{Candle, CandleInterval, MarketDataError, MarketDataProvider};
use async_trait::async_trait;
use std::path::PathBuf;

/// Candle source reading exported JSON files from a directory
#[derive(Debug, Clone)]
pub struct JsonFileMarketData {
    dir: PathBuf,
}

impl JsonFileMarketData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str, interval: CandleInterval) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", symbol.to_uppercase(), interval.as_str()))
    }
}

#[async_trait]
impl MarketDataProvider for JsonFileMarketData {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let path = self.path_for(symbol, interval);
        if !path.exists() {
            return Err(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                interval,
            });
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let mut candles: Vec<Candle> = serde_json::from_str(&content)?;
        candles.sort_by_key(|c| c.open_time);

        let start = candles.len().saturating_sub(limit);
        Ok(candles.split_off(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_reads_and_orders_candles() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let candles = vec![
            Candle {
                open_time: now,
                open: 2.0,
                high: 2.0,
                low: 2.0,
                close: 2.0,
                volume: 1.0,
            },
            Candle {
                open_time: now - Duration::minutes(15),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1.0,
            },
        ];
        std::fs::write(
            dir.path().join("BTCUSDT_15m.json"),
            serde_json::to_string(&candles).unwrap(),
        )
        .unwrap();

        let provider = JsonFileMarketData::new(dir.path());
        let result = provider
            .get_candles("btcusdt", CandleInterval::FifteenMinutes, 100)
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].close, 1.0);
        assert_eq!(result[1].close, 2.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileMarketData::new(dir.path());
        let result = provider
            .get_candles("BTCUSDT", CandleInterval::OneHour, 10)
            .await;
        assert!(matches!(result, Err(MarketDataError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BTCUSDT_1h.json"), "not json").unwrap();
        let provider = JsonFileMarketData::new(dir.path());
        let result = provider
            .get_candles("BTCUSDT", CandleInterval::OneHour, 10)
            .await;
        assert!(matches!(result, Err(MarketDataError::Parse(_))));
    }
}
