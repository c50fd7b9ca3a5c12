//! End-to-end integration tests

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use smart_loss::config::{Config, PortfolioUpdate, SizingStrategy};
use smart_loss::engine::{Decision, EngineSettings, SmartLossManager};
use smart_loss::history::MetricHistory;
use smart_loss::market::{Candle, JsonFileMarketData};
use smart_loss::risk::Position;
use std::io::Write;
use std::sync::Arc;

fn example_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.example")
}

#[test]
fn test_config_example_loads() {
    let config = Config::load(example_path()).unwrap();
    assert_eq!(config.portfolio.total_capital, dec!(1000));
    assert_eq!(config.portfolio.sizing_strategy, SizingStrategy::EqualWeight);
    assert_eq!(config.market.symbols, vec!["BTCUSDT", "ETHUSDT"]);
    assert_eq!(config.portfolio.max_total_loss_amount(), dec!(100));
    assert_eq!(config.portfolio.available_capital(), dec!(800));
}

#[test]
fn test_invalid_config_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [portfolio]
        total_capital = 1000
        min_position_size = 500
        max_position_size = 100
        "#
    )
    .unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("min_position_size"));
}

#[test]
fn test_update_produces_new_config() {
    let config = Config::load(example_path()).unwrap();
    let updated = config
        .portfolio
        .apply(PortfolioUpdate {
            sizing_strategy: Some(SizingStrategy::RiskParity),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(updated.sizing_strategy, SizingStrategy::RiskParity);
    assert_eq!(config.portfolio.sizing_strategy, SizingStrategy::EqualWeight);

    let rejected = config.portfolio.apply(PortfolioUpdate {
        unrealized_loss_weight: Some(dec!(1.5)),
        ..Default::default()
    });
    assert!(rejected.is_err());
}

#[tokio::test]
async fn test_evaluate_from_candle_files() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();
    let write = |name: &str, closes: Vec<f64>, step: i64| {
        let n = closes.len() as i64;
        let candles: Vec<Candle> = closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| Candle {
                open_time: now - Duration::minutes(step * (n - i as i64)),
                open: close,
                high: close * 1.002,
                low: close * 0.998,
                close,
                volume: if i as i64 == n - 1 { 150.0 } else { 100.0 },
            })
            .collect();
        std::fs::write(dir.path().join(name), serde_json::to_string(&candles).unwrap()).unwrap();
    };
    write(
        "BTCUSDT_15m.json",
        (0..100).map(|i| 109.8 - 0.2 * i as f64).collect(),
        15,
    );
    write(
        "BTCUSDT_1h.json",
        (0..50).map(|i| 129.2 - 0.8 * i as f64).collect(),
        60,
    );

    let config = Config::load(example_path()).unwrap();
    let engine = SmartLossManager::new(
        Arc::new(JsonFileMarketData::new(dir.path())),
        Arc::new(MetricHistory::in_memory(config.history.clone())),
        Arc::new(config.portfolio.clone()),
        EngineSettings::from_config(&config),
    );

    let position: Position = serde_json::from_value(serde_json::json!({
        "symbol": "BTCUSDT",
        "order_id": "7f1b3c1e-1a2b-4c3d-8e9f-0a1b2c3d4e5f",
        "entry_price": "100",
        "quantity": "0.5",
        "entry_time": (now - Duration::hours(12)).to_rfc3339(),
        "stop_loss": "92",
        "take_profit": "115",
        "strategy": "manual"
    }))
    .unwrap();

    let rec = engine.evaluate(&position.symbol, &position, dec!(90)).await;
    assert_eq!(rec.decision, Decision::TrendReversal);

    // Unknown symbol degrades to a price-only verdict
    let mut other = position.clone();
    other.symbol = "SOLUSDT".to_string();
    let rec = engine.evaluate(&other.symbol, &other, dec!(101)).await;
    assert_eq!(rec.decision, Decision::Hold);
}
