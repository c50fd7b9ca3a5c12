//! Decision engine scenarios against in-memory market data

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use smart_loss::config::{HistoryConfig, PortfolioConfig};
use smart_loss::engine::{
    evaluate_rules, Decision, EngineSettings, MarketContext, SmartLossManager, TrendDirection,
    TrendState, Urgency,
};
use smart_loss::history::{Metric, MetricHistory};
use smart_loss::indicators::{bollinger_bands, ema, rsi, sma};
use smart_loss::market::{Candle, CandleInterval, InMemoryMarketData};
use smart_loss::risk::Position;
use std::sync::Arc;
use uuid::Uuid;

fn candles(closes: &[f64], step_minutes: i64, volume_last: f64, end: DateTime<Utc>) -> Vec<Candle> {
    let n = closes.len() as i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            open_time: end - Duration::minutes(step_minutes * (n - i as i64)),
            open: close,
            high: close * 1.002,
            low: close * 0.998,
            close,
            volume: if i as i64 == n - 1 { volume_last } else { 100.0 },
        })
        .collect()
}

fn position(entry_time: DateTime<Utc>) -> Position {
    Position {
        symbol: "BTCUSDT".to_string(),
        order_id: Uuid::new_v4(),
        entry_price: dec!(100),
        quantity: dec!(1),
        entry_time,
        stop_loss: dec!(92),
        take_profit: dec!(115),
        strategy: "test".to_string(),
        signals: Vec::new(),
        current_price: None,
        unrealized_pnl: dec!(0),
        entry_fees: dec!(0),
    }
}

fn engine(market: InMemoryMarketData) -> SmartLossManager {
    SmartLossManager::new(
        Arc::new(market),
        Arc::new(MetricHistory::in_memory(HistoryConfig::default())),
        Arc::new(PortfolioConfig::default()),
        EngineSettings::default(),
    )
}

/// A steady slide from 109.8 to 90 on both intervals
fn declining_market(now: DateTime<Utc>) -> InMemoryMarketData {
    let market = InMemoryMarketData::new();
    let closes: Vec<f64> = (0..100).map(|i| 109.8 - 0.2 * i as f64).collect();
    market.insert(
        "BTCUSDT",
        CandleInterval::FifteenMinutes,
        candles(&closes, 15, 150.0, now),
    );
    let hourly: Vec<f64> = (0..50).map(|i| 129.2 - 0.8 * i as f64).collect();
    market.insert("BTCUSDT", CandleInterval::OneHour, candles(&hourly, 60, 100.0, now));
    market
}

#[tokio::test]
async fn test_stop_loss_scenario() {
    let now = Utc::now();
    let engine = engine(InMemoryMarketData::new());
    let rec = engine
        .evaluate_at("BTCUSDT", &position(now - Duration::hours(1)), dec!(90), now)
        .await;

    assert_eq!(rec.decision, Decision::StopLoss);
    assert_eq!(rec.confidence, 1.0);
    assert_eq!(rec.urgency(), Urgency::High);
}

#[tokio::test]
async fn test_sustained_decline_is_trend_reversal_before_stop_loss() {
    let now = Utc::now();
    let engine = engine(declining_market(now));
    let rec = engine
        .evaluate_at("BTCUSDT", &position(now - Duration::hours(30)), dec!(90), now)
        .await;

    assert_eq!(rec.decision, Decision::TrendReversal);
    assert!(rec.confidence > 0.6);
    assert_eq!(rec.urgency(), Urgency::Medium);
    assert!(rec.details.iter().any(|d| d.contains("below SMA20")));

    let trend = engine.cached_trend("BTCUSDT", now).unwrap();
    assert_eq!(trend.direction, TrendDirection::StrongDown);
}

#[tokio::test]
async fn test_degraded_data_still_returns_verdict() {
    let now = Utc::now();
    let market = InMemoryMarketData::new();
    market.insert("BTCUSDT", CandleInterval::FifteenMinutes, Vec::new());
    let engine = engine(market);

    let rec = engine
        .evaluate_at("BTCUSDT", &position(now - Duration::hours(1)), dec!(100), now)
        .await;
    assert_eq!(rec.decision, Decision::Hold);
    assert_eq!(rec.confidence, 0.5);
}

#[tokio::test]
async fn test_rsi_history_accumulates_across_evaluations() {
    let now = Utc::now();
    let market = declining_market(now);
    let engine = engine(market);
    let pos = position(now - Duration::hours(1));

    for i in 0..3 {
        engine
            .evaluate_at("BTCUSDT", &pos, dec!(98), now + Duration::minutes(i))
            .await;
    }
    let samples = engine
        .history()
        .history_at("BTCUSDT", Metric::Rsi, 10, now + Duration::minutes(3));
    assert_eq!(samples.len(), 3);
    assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn test_shallow_and_deep_loss_thresholds() {
    let now = Utc::now();
    let config = PortfolioConfig {
        stop_loss_percentage: dec!(20),
        ..Default::default()
    };
    let mut pos = position(now - Duration::hours(1));
    pos.stop_loss = dec!(80);

    let mut shallow = MarketContext::neutral(98.0, -0.02);
    shallow.trend = TrendState::new(TrendDirection::Down, 0.5);
    let rec = evaluate_rules(&shallow, &pos, &config, dec!(98), now);
    assert_eq!(rec.decision, Decision::Hold);

    let mut deep = MarketContext::neutral(90.0, -0.10);
    deep.trend = TrendState::new(TrendDirection::Down, 0.6);
    deep.snapshot.sma20 = 94.0;
    deep.snapshot.sma50 = 96.0;
    deep.snapshot.volume = 130.0;
    deep.snapshot.volume_ma = 100.0;
    let rec = evaluate_rules(&deep, &pos, &config, dec!(90), now);
    assert_eq!(rec.decision, Decision::TrendReversal);
    assert!(rec.confidence > 0.6);
}

#[test]
fn test_ema_seeded_with_first_value() {
    let k: f64 = 2.0 / 3.0;
    let mut expected = 10.0;
    for value in [20.0, 30.0] {
        expected = value * k + expected * (1.0 - k);
    }
    assert_eq!(ema(&[10.0, 20.0, 30.0], 2), expected);
    assert!((expected - 230.0 / 9.0).abs() < 1e-9);
}

#[test]
fn test_short_inputs_are_finite() {
    let values = [101.0, 99.5];
    assert!(rsi(&values, 14).is_finite());
    assert!(sma(&values, 20).is_finite());
    assert!(ema(&values, 26).is_finite());
    let bands = bollinger_bands(&values, 20, 2.0);
    assert!(bands.upper.is_finite() && bands.lower.is_finite());
    assert!(rsi(&[], 14).is_finite());
}

#[test]
fn test_history_round_trip_bounded() {
    let history = MetricHistory::in_memory(HistoryConfig {
        capacity: 5,
        ..Default::default()
    });
    let now = Utc::now();
    let values = [51.25, 49.875, 47.5, 46.125, 44.0, 42.75, 41.5];
    for (i, v) in values.iter().enumerate() {
        history.record("ETHUSDT", Metric::Rsi, *v, now + Duration::seconds(i as i64));
    }

    let samples = history.history_at("ETHUSDT", Metric::Rsi, 10, now + Duration::seconds(10));
    let read: Vec<f64> = samples.iter().map(|s| s.value).collect();
    assert_eq!(read, values[2..].to_vec());
}
