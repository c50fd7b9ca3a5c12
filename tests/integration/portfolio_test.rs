//! Portfolio cycles: entry admission, urgency-driven exits and risk accounting

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smart_loss::config::{ExecutionConfig, HistoryConfig, PortfolioConfig};
use smart_loss::engine::{Decision, EngineSettings, SmartLossManager};
use async_trait::async_trait;
use smart_loss::execution::{
    ExecutionEngine, ExecutionError, Fill, Order, OrderId, OrderSide, OrderType, PaperEngine,
};
use smart_loss::history::MetricHistory;
use smart_loss::market::{Candle, CandleInterval, InMemoryMarketData};
use smart_loss::portfolio::{PortfolioError, PortfolioManager};
use smart_loss::risk::{Position, RiskError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

struct Harness {
    manager: PortfolioManager,
    paper: Arc<PaperEngine>,
}

fn harness(market: InMemoryMarketData, config: PortfolioConfig) -> Harness {
    let engine = Arc::new(SmartLossManager::new(
        Arc::new(market),
        Arc::new(MetricHistory::in_memory(HistoryConfig::default())),
        Arc::new(config),
        EngineSettings::default(),
    ));
    let paper = Arc::new(PaperEngine::new(dec!(0.001)));
    let executor: Arc<dyn ExecutionEngine> = paper.clone();
    Harness {
        manager: PortfolioManager::new(engine, executor, ExecutionConfig::default()),
        paper,
    }
}

/// Holds every submission until released
struct GatedEngine {
    inner: PaperEngine,
    submitted: Notify,
    release: Notify,
}

#[async_trait]
impl ExecutionEngine for GatedEngine {
    async fn submit_order(&self, order: &Order) -> Result<Fill, ExecutionError> {
        self.submitted.notify_one();
        self.release.notified().await;
        self.inner.submit_order(order).await
    }

    async fn cancel_order(&self, id: OrderId) -> Result<(), ExecutionError> {
        self.inner.cancel_order(id).await
    }

    async fn get_fills(&self) -> Vec<Fill> {
        self.inner.get_fills().await
    }
}

fn prices(entries: &[(&str, Decimal)]) -> HashMap<String, Decimal> {
    entries
        .iter()
        .map(|(s, p)| (s.to_string(), *p))
        .collect()
}

fn position(symbol: &str, quantity: Decimal, stop_loss: Decimal) -> Position {
    Position {
        symbol: symbol.to_string(),
        order_id: Uuid::new_v4(),
        entry_price: dec!(100),
        quantity,
        entry_time: Utc::now() - Duration::hours(5),
        stop_loss,
        take_profit: dec!(115),
        strategy: "manual".to_string(),
        signals: Vec::new(),
        current_price: None,
        unrealized_pnl: dec!(0),
        entry_fees: dec!(0),
    }
}

fn declining_market(now: DateTime<Utc>) -> InMemoryMarketData {
    let build = |closes: Vec<f64>, step: i64| -> Vec<Candle> {
        let n = closes.len() as i64;
        closes
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
            .collect()
    };
    let market = InMemoryMarketData::new();
    market.insert(
        "BTCUSDT",
        CandleInterval::FifteenMinutes,
        build((0..100).map(|i| 109.8 - 0.2 * i as f64).collect(), 15),
    );
    market.insert(
        "BTCUSDT",
        CandleInterval::OneHour,
        build((0..50).map(|i| 129.2 - 0.8 * i as f64).collect(), 60),
    );
    market
}

#[tokio::test]
async fn test_open_then_stop_out() {
    let h = harness(InMemoryMarketData::new(), PortfolioConfig::default());

    let opened = h
        .manager
        .try_open("BTCUSDT", dec!(100), 0.02, 0.55)
        .await
        .unwrap();
    // 800 available over 5 symbols
    assert_eq!(opened.quantity, dec!(1.6));
    assert_eq!(opened.stop_loss, dec!(92));
    assert_eq!(opened.take_profit, dec!(115));

    let duplicate = h.manager.try_open("BTCUSDT", dec!(100), 0.02, 0.55).await;
    assert!(matches!(
        duplicate,
        Err(PortfolioError::Risk(RiskError::DuplicatePosition(_)))
    ));

    let report = h.manager.run_cycle(&prices(&[("BTCUSDT", dec!(90))])).await;
    assert_eq!(report.closed.len(), 1);
    let closed = &report.closed[0];
    assert_eq!(closed.decision, Decision::StopLoss);
    // (90 - 100) * 1.6 less 0.16 entry and 0.144 exit fees
    assert_eq!(closed.realized_pnl, dec!(-16.304));

    assert!(h.manager.positions().await.is_empty());
    assert_eq!(report.budget.realized_loss, dec!(16.304));
    assert_eq!(report.budget.total_risk, dec!(16.304));

    let fills = h.paper.get_fills().await;
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[1].side, OrderSide::Sell);
    assert_eq!(fills[1].order_type, OrderType::Market);
}

#[tokio::test]
async fn test_trend_reversal_sells_with_limit_order() {
    let now = Utc::now();
    let h = harness(declining_market(now), PortfolioConfig::default());
    h.manager
        .adopt(position("BTCUSDT", dec!(1), dec!(80)))
        .await
        .unwrap();

    let report = h
        .manager
        .run_cycle_at(&prices(&[("BTCUSDT", dec!(90))]), now)
        .await;
    assert_eq!(report.closed.len(), 1);
    assert_eq!(report.closed[0].decision, Decision::TrendReversal);
    // Limit 0.1% above the current price
    assert_eq!(report.closed[0].exit_price, dec!(90.09));

    let fills = h.paper.get_fills().await;
    assert_eq!(fills[0].order_type, OrderType::Limit);
}

#[tokio::test]
async fn test_take_profit_uses_limit() {
    let h = harness(InMemoryMarketData::new(), PortfolioConfig::default());
    h.manager
        .adopt(position("ETHUSDT", dec!(1), dec!(92)))
        .await
        .unwrap();

    let report = h.manager.run_cycle(&prices(&[("ETHUSDT", dec!(116))])).await;
    assert_eq!(report.closed[0].decision, Decision::TakeProfit);
    assert_eq!(report.closed[0].exit_price, dec!(116.116));
    assert_eq!(report.budget.realized_loss, dec!(0));
}

#[tokio::test]
async fn test_hold_counts_weighted_unrealized_loss() {
    let h = harness(InMemoryMarketData::new(), PortfolioConfig::default());
    h.manager
        .adopt(position("BTCUSDT", dec!(2), dec!(92)))
        .await
        .unwrap();
    h.manager
        .adopt(position("ETHUSDT", dec!(1), dec!(92)))
        .await
        .unwrap();

    let report = h.manager.run_cycle(&prices(&[("BTCUSDT", dec!(95))])).await;
    assert_eq!(report.skipped, vec!["ETHUSDT".to_string()]);
    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(report.recommendations[0].1.decision, Decision::Hold);
    assert!(report.closed.is_empty());

    assert_eq!(report.budget.unrealized_loss, dec!(10));
    assert_eq!(report.budget.total_risk, dec!(5));
    // BTC marked at 95, ETH still at entry
    assert_eq!(report.budget.total_exposure, dec!(290));
}

#[tokio::test]
async fn test_failed_sell_keeps_position_open() {
    let h = harness(InMemoryMarketData::new(), PortfolioConfig::default());
    h.manager
        .adopt(position("BTCUSDT", dec!(1), dec!(92)))
        .await
        .unwrap();
    // Market order plus its single retry
    h.paper.reject_next(2);

    let report = h.manager.run_cycle(&prices(&[("BTCUSDT", dec!(90))])).await;
    assert!(report.closed.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.manager.positions().await.len(), 1);

    let report = h.manager.run_cycle(&prices(&[("BTCUSDT", dec!(90))])).await;
    assert_eq!(report.closed.len(), 1);
}

#[tokio::test]
async fn test_admission_limits() {
    let config = PortfolioConfig {
        max_active_symbols: 1,
        ..Default::default()
    };
    let h = harness(InMemoryMarketData::new(), config);
    h.manager
        .try_open("BTCUSDT", dec!(100), 0.02, 0.55)
        .await
        .unwrap();
    let refused = h.manager.try_open("ETHUSDT", dec!(100), 0.02, 0.55).await;
    assert!(matches!(
        refused,
        Err(PortfolioError::Risk(RiskError::MaxSymbolsReached(1)))
    ));

    let tight = PortfolioConfig {
        max_loss_percentage: dec!(1),
        ..Default::default()
    };
    let h = harness(InMemoryMarketData::new(), tight);
    // 160 * 8% = 12.8 against a 10 budget
    let refused = h.manager.try_open("BTCUSDT", dec!(100), 0.02, 0.55).await;
    assert!(matches!(
        refused,
        Err(PortfolioError::Risk(RiskError::LossBudgetExceeded { .. }))
    ));
}

#[tokio::test]
async fn test_concurrent_order_limit_counts_open_positions() {
    let config = PortfolioConfig {
        max_active_symbols: 10,
        max_concurrent_orders: 2,
        ..Default::default()
    };
    let h = harness(InMemoryMarketData::new(), config);
    h.manager
        .try_open("BTCUSDT", dec!(100), 0.02, 0.55)
        .await
        .unwrap();
    h.manager
        .try_open("ETHUSDT", dec!(100), 0.02, 0.55)
        .await
        .unwrap();

    let refused = h.manager.try_open("SOLUSDT", dec!(100), 0.02, 0.55).await;
    assert!(matches!(
        refused,
        Err(PortfolioError::Risk(RiskError::MaxOrdersReached(2)))
    ));
    assert_eq!(h.manager.positions().await.len(), 2);

    // Stopping one out frees a slot
    h.manager
        .run_cycle(&prices(&[("BTCUSDT", dec!(90)), ("ETHUSDT", dec!(100))]))
        .await;
    h.manager
        .try_open("SOLUSDT", dec!(100), 0.02, 0.55)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_entry_in_flight_does_not_block_readers() {
    let engine = Arc::new(SmartLossManager::new(
        Arc::new(InMemoryMarketData::new()),
        Arc::new(MetricHistory::in_memory(HistoryConfig::default())),
        Arc::new(PortfolioConfig::default()),
        EngineSettings::default(),
    ));
    let gated = Arc::new(GatedEngine {
        inner: PaperEngine::new(dec!(0.001)),
        submitted: Notify::new(),
        release: Notify::new(),
    });
    let executor: Arc<dyn ExecutionEngine> = gated.clone();
    let manager = Arc::new(PortfolioManager::new(
        engine,
        executor,
        ExecutionConfig::default(),
    ));

    let opening = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.try_open("BTCUSDT", dec!(100), 0.02, 0.55).await })
    };
    gated.submitted.notified().await;

    let positions = tokio::time::timeout(std::time::Duration::from_secs(1), manager.positions())
        .await
        .expect("state lock held across order submission");
    assert!(positions.is_empty());

    let duplicate = manager.try_open("BTCUSDT", dec!(100), 0.02, 0.55).await;
    assert!(matches!(
        duplicate,
        Err(PortfolioError::Risk(RiskError::DuplicatePosition(_)))
    ));

    gated.release.notify_one();
    let opened = opening.await.unwrap().unwrap();
    assert_eq!(opened.entry_fees, dec!(0.16));
    assert_eq!(manager.positions().await.len(), 1);
}
