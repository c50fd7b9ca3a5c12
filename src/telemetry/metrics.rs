//! Prometheus metrics

use std::time::Duration;

use crate::engine::Decision;
use crate::risk::RiskBudget;
use rust_decimal::prelude::ToPrimitive;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full evaluation of one position
    Evaluation,
    /// Candle fetch from the market data provider
    MarketData,
    /// Order submission through the execution engine
    OrderSubmission,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    RealizedLoss,
    UnrealizedLoss,
    TotalRisk,
    RemainingRiskBudget,
    TotalExposure,
    OpenPositions,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Evaluation => "smartloss_evaluation_latency_ms",
        LatencyMetric::MarketData => "smartloss_market_data_latency_ms",
        LatencyMetric::OrderSubmission => "smartloss_order_submission_latency_ms",
    };
    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::RealizedLoss => "smartloss_realized_loss_usd",
        GaugeMetric::UnrealizedLoss => "smartloss_unrealized_loss_usd",
        GaugeMetric::TotalRisk => "smartloss_total_risk_usd",
        GaugeMetric::RemainingRiskBudget => "smartloss_remaining_risk_budget_usd",
        GaugeMetric::TotalExposure => "smartloss_total_exposure_usd",
        GaugeMetric::OpenPositions => "smartloss_open_positions",
    };
    metrics::gauge!(metric_name).set(value);
}

/// Count one recommendation by its reason tag
pub fn record_recommendation(decision: Decision) {
    metrics::counter!("smartloss_recommendations_total", "reason" => decision.as_str())
        .increment(1);
}

/// Count a degraded market data fetch
pub fn record_market_data_failure(interval: &'static str) {
    metrics::counter!("smartloss_market_data_failures_total", "interval" => interval).increment(1);
}

/// Count an order by outcome
pub fn record_order(outcome: &'static str) {
    metrics::counter!("smartloss_orders_total", "outcome" => outcome).increment(1);
}

/// Publish every risk budget gauge
pub fn record_budget(budget: &RiskBudget, open_positions: usize) {
    let as_f64 = |d: rust_decimal::Decimal| d.to_f64().unwrap_or_default();
    set_gauge(GaugeMetric::RealizedLoss, as_f64(budget.realized_loss));
    set_gauge(GaugeMetric::UnrealizedLoss, as_f64(budget.unrealized_loss));
    set_gauge(GaugeMetric::TotalRisk, as_f64(budget.total_risk));
    set_gauge(GaugeMetric::RemainingRiskBudget, as_f64(budget.remaining()));
    set_gauge(GaugeMetric::TotalExposure, as_f64(budget.total_exposure));
    set_gauge(GaugeMetric::OpenPositions, open_positions as f64);
}
