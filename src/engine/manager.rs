//! SmartLossManager: per-position evaluation against live market data
//!
//! Gathers candles on the decision and confirmation intervals, runs the
//! analyses, keeps the metric history current and hands a [`MarketContext`]
//! to the rule cascade. Nothing in here fails: missing or late data turns
//! into neutral analyses and the cascade still returns a verdict.

use super::analysis::{analyze_momentum, analyze_trend, analyze_volatility, hourly_change};
use super::rules::{evaluate_rules, MarketContext};
use super::types::{Recommendation, TrendState, VolatilityState};
use crate::cache::TtlCache;
use crate::config::{CacheConfig, Config, MarketConfig, PortfolioConfig};
use crate::history::{Metric, MetricHistory};
use crate::indicators::{classify_volume, IndicatorSnapshot};
use crate::market::{fetch_candles, Candle, CandleInterval, MarketDataProvider};
use crate::risk::Position;
use crate::telemetry::{self, LatencyMetric};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Consecutive stored RSI samples inspected for sustained weakness
pub const RSI_WEAKENING_PERIODS: usize = 3;

/// Market data and cache settings for the engine
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub market: MarketConfig,
    pub cache: CacheConfig,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            market: config.market.clone(),
            cache: config.cache.clone(),
        }
    }
}

/// Analysis result tied to the candle it was computed from
#[derive(Debug, Clone, Copy)]
struct Stamped<T> {
    as_of: DateTime<Utc>,
    value: T,
}

/// Decision engine for open positions
pub struct SmartLossManager {
    market: Arc<dyn MarketDataProvider>,
    history: Arc<MetricHistory>,
    config: RwLock<Arc<PortfolioConfig>>,
    settings: EngineSettings,
    trend_cache: TtlCache<Stamped<TrendState>>,
    volatility_cache: TtlCache<Stamped<VolatilityState>>,
}

impl SmartLossManager {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        history: Arc<MetricHistory>,
        config: Arc<PortfolioConfig>,
        settings: EngineSettings,
    ) -> Self {
        let ttl = chrono::Duration::seconds(settings.cache.ttl_secs as i64);
        let max_entries = settings.cache.max_entries;
        Self {
            market,
            history,
            config: RwLock::new(config),
            settings,
            trend_cache: TtlCache::new(ttl, max_entries),
            volatility_cache: TtlCache::new(ttl, max_entries),
        }
    }

    /// Current configuration snapshot
    pub async fn config(&self) -> Arc<PortfolioConfig> {
        Arc::clone(&*self.config.read().await)
    }

    /// Swap in a new validated configuration; in-flight evaluations keep
    /// the snapshot they started with
    pub async fn set_config(&self, config: Arc<PortfolioConfig>) {
        *self.config.write().await = config;
    }

    pub fn history(&self) -> &Arc<MetricHistory> {
        &self.history
    }

    /// Last trend computed for `symbol`, if still fresh
    pub fn cached_trend(&self, symbol: &str, now: DateTime<Utc>) -> Option<TrendState> {
        self.trend_cache.get(symbol, now).map(|c| c.value.value)
    }

    /// Last volatility computed for `symbol`, if still fresh
    pub fn cached_volatility(&self, symbol: &str, now: DateTime<Utc>) -> Option<VolatilityState> {
        self.volatility_cache.get(symbol, now).map(|c| c.value.value)
    }

    /// Evaluate a position at the current time
    pub async fn evaluate(
        &self,
        symbol: &str,
        position: &Position,
        current_price: Decimal,
    ) -> Recommendation {
        self.evaluate_at(symbol, position, current_price, Utc::now())
            .await
    }

    /// Evaluate a position as of `now`
    pub async fn evaluate_at(
        &self,
        symbol: &str,
        position: &Position,
        current_price: Decimal,
        now: DateTime<Utc>,
    ) -> Recommendation {
        let started = Instant::now();
        let config = self.config().await;
        let market = &self.settings.market;

        let (candles, hourly) = tokio::join!(
            self.fetch(symbol, market.candle_interval, market.candle_limit),
            self.fetch(symbol, market.confirmation_interval, market.confirmation_limit),
        );

        let ctx = self.build_context(symbol, position, current_price, candles, hourly, now);
        let recommendation = evaluate_rules(&ctx, position, &config, current_price, now);

        if recommendation.is_sell() {
            info!(
                symbol,
                reason = %recommendation.decision,
                confidence = recommendation.confidence,
                urgency = ?recommendation.urgency(),
                pnl = ctx.pnl,
                "Sell recommended"
            );
        } else {
            debug!(
                symbol,
                confidence = recommendation.confidence,
                trend = ctx.trend.direction.as_str(),
                pnl = ctx.pnl,
                "Hold"
            );
        }
        for detail in &recommendation.details {
            debug!(symbol, reason = %recommendation.decision, detail = %detail, "Evidence");
        }

        telemetry::record_recommendation(recommendation.decision);
        telemetry::record_latency(LatencyMetric::Evaluation, started.elapsed());
        recommendation
    }

    /// Candles for one interval, or `None` when the fetch failed, timed out
    /// or returned nothing
    async fn fetch(&self, symbol: &str, interval: CandleInterval, limit: usize) -> Option<Vec<Candle>> {
        let started = Instant::now();
        let result = fetch_candles(
            self.market.as_ref(),
            symbol,
            interval,
            limit,
            self.settings.market.fetch_timeout(),
        )
        .await;
        telemetry::record_latency(LatencyMetric::MarketData, started.elapsed());

        match result {
            Ok(candles) if !candles.is_empty() => Some(candles),
            Ok(_) => {
                warn!(symbol, %interval, "No candles returned, using neutral analysis");
                telemetry::record_market_data_failure(interval.as_str());
                None
            }
            Err(e) => {
                warn!(symbol, %interval, error = %e, "Candle fetch failed, using neutral analysis");
                telemetry::record_market_data_failure(interval.as_str());
                None
            }
        }
    }

    fn build_context(
        &self,
        symbol: &str,
        position: &Position,
        current_price: Decimal,
        candles: Option<Vec<Candle>>,
        hourly: Option<Vec<Candle>>,
        now: DateTime<Utc>,
    ) -> MarketContext {
        let price = current_price.to_f64().unwrap_or_default();
        let pnl = position
            .pnl_fraction(current_price)
            .to_f64()
            .unwrap_or_default();
        let mut ctx = MarketContext::neutral(price, pnl);

        self.history.record(symbol, Metric::Price, price, now);

        if let Some(candles) = candles.as_deref() {
            let snapshot = IndicatorSnapshot::from_candles(candles);
            let previous_rsi = self
                .history
                .history_at(symbol, Metric::Rsi, 1, now)
                .pop()
                .map(|s| s.value);
            self.history.record(symbol, Metric::Rsi, snapshot.rsi, now);

            ctx.momentum = analyze_momentum(&snapshot, previous_rsi);
            ctx.trend = self.trend(symbol, candles, now);
            ctx.volatility = self.volatility(symbol, candles, now);
            ctx.rsi_weakening =
                self.history
                    .is_weakening_at(symbol, Metric::Rsi, RSI_WEAKENING_PERIODS, now);
            ctx.volume_signal = classify_volume(candles);
            ctx.snapshot = snapshot;
        }

        if let Some(hourly) = hourly.as_deref() {
            ctx.hourly_change = hourly_change(hourly);
            ctx.hourly_trend = analyze_trend(hourly);
        }

        ctx
    }

    fn trend(&self, symbol: &str, candles: &[Candle], now: DateTime<Utc>) -> TrendState {
        let as_of = candles.last().map(|c| c.open_time).unwrap_or(now);
        if let Some(cached) = self.trend_cache.get(symbol, now) {
            if cached.value.as_of == as_of {
                return cached.value.value;
            }
        }
        let trend = analyze_trend(candles);
        self.trend_cache
            .insert(symbol, Stamped { as_of, value: trend }, now);
        trend
    }

    fn volatility(&self, symbol: &str, candles: &[Candle], now: DateTime<Utc>) -> VolatilityState {
        let as_of = candles.last().map(|c| c.open_time).unwrap_or(now);
        if let Some(cached) = self.volatility_cache.get(symbol, now) {
            if cached.value.as_of == as_of {
                return cached.value.value;
            }
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let mut volatility = analyze_volatility(&closes, self.settings.market.candle_interval);
        volatility.percentile =
            self.history
                .percentile_rank_at(symbol, Metric::Volatility, volatility.current, now);
        self.history
            .record(symbol, Metric::Volatility, volatility.current, now);

        self.volatility_cache
            .insert(symbol, Stamped { as_of, value: volatility }, now);
        volatility
    }
}
