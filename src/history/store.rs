//! Infallible facade over a metric backend
//!
//! Remembers recent scalar values per symbol so the decision engine can see
//! the direction a metric is moving in, not just its latest value. Backend
//! failures are logged here and replaced with empty history or a neutral
//! percentile; nothing propagates to the caller.

use super::backend::{InMemoryBackend, MetricBackend};
use super::types::{Metric, Sample, SeriesKey};
use crate::config::HistoryConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

/// Percentile reported while a series is too short to rank against
pub const NEUTRAL_PERCENTILE: f64 = 0.5;

/// Samples required before a percentile rank is trusted
pub const MIN_PERCENTILE_SAMPLES: usize = 10;

/// Historical metric store
#[derive(Clone)]
pub struct MetricHistory {
    backend: Arc<dyn MetricBackend>,
    config: HistoryConfig,
}

impl MetricHistory {
    pub fn new(backend: Arc<dyn MetricBackend>, config: HistoryConfig) -> Self {
        Self { backend, config }
    }

    /// Store backed by the in-process [`InMemoryBackend`]
    pub fn in_memory(config: HistoryConfig) -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), config)
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Record a value at the head of the symbol's series
    pub fn record(&self, symbol: &str, metric: Metric, value: f64, timestamp: DateTime<Utc>) {
        if !value.is_finite() {
            warn!(symbol, %metric, value, "Skipping non-finite metric sample");
            return;
        }

        let key = SeriesKey::new(symbol, metric);
        let sample = Sample { value, timestamp };
        if let Err(e) = self
            .backend
            .push(&key, sample, self.config.retention(metric))
        {
            warn!(symbol, %metric, error = %e, "Failed to record metric sample");
        }
    }

    /// The most recent `count` samples in chronological order
    pub fn history(&self, symbol: &str, metric: Metric, count: usize) -> Vec<Sample> {
        self.history_at(symbol, metric, count, Utc::now())
    }

    /// As [`Self::history`], with expiry judged against `now`
    pub fn history_at(
        &self,
        symbol: &str,
        metric: Metric,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Sample> {
        let key = SeriesKey::new(symbol, metric);
        match self.backend.read(&key, count, now) {
            Ok(mut samples) => {
                samples.reverse();
                samples
            }
            Err(e) => {
                warn!(symbol, %metric, error = %e, "Failed to read metric history");
                Vec::new()
            }
        }
    }

    /// Most recent sample, if any
    pub fn latest(&self, symbol: &str, metric: Metric) -> Option<Sample> {
        self.history(symbol, metric, 1).pop()
    }

    /// True when the last `periods` samples fall strictly at every step and
    /// the overall drop is significant for the metric.
    pub fn is_weakening(&self, symbol: &str, metric: Metric, periods: usize) -> bool {
        self.is_weakening_at(symbol, metric, periods, Utc::now())
    }

    /// As [`Self::is_weakening`], with expiry judged against `now`
    pub fn is_weakening_at(
        &self,
        symbol: &str,
        metric: Metric,
        periods: usize,
        now: DateTime<Utc>,
    ) -> bool {
        if periods < 2 {
            return false;
        }
        let samples = self.history_at(symbol, metric, periods, now);
        if samples.len() < periods {
            return false;
        }

        let strictly_falling = samples.windows(2).all(|w| w[1].value < w[0].value);
        let first = samples[0].value;
        let last = samples[samples.len() - 1].value;
        strictly_falling && metric.is_significant_decline(first, last)
    }

    /// Fraction of stored samples at or below `value`.
    ///
    /// Neutral (0.5) until the series holds [`MIN_PERCENTILE_SAMPLES`].
    pub fn percentile_rank(&self, symbol: &str, metric: Metric, value: f64) -> f64 {
        self.percentile_rank_at(symbol, metric, value, Utc::now())
    }

    pub fn percentile_rank_at(
        &self,
        symbol: &str,
        metric: Metric,
        value: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        let samples = self.history_at(symbol, metric, self.config.capacity, now);
        if samples.len() < MIN_PERCENTILE_SAMPLES {
            return NEUTRAL_PERCENTILE;
        }
        let at_or_below = samples.iter().filter(|s| s.value <= value).count();
        at_or_below as f64 / samples.len() as f64
    }

    /// Evict expired series, returning how many were dropped
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        match self.backend.purge_expired(now) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "Failed to purge expired metric history");
                0
            }
        }
    }
}

impl std::fmt::Debug for MetricHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricHistory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
