//! Historical metric store
//!
//! Bounded, expiring per-symbol series of RSI, volatility and price samples.

mod backend;
mod store;
mod types;

pub use backend::{InMemoryBackend, MetricBackend};
pub use store::{MetricHistory, MIN_PERCENTILE_SAMPLES, NEUTRAL_PERCENTILE};
pub use types::{HistoryError, Metric, Retention, Sample, SeriesKey};
