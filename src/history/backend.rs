//! Storage backends for historical metric series

use super::types::{HistoryError, Retention, Sample, SeriesKey};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;

/// Storage for bounded, expiring metric series.
///
/// Series are stored newest first. Implementations may fail; callers in
/// this crate go through [`super::MetricHistory`], which never propagates.
pub trait MetricBackend: Send + Sync {
    /// Insert at the head, truncate to capacity and refresh expiry
    fn push(&self, key: &SeriesKey, sample: Sample, retention: Retention)
        -> Result<(), HistoryError>;

    /// Up to `count` samples, newest first; expired series read as empty
    fn read(
        &self,
        key: &SeriesKey,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sample>, HistoryError>;

    /// Drop expired series, returning how many were removed
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, HistoryError>;
}

#[derive(Debug)]
struct Series {
    samples: VecDeque<Sample>,
    expires_at: DateTime<Utc>,
}

/// In-process backend. Each key locks independently, so writers for
/// different symbols never contend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    series: DashMap<SeriesKey, Series>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}

impl MetricBackend for InMemoryBackend {
    fn push(
        &self,
        key: &SeriesKey,
        sample: Sample,
        retention: Retention,
    ) -> Result<(), HistoryError> {
        let expires_at = sample.timestamp + retention.ttl;
        let mut entry = self.series.entry(key.clone()).or_insert_with(|| Series {
            samples: VecDeque::with_capacity(retention.capacity),
            expires_at,
        });

        // A series that lapsed before this write starts over
        if entry.expires_at < sample.timestamp {
            entry.samples.clear();
        }
        entry.samples.push_front(sample);
        entry.samples.truncate(retention.capacity);
        entry.expires_at = expires_at;
        Ok(())
    }

    fn read(
        &self,
        key: &SeriesKey,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sample>, HistoryError> {
        let Some(entry) = self.series.get(key) else {
            return Ok(Vec::new());
        };
        if entry.expires_at < now {
            return Ok(Vec::new());
        }
        Ok(entry.samples.iter().take(count).copied().collect())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, HistoryError> {
        let before = self.series.len();
        self.series.retain(|_, series| series.expires_at >= now);
        Ok(before - self.series.len())
    }
}
