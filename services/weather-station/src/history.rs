//! Throttled reading history
//!
//! The history has exactly one writer, owned by the sampler, and any number of
//! cloneable readers. Readers capture the length once under a read lock and
//! copy only the suffix a query needs, then aggregate outside the lock.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::downsample::{downsample, QueryParams};
use crate::reading::{Bucket, Reading};

#[derive(Debug)]
struct Inner {
    readings: RwLock<VecDeque<Reading>>,
    max_readings: Option<usize>,
}

/// Create a history, returning its single writer and a reader handle
///
/// `max_readings = None` never evicts.
pub fn new_history(max_readings: Option<usize>) -> (HistoryWriter, HistoryReader) {
    let inner = Arc::new(Inner {
        readings: RwLock::new(VecDeque::new()),
        max_readings,
    });
    (
        HistoryWriter {
            inner: Arc::clone(&inner),
        },
        HistoryReader { inner },
    )
}

/// Append handle; deliberately not `Clone`
#[derive(Debug)]
pub struct HistoryWriter {
    inner: Arc<Inner>,
}

impl HistoryWriter {
    /// Append a reading, returning false if it would break time ordering
    pub async fn append(&mut self, reading: Reading) -> bool {
        let mut readings = self.inner.readings.write().await;

        if let Some(last) = readings.back() {
            if reading.time < last.time {
                warn!(
                    "Dropping reading at {} older than newest history entry at {}",
                    reading.time, last.time
                );
                return false;
            }
        }

        readings.push_back(reading);
        if let Some(max) = self.inner.max_readings {
            while readings.len() > max {
                readings.pop_front();
            }
        }
        debug!("History now holds {} readings", readings.len());
        true
    }

    /// Time of the newest entry, `None` while empty
    pub async fn newest_time(&self) -> Option<i64> {
        self.inner.readings.read().await.back().map(|r| r.time)
    }

    /// A reader over the same history
    pub fn reader(&self) -> HistoryReader {
        HistoryReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only handle for queries
#[derive(Debug, Clone)]
pub struct HistoryReader {
    inner: Arc<Inner>,
}

impl HistoryReader {
    /// Number of recorded readings
    pub async fn len(&self) -> usize {
        self.inner.readings.read().await.len()
    }

    /// Whether nothing has been recorded yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Copy of the newest `count` readings, oldest first
    pub async fn tail(&self, count: usize) -> Vec<Reading> {
        let readings = self.inner.readings.read().await;
        let n = readings.len();
        readings.range(n - count.min(n)..).copied().collect()
    }

    /// Run a down-sampling query over the current history
    pub async fn query(&self, params: QueryParams) -> Vec<Bucket> {
        // The engine never looks further back than the requested span
        let snapshot = self.tail(params.requested()).await;
        downsample(&snapshot, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(time: i64, temperature: f64) -> Reading {
        Reading {
            time,
            temperature,
            pressure: 1000.0,
            humidity: None,
            board_temperature: None,
        }
    }

    #[tokio::test]
    async fn append_and_tail() {
        let (mut writer, reader) = new_history(None);
        assert!(reader.is_empty().await);

        for i in 0..5 {
            assert!(writer.append(reading(i * 30, i as f64)).await);
        }

        assert_eq!(reader.len().await, 5);
        let tail = reader.tail(2).await;
        assert_eq!(tail, vec![reading(90, 3.0), reading(120, 4.0)]);
        assert_eq!(reader.tail(100).await.len(), 5);
        assert!(reader.tail(0).await.is_empty());
    }

    #[tokio::test]
    async fn rejects_out_of_order_reading() {
        let (mut writer, reader) = new_history(None);
        assert!(writer.append(reading(60, 1.0)).await);
        assert!(!writer.append(reading(30, 2.0)).await);
        assert!(writer.append(reading(60, 3.0)).await);
        assert_eq!(reader.len().await, 2);
    }

    #[tokio::test]
    async fn retention_cap_evicts_oldest() {
        let (mut writer, reader) = new_history(Some(3));
        for i in 0..5 {
            writer.append(reading(i, i as f64)).await;
        }
        let all = reader.tail(usize::MAX).await;
        assert_eq!(all.iter().map(|r| r.time).collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn query_over_suffix_matches_full_history() {
        let (mut writer, reader) = new_history(None);
        let mut all = Vec::new();
        for i in 0..23 {
            let r = reading(i * 30, (i * i % 7) as f64);
            all.push(r);
            writer.append(r).await;
        }

        for (count, width) in [(1, 1), (2, 2), (3, 5), (4, 6), (300, 1), (10, 30)] {
            let params = QueryParams::new(count, width).unwrap();
            assert_eq!(
                reader.query(params).await,
                downsample(&all, params),
                "count={count} width={width}"
            );
        }
    }

    #[tokio::test]
    async fn repeated_query_returns_same_buckets() {
        let (mut writer, reader) = new_history(None);
        for i in 0..17 {
            writer.append(reading(i * 30, (i % 5) as f64)).await;
        }

        let params = QueryParams::new(4, 3).unwrap();
        let first = reader.query(params).await;
        let second = reader.query(params).await;
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        assert_eq!(reader.len().await, 17);
    }

    #[tokio::test]
    async fn newest_time_tracks_last_append() {
        let (mut writer, _reader) = new_history(None);
        assert_eq!(writer.newest_time().await, None);
        writer.append(reading(30, 1.0)).await;
        writer.append(reading(60, 2.0)).await;
        assert_eq!(writer.newest_time().await, Some(60));
    }

    #[tokio::test]
    async fn writer_hands_out_readers() {
        let (mut writer, _) = new_history(None);
        let reader = writer.reader();
        writer.append(reading(1, 1.0)).await;
        assert_eq!(reader.len().await, 1);
    }
}
