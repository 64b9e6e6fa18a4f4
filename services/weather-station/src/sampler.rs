//! Sampler: periodic acquisition and throttled history ingestion

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::calibration::Calibration;
use crate::clock::Clock;
use crate::config::SamplerConfig;
use crate::history::HistoryWriter;
use crate::reading::Reading;
use crate::sensor::Sensor;
use crate::sink::{self, Sink};

/// Receiver side of the live reading; `None` until the first good sample
pub type CurrentReading = watch::Receiver<Option<Reading>>;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Acquisition failed; nothing changed
    Failed,
    /// Current reading updated, history untouched
    Sampled,
    /// Current reading updated and appended to history
    Recorded,
}

/// Admits at most one reading per history interval
///
/// The mark advances by exactly one interval per admitted reading rather than
/// snapping to the reading's time, so scheduling jitter does not accumulate
/// into drift. A reading is admitted once it is later than one second short
/// of the next mark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryThrottle {
    mark: f64,
    interval: f64,
}

impl HistoryThrottle {
    /// Throttle whose first slot opens one interval after `start`
    pub fn new(start: f64, interval: Duration) -> Self {
        Self {
            mark: start,
            interval: interval.as_secs_f64(),
        }
    }

    /// Admit `time` and advance the mark, or refuse it
    pub fn admit(&mut self, time: i64) -> bool {
        if time as f64 > self.mark + self.interval - 1.0 {
            self.mark += self.interval;
            true
        } else {
            false
        }
    }

    /// Current mark in epoch seconds
    pub fn mark(&self) -> f64 {
        self.mark
    }
}

/// Owns the sensor, the history append path and the live reading
pub struct Sampler {
    sensor: Arc<dyn Sensor>,
    calibration: Calibration,
    clock: Arc<dyn Clock>,
    history: HistoryWriter,
    current: watch::Sender<Option<Reading>>,
    sinks: Vec<Arc<dyn Sink>>,
    throttle: HistoryThrottle,
    tick_interval: Duration,
    sink_timeout: Duration,
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("calibration", &self.calibration)
            .field("throttle", &self.throttle)
            .field("tick_interval", &self.tick_interval)
            .field("sinks", &self.sinks)
            .finish_non_exhaustive()
    }
}

impl Sampler {
    /// Create a sampler; the throttle mark starts at the clock's current time
    pub fn new(
        config: &SamplerConfig,
        calibration: Calibration,
        sensor: Arc<dyn Sensor>,
        clock: Arc<dyn Clock>,
        history: HistoryWriter,
        sinks: Vec<Arc<dyn Sink>>,
    ) -> Self {
        let throttle = HistoryThrottle::new(
            clock.now(),
            Duration::from_secs(config.history_interval_seconds),
        );
        let (current, _) = watch::channel(None);

        Self {
            sensor,
            calibration,
            clock,
            history,
            current,
            sinks,
            throttle,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            sink_timeout: config.sink_timeout,
        }
    }

    /// Subscribe to the live reading
    pub fn current(&self) -> CurrentReading {
        self.current.subscribe()
    }

    /// Acquire one reading and record it if the throttle allows
    ///
    /// Sensor failures are absorbed: the tick is skipped and the previous
    /// state is kept.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();

        let raw = match tokio::time::timeout(self.tick_interval, self.sensor.measure()).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("Sensor read failed, skipping tick: {}", e);
                return TickOutcome::Failed;
            }
            Err(_) => {
                warn!(
                    "Sensor read took longer than {:?}, skipping tick",
                    self.tick_interval
                );
                return TickOutcome::Failed;
            }
        };

        let reading = Reading::from_measurement(now.floor() as i64, self.calibration.apply(raw));
        self.current.send_replace(Some(reading));

        // A reading behind the history must not consume a throttle slot
        if let Some(newest) = self.history.newest_time().await {
            if reading.time < newest {
                warn!(
                    "Clock is behind newest history entry ({} < {}), not recording",
                    reading.time, newest
                );
                return TickOutcome::Sampled;
            }
        }
        if !self.throttle.admit(reading.time) {
            return TickOutcome::Sampled;
        }
        if !self.history.append(reading).await {
            return TickOutcome::Sampled;
        }

        debug!("Recorded reading at {}", reading.time);
        sink::dispatch(&self.sinks, reading, self.sink_timeout);
        TickOutcome::Recorded
    }

    /// Tick on the configured interval until cancelled
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => {
                    debug!("Sampler stopped: shutdown signal received");
                    break;
                }
            }

            self.tick().await;
        }
    }
}
