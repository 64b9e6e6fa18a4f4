//! BDD test world for the weather station

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cucumber::World;
use weather_station::clock::ManualClock;
use weather_station::{
    Bucket, CurrentReading, HistoryReader, Measurement, Result, Sampler, Sensor, StationError,
    TickOutcome,
};

/// Sensor that can be switched into a failing state mid-scenario
#[derive(Debug, Default)]
pub struct SwitchableSensor {
    pub failing: AtomicBool,
    pub count: AtomicU32,
}

#[async_trait]
impl Sensor for SwitchableSensor {
    async fn measure(&self) -> Result<Measurement> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StationError::Sensor("sensor unplugged".to_string()));
        }
        let n = self.count.fetch_add(1, Ordering::SeqCst);
        Ok(Measurement {
            temperature: 20.0 + n as f64 * 0.1,
            pressure: 1013.0,
            humidity: Some(50.0),
            board_temperature: None,
        })
    }
}

#[derive(Debug, Default, World)]
pub struct WeatherWorld {
    // History query testing
    pub history: Option<HistoryReader>,
    pub buckets: Vec<Bucket>,
    pub query_error: Option<StationError>,

    // HTTP testing
    pub response_status: Option<u16>,
    pub response_json: Option<serde_json::Value>,

    // Sampling testing
    pub sampler: Option<Sampler>,
    pub clock: Option<Arc<ManualClock>>,
    pub sensor: Option<Arc<SwitchableSensor>>,
    pub current: Option<CurrentReading>,
    pub outcomes: Vec<TickOutcome>,
}
