//! Simulated sensor for running without hardware
//!
//! Produces a slow, deterministic daily-ish swing so history queries show a
//! recognisable curve.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::reading::Measurement;
use crate::sensor::Sensor;

#[derive(Debug, Default)]
pub struct SimulatedSensor {
    samples: AtomicU64,
}

impl SimulatedSensor {
    /// Create a simulated sensor at the start of its cycle
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Sensor for SimulatedSensor {
    async fn measure(&self) -> Result<Measurement> {
        let n = self.samples.fetch_add(1, Ordering::SeqCst) as f64;
        // One full cycle every 1800 samples (one hour at a 2 s tick)
        let phase = n / 1800.0 * std::f64::consts::TAU;

        Ok(Measurement {
            temperature: 18.0 + 4.0 * phase.sin(),
            pressure: 1013.0 + 2.5 * phase.cos(),
            humidity: Some(55.0 - 10.0 * phase.sin()),
            board_temperature: Some(42.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_at_baseline_and_varies() {
        let sensor = SimulatedSensor::new();
        let first = sensor.measure().await.unwrap();
        assert_eq!(first.temperature, 18.0);
        assert_eq!(first.pressure, 1015.5);

        let second = sensor.measure().await.unwrap();
        assert!(second.temperature > first.temperature);
    }
}
