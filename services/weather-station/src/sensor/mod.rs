//! Sensor acquisition backends
//!
//! A sensor returns one raw [`Measurement`] per call. Failures are expected to
//! be transient; the sampler skips the tick and tries again on the next one.

pub mod iio;
pub mod io;
#[cfg(feature = "mock")]
pub mod mock;
pub mod protocol;
pub mod serial;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SensorConfig;
use crate::error::Result;
use crate::reading::Measurement;

pub use iio::IioSensor;
#[cfg(feature = "mock")]
pub use mock::SimulatedSensor;
pub use serial::{SerialSensor, TokioSerialPortFactory};

/// Capability that acquires one measurement on demand
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Acquire one raw measurement
    async fn measure(&self) -> Result<Measurement>;
}

/// Build the sensor backend described by the configuration
pub fn build_sensor(config: &SensorConfig) -> Arc<dyn Sensor> {
    match config {
        SensorConfig::Iio {
            device_path,
            board_temperature_path,
        } => Arc::new(IioSensor::new(
            device_path.clone(),
            board_temperature_path.clone(),
        )),
        SensorConfig::Serial {
            port,
            baud_rate,
            timeout_seconds,
        } => Arc::new(SerialSensor::new(
            port.clone(),
            *baud_rate,
            Duration::from_secs(*timeout_seconds),
            Arc::new(TokioSerialPortFactory),
        )),
    }
}
