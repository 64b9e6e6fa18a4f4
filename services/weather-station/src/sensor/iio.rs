//! Linux Industrial I/O (IIO) sysfs sensor
//!
//! Environmental sensors such as the BME280 and BMP280 are exposed by the
//! kernel under `/sys/bus/iio/devices/iio:deviceN`. Each channel is either a
//! processed `<channel>_input` file or a `<channel>_raw` file with
//! `<channel>_scale` and optional `<channel>_offset`, in which case the
//! processed value is `(raw + offset) * scale`.
//!
//! Units follow the IIO ABI: temperature in m°C, pressure in kPa, humidity in
//! m%RH.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, StationError};
use crate::reading::Measurement;
use crate::sensor::Sensor;

const TEMPERATURE_CHANNEL: &str = "in_temp";
const PRESSURE_CHANNEL: &str = "in_pressure";
const HUMIDITY_CHANNEL: &str = "in_humidityrelative";

/// Sensor reading an IIO device directory
#[derive(Debug, Clone)]
pub struct IioSensor {
    device_path: PathBuf,
    board_temperature_path: Option<PathBuf>,
}

impl IioSensor {
    /// Create a sensor for an IIO device directory and optional board thermal file
    pub fn new(device_path: PathBuf, board_temperature_path: Option<PathBuf>) -> Self {
        Self {
            device_path,
            board_temperature_path,
        }
    }

    /// Read a channel's processed value, `None` if the device lacks it
    async fn read_channel(&self, channel: &str) -> Result<Option<f64>> {
        let input = self.device_path.join(format!("{}_input", channel));
        if let Some(value) = read_optional(&input).await? {
            return Ok(Some(value));
        }

        let raw = self.device_path.join(format!("{}_raw", channel));
        let Some(raw) = read_optional(&raw).await? else {
            return Ok(None);
        };
        let scale = read_optional(&self.device_path.join(format!("{}_scale", channel)))
            .await?
            .unwrap_or(1.0);
        let offset = read_optional(&self.device_path.join(format!("{}_offset", channel)))
            .await?
            .unwrap_or(0.0);

        Ok(Some((raw + offset) * scale))
    }

    async fn read_required(&self, channel: &str) -> Result<f64> {
        self.read_channel(channel).await?.ok_or_else(|| {
            StationError::Sensor(format!(
                "{:?} has no {} channel",
                self.device_path, channel
            ))
        })
    }
}

#[async_trait]
impl Sensor for IioSensor {
    async fn measure(&self) -> Result<Measurement> {
        let temperature = self.read_required(TEMPERATURE_CHANNEL).await? / 1000.0;
        let pressure = self.read_required(PRESSURE_CHANNEL).await? * 10.0;
        let humidity = self
            .read_channel(HUMIDITY_CHANNEL)
            .await?
            .map(|h| h / 1000.0);

        let board_temperature = match &self.board_temperature_path {
            Some(path) => Some(read_value(path).await? / 1000.0),
            None => None,
        };

        debug!(
            "IIO measurement: temp={} pres={} humid={:?} board={:?}",
            temperature, pressure, humidity, board_temperature
        );

        Ok(Measurement {
            temperature,
            pressure,
            humidity,
            board_temperature,
        })
    }
}

/// Read and parse a single sysfs value
async fn read_value(path: &Path) -> Result<f64> {
    read_optional(path)
        .await?
        .ok_or_else(|| StationError::Sensor(format!("{:?} does not exist", path)))
}

async fn read_optional(path: &Path) -> Result<Option<f64>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StationError::Sensor(format!(
                "Failed to read {:?}: {}",
                path, e
            )))
        }
    };

    content
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| StationError::ParseError(format!("{:?}: '{}': {}", path, content.trim(), e)))
}
