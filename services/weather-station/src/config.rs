//! Configuration types for the weather station

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calibration::Calibration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub calibration: Calibration,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Sensor backend configuration with tagged enum for extensibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SensorConfig {
    /// Linux Industrial I/O sysfs device (BME280, BMP280, ...)
    #[serde(rename = "iio")]
    Iio {
        #[serde(default = "default_iio_device")]
        device_path: PathBuf,
        #[serde(default)]
        board_temperature_path: Option<PathBuf>,
    },
    /// Sensor board speaking the `R#` / `ENV:` line protocol
    #[serde(rename = "serial")]
    Serial {
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
    },
}

impl SensorConfig {
    /// Human readable backend name, used in logs
    pub fn type_name(&self) -> &str {
        match self {
            SensorConfig::Iio { .. } => "iio",
            SensorConfig::Serial { .. } => "serial",
        }
    }

    /// Replace the device path (IIO directory or serial port)
    pub fn set_device(&mut self, device: String) {
        match self {
            SensorConfig::Iio { device_path, .. } => *device_path = PathBuf::from(device),
            SensorConfig::Serial { port, .. } => *port = device,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig::Iio {
            device_path: default_iio_device(),
            board_temperature_path: None,
        }
    }
}

/// Sampling cadence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_history_interval")]
    pub history_interval_seconds: u64,
    #[serde(default = "default_sink_timeout", with = "humantime_serde")]
    pub sink_timeout: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            history_interval_seconds: default_history_interval(),
            sink_timeout: default_sink_timeout(),
        }
    }
}

/// History retention configuration
///
/// `max_readings = None` keeps every reading for the lifetime of the process
/// (about 2 880 readings, under 150 KiB, per day at the default cadence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub max_readings: Option<usize>,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_allow_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            cors_allow_origin: None,
        }
    }
}

/// Sink configuration with tagged enum for extensibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SinkConfig {
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "file")]
    File { path: PathBuf },
    #[serde(rename = "mqtt")]
    Mqtt {
        host: String,
        #[serde(default = "default_mqtt_port")]
        port: u16,
        #[serde(default = "default_mqtt_topic")]
        topic: String,
        #[serde(default = "default_mqtt_client_id")]
        client_id: String,
        #[serde(default)]
        retain: bool,
        #[serde(default = "default_mqtt_keep_alive")]
        keep_alive_seconds: u64,
    },
}

impl SinkConfig {
    /// Sink type name, used in logs
    pub fn type_name(&self) -> &str {
        match self {
            SinkConfig::Log => "log",
            SinkConfig::File { .. } => "file",
            SinkConfig::Mqtt { .. } => "mqtt",
        }
    }
}

fn default_iio_device() -> PathBuf {
    PathBuf::from("/sys/bus/iio/devices/iio:device0")
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout() -> u64 {
    2
}

fn default_tick_interval() -> u64 {
    2000
}

fn default_history_interval() -> u64 {
    30
}

fn default_sink_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_server_port() -> u16 {
    8080
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "weather/reading".to_string()
}

fn default_mqtt_client_id() -> String {
    "weather-station".to_string()
}

fn default_mqtt_keep_alive() -> u64 {
    30
}

impl Config {
    /// Reject values the sampler cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.sampler.tick_interval_ms == 0 {
            return Err(crate::StationError::Config(
                "sampler.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.sampler.history_interval_seconds == 0 {
            return Err(crate::StationError::Config(
                "sampler.history_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.history.max_readings == Some(0) {
            return Err(crate::StationError::Config(
                "history.max_readings must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::StationError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
