//! Reading and bucket value types
//!
//! Field names on the wire (`Time`, `Temp`, `Pres`, `Humid`, `PiTemp`) are
//! consumed by existing dashboards and must not change.

use serde::{Deserialize, Serialize};

/// One timestamped sensor observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Seconds since the Unix epoch
    #[serde(rename = "Time")]
    pub time: i64,
    /// Temperature in °C
    #[serde(rename = "Temp")]
    pub temperature: f64,
    /// Pressure in hPa
    #[serde(rename = "Pres")]
    pub pressure: f64,
    /// Relative humidity in %, when the sensor reports it
    #[serde(rename = "Humid", default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Host board temperature in °C, when configured
    #[serde(rename = "PiTemp", default, skip_serializing_if = "Option::is_none")]
    pub board_temperature: Option<f64>,
}

/// Raw sensor output before calibration and time stamping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: Option<f64>,
    pub board_temperature: Option<f64>,
}

/// One aggregated unit of a history query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Time of the newest raw reading in the bucket
    #[serde(rename = "Time")]
    pub time: i64,
    /// Mean temperature over the bucket
    #[serde(rename = "Temp")]
    pub temperature: f64,
    /// Mean pressure over the bucket
    #[serde(rename = "Pres")]
    pub pressure: f64,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Reading {
    /// Build a reading from an already-calibrated measurement
    pub fn from_measurement(time: i64, m: Measurement) -> Self {
        Self {
            time,
            temperature: round2(m.temperature),
            pressure: round2(m.pressure),
            humidity: m.humidity.map(round2),
            board_temperature: m.board_temperature.map(round2),
        }
    }

    /// One-line human readable summary, used by display sinks
    pub fn summary(&self) -> String {
        let mut line = format!("{:.1}°C {:.1}hPa", self.temperature, self.pressure);
        if let Some(humidity) = self.humidity {
            line.push_str(&format!(" {:.0}%RH", humidity));
        }
        line
    }
}
