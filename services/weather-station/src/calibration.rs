//! Linear calibration applied at acquisition time
//!
//! Each quantity is corrected with `value * scale + offset`. An analog
//! TMP36-style sensor read as a 0..1 fraction, for example, is calibrated with
//! `scale = 100, offset = -50`, and a pressure sensor reporting Pascal with
//! `scale = 0.01` to get hPa.

use serde::{Deserialize, Serialize};

use crate::reading::Measurement;

/// Scale/offset pair for one quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCalibration {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
}

impl LinearCalibration {
    /// Leaves values unchanged
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    /// Correction computing `value * scale + offset`
    pub const fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

impl Default for LinearCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Calibration for every measured quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub temperature: LinearCalibration,
    #[serde(default)]
    pub pressure: LinearCalibration,
    #[serde(default)]
    pub humidity: LinearCalibration,
}

impl Calibration {
    /// Apply the corrections to a raw measurement
    ///
    /// Board temperature is reported by the host itself and is left as is.
    pub fn apply(&self, raw: Measurement) -> Measurement {
        Measurement {
            temperature: self.temperature.apply(raw.temperature),
            pressure: self.pressure.apply(raw.pressure),
            humidity: raw.humidity.map(|h| self.humidity.apply(h)),
            board_temperature: raw.board_temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_values_unchanged() {
        let raw = Measurement {
            temperature: 21.0,
            pressure: 1000.0,
            humidity: Some(40.0),
            board_temperature: Some(50.0),
        };
        assert_eq!(Calibration::default().apply(raw), raw);
    }

    #[test]
    fn analog_sensor_and_pascal_conversion() {
        let calibration = Calibration {
            temperature: LinearCalibration::new(100.0, -50.0),
            pressure: LinearCalibration::new(0.01, 0.0),
            humidity: LinearCalibration::IDENTITY,
        };
        let out = calibration.apply(Measurement {
            temperature: 0.72,
            pressure: 101_325.0,
            humidity: None,
            board_temperature: None,
        });
        assert!((out.temperature - 22.0).abs() < 1e-9);
        assert!((out.pressure - 1013.25).abs() < 1e-9);
        assert_eq!(out.humidity, None);
    }

    #[test]
    fn partial_config_defaults_scale_to_one() {
        let calibration: LinearCalibration = serde_json::from_str(r#"{"offset": -1.5}"#).unwrap();
        assert_eq!(calibration.scale, 1.0);
        assert_eq!(calibration.apply(20.0), 18.5);
    }
}
