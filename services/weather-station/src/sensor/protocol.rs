//! Serial sensor board protocol
//!
//! Serial Settings: 9600 baud by default, 8N1, newline-terminated messages.
//!
//! The host sends `R#`; the board answers with one line
//! `ENV:<temperature °C>:<pressure hPa>:<humidity %RH>`. Boards without a
//! humidity sensor send `-` in the last field.

use crate::error::{Result, StationError};
use crate::reading::Measurement;

/// Commands understood by the sensor board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Request one environmental reading
    Read,
}

impl SensorCommand {
    /// Command text as sent on the wire, without the line terminator
    pub fn to_command_string(&self) -> String {
        match self {
            SensorCommand::Read => "R#".to_string(),
        }
    }
}

/// Parse an `ENV:` response line
pub fn parse_env_response(response: &str) -> Result<Measurement> {
    let response = response.trim();

    let Some(body) = response.strip_prefix("ENV:") else {
        return Err(StationError::InvalidResponse(format!(
            "Expected ENV: prefix, got: {}",
            response
        )));
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != 3 {
        return Err(StationError::InvalidResponse(format!(
            "Expected 3 values in ENV response, got {}: {}",
            parts.len(),
            response
        )));
    }

    let temperature = parse_f64(parts[0], "temperature")?;
    let pressure = parse_f64(parts[1], "pressure")?;
    let humidity = match parts[2].trim() {
        "-" => None,
        value => Some(parse_f64(value, "humidity")?),
    };

    Ok(Measurement {
        temperature,
        pressure,
        humidity,
        board_temperature: None,
    })
}

fn parse_f64(value: &str, field: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| StationError::ParseError(format!("Invalid {} value: {}", field, value)))
}
