//! Error types for the weather station

/// Errors that can occur in the weather station
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("Serial port error: {0}")]
    SerialPort(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Sink error: {0}")]
    Sink(String),
}

/// Result type alias for weather station operations
pub type Result<T> = std::result::Result<T, StationError>;
