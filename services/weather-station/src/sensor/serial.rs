//! Serial sensor board backend using tokio-serial
//!
//! The port is opened on the first measurement and held between ticks. While
//! a request is in flight the connection is owned by the measurement itself:
//! a failed, timed-out or abandoned exchange drops it, so a late reply can
//! never be read as the answer to the next request.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{Result, StationError};
use crate::reading::Measurement;
use crate::sensor::io::{SerialPair, SerialPortFactory, SerialReader, SerialWriter};
use crate::sensor::protocol::{parse_env_response, SensorCommand};
use crate::sensor::Sensor;

/// Newline-delimited reader over any async byte stream
pub struct LineReader<R> {
    inner: BufReader<R>,
    line: String,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap the read half of a stream
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            line: String::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> SerialReader for LineReader<R> {
    async fn read_line(&mut self) -> Result<Option<String>> {
        self.line.clear();
        if self.inner.read_line(&mut self.line).await? == 0 {
            return Ok(None);
        }
        let line = self.line.trim();
        debug!("Serial read: {}", line);
        Ok(Some(line.to_string()))
    }
}

/// Newline-terminating writer over any async byte stream
pub struct LineWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// Wrap the write half of a stream
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> SerialWriter for LineWriter<W> {
    async fn write_message(&mut self, message: &str) -> Result<()> {
        debug!("Serial write: {}", message);
        let framed = format!("{}\n", message);
        self.inner
            .write_all(framed.as_bytes())
            .await
            .map_err(|e| StationError::SerialPort(format!("Failed to write: {}", e)))?;
        self.inner
            .flush()
            .await
            .map_err(|e| StationError::SerialPort(format!("Failed to flush: {}", e)))
    }
}

/// Opens real serial ports through tokio-serial
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSerialPortFactory;

#[async_trait]
impl SerialPortFactory for TokioSerialPortFactory {
    async fn open(&self, port: &str, baud_rate: u32) -> Result<SerialPair> {
        if !Path::new(port).exists() {
            return Err(StationError::SerialPort(format!(
                "Port {} does not exist",
                port
            )));
        }

        let stream = tokio_serial::new(port, baud_rate)
            .open_native_async()
            .map_err(|e| StationError::SerialPort(format!("Failed to open {}: {}", port, e)))?;
        let (reader, writer) = tokio::io::split(stream);

        Ok(SerialPair {
            reader: Box::new(LineReader::new(reader)),
            writer: Box::new(LineWriter::new(writer)),
        })
    }
}

/// Sensor board attached to a serial port
pub struct SerialSensor {
    port: String,
    baud_rate: u32,
    timeout: Duration,
    factory: Arc<dyn SerialPortFactory>,
    connection: Mutex<Option<SerialPair>>,
}

impl fmt::Debug for SerialSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialSensor")
            .field("port", &self.port)
            .field("baud_rate", &self.baud_rate)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SerialSensor {
    /// Create a sensor; `timeout` bounds each request/response exchange
    pub fn new(
        port: String,
        baud_rate: u32,
        timeout: Duration,
        factory: Arc<dyn SerialPortFactory>,
    ) -> Self {
        Self {
            port,
            baud_rate,
            timeout,
            factory,
            connection: Mutex::new(None),
        }
    }

    /// Whether a connection is currently held between measurements
    pub async fn is_open(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    async fn exchange(pair: &mut SerialPair, command: SensorCommand) -> Result<String> {
        pair.writer
            .write_message(&command.to_command_string())
            .await?;
        pair.reader
            .read_line()
            .await?
            .ok_or_else(|| StationError::SerialPort("Connection closed".to_string()))
    }
}

#[async_trait]
impl Sensor for SerialSensor {
    async fn measure(&self) -> Result<Measurement> {
        let mut slot = self.connection.lock().await;

        // Only handed back after a clean exchange
        let mut pair = match slot.take() {
            Some(pair) => pair,
            None => {
                let pair = self.factory.open(&self.port, self.baud_rate).await?;
                info!("Serial sensor opened on {}", self.port);
                pair
            }
        };

        let exchange = Self::exchange(&mut pair, SensorCommand::Read);
        let result = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(response) => response.and_then(|response| parse_env_response(&response)),
            Err(_) => Err(StationError::Timeout(format!(
                "No response from {} within {:?}",
                self.port, self.timeout
            ))),
        };

        match result {
            Ok(measurement) => {
                *slot = Some(pair);
                Ok(measurement)
            }
            Err(e) => {
                warn!("Serial sensor on {} failed, closing port: {}", self.port, e);
                Err(e)
            }
        }
    }
}
