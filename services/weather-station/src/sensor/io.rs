//! Serial I/O abstractions
//!
//! Splitting the port into a line reader and a message writer lets the
//! serial sensor be exercised against scripted responses in tests.

use async_trait::async_trait;

use crate::error::Result;

/// Line-oriented reader half of a serial connection
#[async_trait]
pub trait SerialReader: Send {
    /// Read one trimmed line, `None` on EOF
    async fn read_line(&mut self) -> Result<Option<String>>;
}

/// Writer half of a serial connection
#[async_trait]
pub trait SerialWriter: Send {
    /// Write one newline-terminated message and flush
    async fn write_message(&mut self, message: &str) -> Result<()>;
}

/// An opened serial connection
pub struct SerialPair {
    pub reader: Box<dyn SerialReader>,
    pub writer: Box<dyn SerialWriter>,
}

/// Opens serial connections
#[async_trait]
pub trait SerialPortFactory: Send + Sync {
    /// Open `port`, failing with `SerialPort` if it does not exist
    async fn open(&self, port: &str, baud_rate: u32) -> Result<SerialPair>;
}
