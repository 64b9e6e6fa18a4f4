//! Display sinks

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::reading::Reading;
use crate::sink::Sink;

/// Renders readings to the service log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

#[async_trait]
impl Sink for LogDisplay {
    fn type_name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, reading: &Reading) -> Result<()> {
        info!("{}", reading.summary());
        Ok(())
    }
}

/// Renders readings into a text file picked up by an external display
///
/// The file is written next to its destination and renamed over it so the
/// display never sees a half-written frame.
#[derive(Debug, Clone)]
pub struct FileDisplay {
    path: PathBuf,
}

impl FileDisplay {
    /// Create a display writing frames to `path`
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn render(reading: &Reading) -> String {
        let mut frame = reading.summary();
        frame.push('\n');
        if let Some(board) = reading.board_temperature {
            frame.push_str(&format!("board {:.1}°C\n", board));
        }
        frame.push_str(&format!("at {}\n", reading.time));
        frame
    }
}

#[async_trait]
impl Sink for FileDisplay {
    fn type_name(&self) -> &str {
        "file"
    }

    async fn deliver(&self, reading: &Reading) -> Result<()> {
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, Self::render(reading)).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
