//! Best-effort side effects fired when a reading enters the history
//!
//! Each delivery runs on its own task under a timeout. Failures, timeouts and
//! panics stay inside that task; the sampler never waits on a sink.

pub mod display;
pub mod mqtt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SinkConfig;
use crate::error::Result;
use crate::reading::Reading;

pub use display::{FileDisplay, LogDisplay};
pub use mqtt::MqttPublisher;

/// One-way consumer of recorded readings
#[async_trait]
pub trait Sink: Send + Sync + std::fmt::Debug {
    /// Sink type name (e.g. "mqtt"), used in logs
    fn type_name(&self) -> &str;

    /// Deliver a reading
    async fn deliver(&self, reading: &Reading) -> Result<()>;
}

/// Build the configured sinks
///
/// Must be called inside a tokio runtime: network sinks spawn their
/// connection tasks here and stop them when `cancel` fires.
pub fn build_sinks(configs: &[SinkConfig], cancel: &CancellationToken) -> Vec<Arc<dyn Sink>> {
    configs
        .iter()
        .map(|config| -> Arc<dyn Sink> {
            match config {
                SinkConfig::Log => Arc::new(LogDisplay),
                SinkConfig::File { path } => Arc::new(FileDisplay::new(path.clone())),
                SinkConfig::Mqtt {
                    host,
                    port,
                    topic,
                    client_id,
                    retain,
                    keep_alive_seconds,
                } => Arc::new(MqttPublisher::connect(
                    host,
                    *port,
                    topic,
                    client_id,
                    *retain,
                    Duration::from_secs(*keep_alive_seconds),
                    cancel.clone(),
                )),
            }
        })
        .collect()
}

/// Fire every sink once for `reading` without waiting for any of them
pub fn dispatch(sinks: &[Arc<dyn Sink>], reading: Reading, timeout: Duration) -> Vec<JoinHandle<()>> {
    sinks
        .iter()
        .map(|sink| {
            let sink = Arc::clone(sink);
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, sink.deliver(&reading)).await {
                    Ok(Ok(())) => debug!("Delivered reading {} to '{}'", reading.time, sink.type_name()),
                    Ok(Err(e)) => warn!("Sink '{}' failed: {}", sink.type_name(), e),
                    Err(_) => warn!(
                        "Sink '{}' did not finish within {:?}",
                        sink.type_name(),
                        timeout
                    ),
                }
            })
        })
        .collect()
}
