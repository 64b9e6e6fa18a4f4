//! MQTT publisher sink using rumqttc
//!
//! `connect` spawns the client event loop, which keeps reconnecting in the
//! background. `deliver` only queues the message; when the broker is away the
//! queue fills up and the dispatcher's timeout drops the reading.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, StationError};
use crate::reading::Reading;
use crate::sink::Sink;

const REQUEST_QUEUE_CAPACITY: usize = 10;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Publishes recorded readings as JSON to one MQTT topic
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
    retain: bool,
}

impl fmt::Debug for MqttPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttPublisher")
            .field("topic", &self.topic)
            .field("retain", &self.retain)
            .finish_non_exhaustive()
    }
}

impl MqttPublisher {
    /// Create the client and spawn its event loop until `cancel` fires
    pub fn connect(
        host: &str,
        port: u16,
        topic: &str,
        client_id: &str,
        retain: bool,
        keep_alive: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(keep_alive);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_QUEUE_CAPACITY);
        info!("MQTT sink publishing to {}:{} topic '{}'", host, port, topic);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("MQTT event loop stopped");
                        break;
                    }
                    event = eventloop.poll() => match event {
                        Ok(event) => debug!("MQTT event: {:?}", event),
                        Err(e) => {
                            warn!("MQTT connection error: {}", e);
                            tokio::select! {
                                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                                _ = cancel.cancelled() => break,
                            }
                        }
                    }
                }
            }
        });

        Self {
            client,
            topic: topic.to_string(),
            retain,
        }
    }

    /// JSON payload for a reading, same shape as the status endpoint
    pub fn payload(reading: &Reading) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(reading)?)
    }
}

#[async_trait]
impl Sink for MqttPublisher {
    fn type_name(&self) -> &str {
        "mqtt"
    }

    async fn deliver(&self, reading: &Reading) -> Result<()> {
        let payload = Self::payload(reading)?;
        self.client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, self.retain, payload)
            .await
            .map_err(|e| StationError::Sink(format!("MQTT publish to '{}' failed: {}", self.topic, e)))
    }
}
