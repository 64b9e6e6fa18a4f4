//! Weather Station
//!
//! Samples an environmental sensor on a fixed tick, keeps a throttled history
//! of readings and serves the live reading and down-sampled history over HTTP.

pub mod calibration;
pub mod clock;
pub mod config;
pub mod downsample;
pub mod error;
pub mod history;
pub mod reading;
pub mod sampler;
pub mod sensor;
pub mod server;
pub mod sink;

pub use calibration::{Calibration, LinearCalibration};
pub use config::{load_config, Config};
pub use downsample::{downsample, QueryParams};
pub use error::{Result, StationError};
pub use history::{new_history, HistoryReader, HistoryWriter};
pub use reading::{Bucket, Measurement, Reading};
pub use sampler::{CurrentReading, HistoryThrottle, Sampler, TickOutcome};
pub use sensor::{build_sensor, Sensor};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::SystemClock;
use crate::server::ApiState;

/// Run the weather station with the sensor described by the configuration
pub async fn run(config: Config) -> Result<()> {
    let sensor = build_sensor(&config.sensor);
    run_with_sensor(config, sensor).await
}

/// Run the weather station with an explicit sensor backend
///
/// Returns once a shutdown signal has stopped both the sampler and the HTTP
/// server, or immediately if the listener cannot be bound.
pub async fn run_with_sensor(config: Config, sensor: Arc<dyn Sensor>) -> Result<()> {
    let cancel = CancellationToken::new();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        StationError::Config(format!("Failed to bind port {}: {}", config.server.port, e))
    })?;

    let (writer, history) = new_history(config.history.max_readings);
    let sinks = sink::build_sinks(&config.sinks, &cancel);
    debug!(
        "Sensor: {}, sinks: {}",
        config.sensor.type_name(),
        config
            .sinks
            .iter()
            .map(|s| s.type_name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let sampler = Sampler::new(
        &config.sampler,
        config.calibration,
        sensor,
        Arc::new(SystemClock),
        writer,
        sinks,
    );
    let state = ApiState {
        history,
        current: sampler.current(),
    };

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for ctrl-c, shutting down: {}", e),
        }
        cancel_for_signal.cancel();
    });

    let sampler_task = tokio::spawn(sampler.run(cancel.clone()));
    info!(
        "Sampling every {} ms, recording every {} s",
        config.sampler.tick_interval_ms, config.sampler.history_interval_seconds
    );

    let router = server::build_router(state, config.server.cors_allow_origin.as_deref());
    info!("Weather station listening on http://{}", addr);

    let cancel_for_server = cancel.clone();
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel_for_server.cancelled().await;
        })
        .await;

    // The server may also stop on its own; make sure the sampler follows
    cancel.cancel();
    if let Err(e) = sampler_task.await {
        warn!("Sampler task ended abnormally: {}", e);
    }
    info!("Weather station stopped");

    served.map_err(StationError::Io)
}
