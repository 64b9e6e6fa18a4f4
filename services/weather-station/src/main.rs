//! Weather Station CLI
//!
//! Command-line interface for the weather station sampling service.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use weather_station::{load_config, Config};

#[derive(Parser)]
#[command(name = "weather-station")]
#[command(about = "Environmental sensor sampler with history and HTTP API")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sensor device: IIO directory or serial port (overrides config file)
    #[arg(long)]
    device: Option<String>,

    /// Server port (overrides config file)
    #[arg(long)]
    server_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = parse_log_level)]
    log_level: Level,
}

fn parse_log_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid log level: {}. Use: trace, debug, info, warn, error",
            s
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, device={:?}, server_port={:?}, log_level={:?}",
        args.config,
        args.device,
        args.server_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(device) = args.device {
        config.sensor.set_device(device);
    }
    if let Some(server_port) = args.server_port {
        config.server.port = server_port;
    }

    tracing::info!("Starting weather station");
    tracing::info!("Server port: {}", config.server.port);

    #[cfg(feature = "mock")]
    {
        tracing::info!("Running in MOCK MODE - simulated sensor");
        let sensor = std::sync::Arc::new(weather_station::sensor::SimulatedSensor::new());
        weather_station::run_with_sensor(config, sensor).await?;
    }

    #[cfg(not(feature = "mock"))]
    {
        tracing::info!("Sensor: {}", config.sensor.type_name());
        weather_station::run(config).await?;
    }

    Ok(())
}
