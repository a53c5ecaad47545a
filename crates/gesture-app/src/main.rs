//! gestured - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Build the simulated platform ports from the `[device]` section
//! 3. Start the dispatch actor
//! 4. Feed input lines (stdin or `--input` file) until EOF or Ctrl-C
//! 5. Wait for the last gesture to settle and shut down

mod cli;
mod input;
mod platform;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gesture_core::{GestureConfig, InMemoryPreferences};
use gesture_dispatch::{
    ActionCatalog, Capability, DispatchEngine, DispatchService, HapticFeedback, ProximityGate,
    ProximitySensorPort, TorchState, VibrationPort, WakeLockPort,
};
use tokio::io::{AsyncBufRead, BufReader};

use crate::cli::CliArgs;
use crate::platform::{LogVibrator, LogWakeLock, SimulatedExecutor, SimulatedProximitySensor};

/// Extra time allowed past the proximity timeout for the last gesture.
const SETTLE_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = GestureConfig::load(&config_file);
    let config_level = loaded
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Tracing.
    let level = args.resolve_log_level(&config_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting gestured v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Using default configuration");
            GestureConfig::default()
        }
    };
    config.proximity.timeout_ms = args.resolve_proximity_timeout_ms(config.proximity.timeout_ms);

    // Platform ports.
    let prefs = Arc::new(InMemoryPreferences::from_map(&config.preferences));
    let torch = Arc::new(TorchState::new(config.torch.rear_camera_id.clone()));
    let sensor = Arc::new(SimulatedProximitySensor::new(
        config.device.proximity_max_range,
    ));
    let sensor_port = Capability::from_option(
        config
            .device
            .proximity_sensor
            .then(|| sensor.clone() as Arc<dyn ProximitySensorPort>),
    );
    let vibrator = Capability::from_option(
        config
            .device
            .vibrator
            .then(|| Arc::new(LogVibrator) as Arc<dyn VibrationPort>),
    );
    tracing::info!(
        proximity_sensor = sensor_port.is_available(),
        vibrator = vibrator.is_available(),
        rear_camera = torch.camera_id().unwrap_or("none"),
        "Platform services probed"
    );

    // Dispatcher.
    let wake_lock: Arc<dyn WakeLockPort> = Arc::new(LogWakeLock);
    let gate = ProximityGate::new(
        sensor_port,
        Arc::clone(&wake_lock),
        prefs.clone(),
        config.proximity.clone(),
    );
    let settle_limit = gate.timeout() + SETTLE_GRACE;
    let engine = DispatchEngine::new(
        ActionCatalog::new().without_confirmation(&config.proximity.ungated_gestures),
        gate,
        Arc::new(SimulatedExecutor::new(&config.device, torch.clone(), wake_lock)),
        HapticFeedback::new(vibrator, prefs.clone()),
        prefs,
        torch,
    );
    let (service, handle) = DispatchService::new(engine);
    let service_task = tokio::spawn(service.run());

    // Input.
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            tracing::info!(path = %path.display(), "Reading input file");
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let finished = tokio::select! {
        result = input::pump(reader, &handle, &sensor) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            None
        }
    };

    if let Some(result) = finished {
        let stats = result?;
        tracing::info!(
            handled = stats.handled,
            not_handled = stats.not_handled,
            invalid = stats.invalid,
            "Input finished"
        );
        match tokio::time::timeout(settle_limit, handle.settle()).await {
            Ok(settled) => settled?,
            Err(_) => tracing::warn!("Last gesture did not settle in time"),
        }
    }

    handle.shutdown();
    service_task.await?;
    tracing::info!("gestured stopped");
    Ok(())
}
