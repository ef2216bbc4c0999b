use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::*;

use crate::{
    settings::{self, manager::TelemetrySettings},
    transport::{self, SerialLink, TransportError},
};

use super::{scheduler::SleepScheduler, ConfigError};

#[derive(Default)]
struct Manager {
    scheduler: Option<SleepScheduler>,
}

lazy_static! {
    static ref MANAGER: Arc<RwLock<Manager>> = Default::default();
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyConfigError {
    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Connect the display and bring up the sleep scheduler, which in turn owns
/// the monitoring pipeline. A connection failure leaves the service idle
/// rather than failing startup: the operator can fix the serial settings
/// through the web page and apply them.
#[instrument(level = "debug")]
pub async fn start() -> Result<(), TransportError> {
    let settings = settings::manager::telemetry();
    let mut manager = MANAGER.write().await;

    if manager.scheduler.is_some() {
        debug!("Telemetry pipeline is already running");
        return Ok(());
    }

    info!(
        "Connecting to the display on {}@{}",
        settings.serial.port, settings.serial.baud
    );
    let link = match SerialLink::connect(&settings.serial) {
        Ok(link) => link,
        Err(error) => {
            error!("Failed to connect to the display: {error}");
            warn!("Define the serial settings in the config file or configure them via the web page");
            return Err(error);
        }
    };
    // The display restarts when the port opens, wait for it to boot
    tokio::time::sleep(transport::SETTLE_DELAY).await;
    info!("Display connected");

    manager.scheduler = Some(SleepScheduler::start(settings, Box::new(link)));

    Ok(())
}

/// Replace the running configuration: validate, tear the whole pipeline
/// down, persist the new settings, and start again from scratch. A
/// validation failure changes nothing; the old pipeline keeps running.
#[instrument(level = "debug", skip_all)]
pub async fn apply_config(new_settings: TelemetrySettings) -> Result<(), ApplyConfigError> {
    validate(&new_settings)?;

    info!("Configuration updated, restarting the telemetry pipeline");
    stop().await;
    settings::manager::set_telemetry(&new_settings);
    start().await?;

    Ok(())
}

/// Stop the scheduler and, transitively, the monitoring pipeline and the
/// transport. Safe to call when already stopped.
#[instrument(level = "debug")]
pub async fn stop() {
    let scheduler = MANAGER.write().await.scheduler.take();
    if let Some(scheduler) = scheduler {
        info!("Stopping the telemetry pipeline");
        scheduler.shutdown().await;
        info!("Display connection closed");
    }
}

pub fn validate(settings: &TelemetrySettings) -> Result<(), ConfigError> {
    let stats = &settings.stats;
    if !(stats.cpu.enabled || stats.memory.enabled || stats.gpu.enabled || stats.network.enabled) {
        return Err(ConfigError::NoMetricEnabled);
    }
    if stats.interval == 0 {
        return Err(ConfigError::ZeroInterval);
    }
    Ok(())
}
