use anyhow::Context;
use telemetry_display_manager::{cli, logger, server, settings, telemetry};
use tracing::*;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    cli::manager::init();
    logger::manager::init();
    settings::manager::init(cli::manager::settings_file().as_deref());

    // Command line arguments override the stored settings, same as the web page
    if let Some(port) = cli::manager::serial_port() {
        settings::manager::set_serial_port(&port);
    }
    if let Some(baud) = cli::manager::serial_baud() {
        settings::manager::set_serial_baud(baud);
    }
    if let Some(address) = cli::manager::server_address() {
        settings::manager::set_server_address(&address);
    }

    if telemetry::manager::start().await.is_err() {
        warn!("Monitoring stays idle until a valid serial configuration is applied");
    }

    server::manager::run(&settings::manager::server_address())
        .await
        .context("Failed running the REST API server")?;

    info!("Termination signal received, stopping the telemetry pipeline");
    telemetry::manager::stop().await;

    Ok(())
}
