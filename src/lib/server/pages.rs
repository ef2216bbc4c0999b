use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use serde::Serialize;
use tracing::*;

use crate::{
    server::error::{Error, Result},
    settings::{self, manager::TelemetrySettings},
    telemetry::{self, manager::ApplyConfigError},
    transport,
};

#[derive(Debug, Serialize)]
pub struct Info {
    pub name: String,
    pub version: String,
    pub authors: String,
}

pub fn new_info() -> Info {
    Info {
        name: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        authors: env!("CARGO_PKG_AUTHORS").into(),
    }
}

pub async fn info() -> Result<Json<Info>> {
    Ok(Json(new_info()))
}

pub async fn serial_ports() -> Result<Json<Vec<String>>> {
    let ports = transport::available_ports();
    info!("Serial ports: {ports:?}");
    Ok(Json(ports))
}

pub async fn config() -> Result<Json<TelemetrySettings>> {
    Ok(Json(settings::manager::telemetry()))
}

pub async fn config_post(config: Json<TelemetrySettings>) -> Result<HttpResponse> {
    telemetry::manager::apply_config(config.into_inner())
        .await
        .map_err(|error| match error {
            ApplyConfigError::Invalid(error) => Error::BadRequest(error.to_string()),
            ApplyConfigError::Transport(error) => Error::Unavailable(error.to_string()),
        })?;

    Ok(HttpResponse::Ok().json("Ok"))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/info", web::get().to(info))
        .route("/serial/ports", web::get().to(serial_ports))
        .route("/config", web::get().to(config))
        .route("/config", web::post().to(config_post));
}
