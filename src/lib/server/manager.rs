use actix_cors::Cors;
use actix_web::{error::JsonPayloadError, web, App, HttpRequest, HttpServer};
use tracing::*;

use super::pages;

fn json_error_handler(error: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    warn!("Problem with json: {error}");
    error.into()
}

// Start REST API server with the desired address
pub async fn run(server_address: &str) -> Result<(), std::io::Error> {
    let server_address = server_address.to_string();
    info!("Server running at {server_address}");

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .send_wildcard()
                    .max_age(3600),
            )
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            // Versioned API routes (canonical)
            .service(web::scope("/v1").configure(pages::configure_routes))
            // Backward-compatible flat routes (same handlers, for existing clients)
            .configure(pages::configure_routes)
    })
    .bind(server_address)
    .expect("Failed starting web API")
    .run()
    .await
}
