mod config;
mod db;
mod errors;
mod models;
mod routes;
mod services;

#[cfg(test)]
mod test_utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::errors::AppError;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .inspect_err(|e| error!("Invalid configuration: {}", e))?;

    info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    db::create_tables(&db).await?;
    info!("Database connected!");

    let db = web::Data::new(db);
    let origins = config.cors_origins.clone();

    info!("Starting server on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(db.clone())
            .configure(routes::configure_routes)
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
