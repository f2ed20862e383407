mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, middleware::Logger};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::Services;
use crate::services::email::{Mailer, sender_from_config};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vendora_backend=info,actix_web=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600)
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    tracing::error!(error = %err, "{context}");
    std::io::Error::other(format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    // 1. Configuration (JWT_SECRET manquant = arrêt immédiat)
    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    tracing::debug!(?config, "Configuration loaded");

    // 2. Base de données + schéma
    tracing::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    db::ensure_schema(&db)
        .await
        .map_err(|e| startup_error("Failed to prepare database schema", e))?;
    tracing::info!("Database connected");

    // 3. File d'envoi des emails
    let sender = sender_from_config(&config).map_err(|e| startup_error("Invalid email transport", e))?;
    let (mailer, mail_worker) = Mailer::start(sender, config.email_queue_capacity);

    // 4. Services partagés
    let services = Services::from_config(&config, db, mailer);

    let bind = (config.host.clone(), config.port);
    let origins = config.cors_origins.clone();
    tracing::info!(host = %bind.0, port = bind.1, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&origins))
            .configure(|cfg| services.configure(cfg))
            .configure(routes::configure_routes)
    })
    .bind(bind)?
    .run()
    .await?;

    // 5. Les workers sont arrêtés: plus aucun Mailer, la file se vide puis le worker s'arrête
    match tokio::time::timeout(Duration::from_secs(10), mail_worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Mail worker terminated abnormally"),
        Err(_) => tracing::warn!("Mail queue not drained before shutdown"),
    }
    tracing::info!("Server stopped");
    Ok(())
}
