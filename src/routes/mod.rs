pub mod auth;
pub mod health;
pub mod onboarding;
pub mod seller;
pub mod vendor;

use actix_web::{HttpRequest, error, web};

use crate::error::AppError;

/// Corps JSON illisible => 400 dans l'enveloppe commune
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
            other => format!("Invalid request body: {other}"),
        };
        AppError::invalid_input(message).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req: &HttpRequest| AppError::invalid_input(format!("Invalid query: {err}")).into())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::root)
        .service(health::health_check)
        .service(
            web::scope("/api/v1")
                .configure(auth::auth_routes)
                .configure(onboarding::onboarding_routes)
                .configure(vendor::vendor_routes),
        );
}
