use actix_web::{HttpResponse, get};
use chrono::Utc;

use crate::models::health::{HealthResponse, RootResponse};

/// GET / - Sonde de vie (PUBLIC)
#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        message: "Server is running!",
        status: "ok",
    })
}

/// GET /health - Sonde de santé (PUBLIC)
#[get("/health")]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "healthy",
        service: "vendora-backend",
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}
