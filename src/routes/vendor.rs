use actix_web::{HttpResponse, post, web};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::VendorApplicationRequest;
use crate::services::vendor_service::VendorService;
use crate::utils::deadline::Deadline;
use crate::utils::response::ApiResponse;

/// POST /api/v1/vendor/apply - Candidature vendeur (PROTÉGÉ)
#[post("/apply")]
pub async fn apply(
    vendor: web::Data<VendorService>,
    user: AuthUser,
    body: web::Json<VendorApplicationRequest>,
) -> Result<HttpResponse, AppError> {
    let res = vendor.apply(user.user_id, body.into_inner(), Deadline::standard()).await?;
    let message = res.message.clone();
    Ok(HttpResponse::Created().json(ApiResponse::success(message, res)))
}

pub fn vendor_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/vendor").service(apply));
}
