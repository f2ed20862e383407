use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::onboarding::{BusinessDetailsStep, BusinessInfoStep, CategoriesStep, DraftStep, VendorStep};
use crate::services::onboarding_service::{OnboardingService, StoreDetailsForm};
use crate::utils::deadline::Deadline;
use crate::utils::multipart::FormData;
use crate::utils::response::ApiResponse;

async fn save_vendor_step(
    onboarding: &OnboardingService,
    user: &AuthUser,
    step: VendorStep,
    message: &str,
) -> Result<HttpResponse, AppError> {
    let saved = onboarding
        .submit_step(user.user_id, DraftStep::Vendor(step), Deadline::standard())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(message, saved)))
}

/// POST /api/v1/onboarding/seller/business-type - Type, taille, expérience (PROTÉGÉ)
#[post("/business-type")]
pub async fn business_type(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    body: web::Json<BusinessInfoStep>,
) -> Result<HttpResponse, AppError> {
    save_vendor_step(
        &onboarding,
        &user,
        VendorStep::BusinessInfo(body.into_inner()),
        "Business details updated",
    )
    .await
}

/// POST /api/v1/onboarding/seller/categories - Catégories vendues, 1 à 5 (PROTÉGÉ)
#[post("/categories")]
pub async fn categories(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    body: web::Json<CategoriesStep>,
) -> Result<HttpResponse, AppError> {
    save_vendor_step(
        &onboarding,
        &user,
        VendorStep::Categories(body.into_inner()),
        "Business categories updated",
    )
    .await
}

/// POST /api/v1/onboarding/seller/business-info - Description, localisation, site (PROTÉGÉ)
#[post("/business-info")]
pub async fn business_info(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    body: web::Json<BusinessDetailsStep>,
) -> Result<HttpResponse, AppError> {
    save_vendor_step(
        &onboarding,
        &user,
        VendorStep::BusinessDetails(body.into_inner()),
        "Business details updated",
    )
    .await
}

const STORE_FIELDS: &[&str] = &["storeName", "storeDescription", "primaryColor", "accentColor", "storeLogo"];

/// POST /api/v1/onboarding/seller/store-details - Boutique + logo, multipart (PROTÉGÉ)
#[post("/store-details")]
pub async fn store_details(
    onboarding: web::Data<OnboardingService>,
    user: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let deadline = Deadline::upload();
    let mut form = FormData::read(payload, STORE_FIELDS).await?;
    let store = StoreDetailsForm {
        store_name: form.text("storeName"),
        store_description: form.text("storeDescription"),
        primary_color: form.text("primaryColor"),
        accent_color: form.text("accentColor"),
        logo: form.take_file("storeLogo"),
    };

    let saved = onboarding.save_store_details(user.user_id, store, deadline).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Store details updated", saved)))
}

pub fn seller_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(business_type)
        .service(categories)
        .service(business_info)
        .service(store_details);
}
