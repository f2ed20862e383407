// Requêtes et réponses structurées de l'API (hors étapes d'onboarding, voir onboarding.rs)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use super::onboarding::validate_non_empty_items;
use super::users::{AccountRole, VendorStatus};

// --- Auth --------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "newPassword must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub role: AccountRole,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: RegisteredUser,
    pub access_token: String,
    pub is_verified: bool,
}

#[derive(Debug, Serialize)]
pub struct LoggedInUser {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub role: AccountRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: LoggedInUser,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct ResetUser {
    pub name: String,
    pub role: AccountRole,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub user: ResetUser,
}

// --- Onboarding --------------------------------------------------------------

/// Soumission générique POST /onboarding/draft
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DraftSubmission {
    pub role: String,
    #[validate(range(min = 1, message = "step must be >= 1"))]
    pub step: i32,
    #[serde(default)]
    pub step_completed: bool,
    pub step_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DraftQuery {
    pub role: Option<String>,
}

/// Réponse des étapes vendeur: le bucket enregistré + la version du brouillon
#[derive(Debug, Serialize)]
pub struct SavedStep<T: Serialize> {
    #[serde(flatten)]
    pub data: T,
    pub version: i64,
}

// --- Vendor ------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VendorApplicationRequest {
    #[validate(length(min = 2, max = 100))]
    pub business_name: String,
    #[validate(length(min = 1, message = "businessType is required"))]
    pub business_type: String,
    #[validate(length(min = 10, max = 500))]
    pub business_description: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 10, max = 15))]
    pub contact_phone: String,
    #[validate(length(min = 10, max = 200))]
    pub business_address: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub social_media: Vec<String>,
    #[validate(length(min = 1), custom(function = "validate_non_empty_items"))]
    pub products: Vec<String>,
    #[validate(length(min = 10, max = 300))]
    pub experience: String,
    #[validate(length(min = 10, max = 300))]
    pub motivation: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorApplicationResponse {
    pub application_id: Uuid,
    pub status: VendorStatus,
    pub message: String,
}
