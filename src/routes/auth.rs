use actix_web::{HttpResponse, get, post, web};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::services::auth_service::AuthService;
use crate::utils::deadline::Deadline;
use crate::utils::response::ApiResponse;

/// POST /api/v1/auth/register - Créer un compte client (PUBLIC)
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let res = auth.register(body.into_inner(), Deadline::standard()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("User Created Successfully", res)))
}

/// POST /api/v1/auth/verify/{token} - Valider l'email (PUBLIC)
#[post("/verify/{token}")]
pub async fn verify_email(
    auth: web::Data<AuthService>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.verify_email(&token, Deadline::standard()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("Email verified successfully")))
}

/// POST /api/v1/auth/resend-verification/{token} - Renvoyer le lien (PUBLIC)
#[post("/resend-verification/{token}")]
pub async fn resend_verification(
    auth: web::Data<AuthService>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.resend_verification(&token, Deadline::standard()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("Verification email sent successfully")))
}

/// POST /api/v1/auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let res = auth.login(body.into_inner(), Deadline::standard()).await?;
    Ok(HttpResponse::Accepted().json(ApiResponse::success("Login successful", res)))
}

/// POST /api/v1/auth/forgot-password - Demander un lien de réinitialisation (PUBLIC)
#[post("/forgot-password")]
pub async fn forgot_password(
    auth: web::Data<AuthService>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    auth.forgot_password(body.into_inner(), Deadline::standard()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::message(
        "If the email exists, a reset link has been sent",
    )))
}

/// POST /api/v1/auth/reset-password - Changer le mot de passe avec le token reçu (PUBLIC)
#[post("/reset-password")]
pub async fn reset_password(
    auth: web::Data<AuthService>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let res = auth.reset_password(body.into_inner(), Deadline::standard()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Password updated successfully", res)))
}

/// GET /api/v1/auth/me - Utilisateur connecté (PROTÉGÉ)
#[get("/me")]
pub async fn me(auth: web::Data<AuthService>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let user = auth.current_user(user.user_id, Deadline::standard()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("User fetched successfully", user)))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(verify_email)
            .service(resend_verification)
            .service(login)
            .service(forgot_password)
            .service(reset_password)
            .service(me),
    );
}
