// ============================================================================
// ERREURS APPLICATIVES
// ============================================================================
//
// Description:
//   Type d'erreur unique renvoyé par tous les handlers et services.
//   Chaque variante correspond à une catégorie de la taxonomie HTTP:
//     invalid_input (400), unauthorized (401), forbidden (403),
//     not_found (404), conflict (409), internal (500).
//
// Points d'attention:
//   - Les erreurs internes (BD, hash, Cloudinary, email) ne sont JAMAIS
//     renvoyées telles quelles au client: message générique + log tracing
//   - Le corps de réponse suit l'enveloppe { success, error }
//
// ============================================================================

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

use crate::services::blob::BlobError;
use crate::services::email::EmailError;
use crate::utils::jwt::TokenError;
use crate::utils::response::ApiResponse;

pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or missing token";
const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    /// Corps de requête mal formé ou champ invalide.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Jeton de vérification illisible (id utilisateur mal formé).
    #[error("Invalid token")]
    InvalidToken,

    /// Requête refusée par une règle métier (ex: candidature vendeur déjà en cours).
    #[error("{0}")]
    BadRequest(String),

    /// Échec d'identifiants au login uniquement.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("Upload error: {0}")]
    Blob(#[from] BlobError),

    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn forbidden_token() -> Self {
        Self::Forbidden(INVALID_TOKEN_MESSAGE.to_string())
    }

    fn is_internal(&self) -> bool {
        match self {
            Self::Database(_)
            | Self::Hash(_)
            | Self::Email(_)
            | Self::Blob(_)
            | Self::DeadlineExceeded(_)
            | Self::Internal(_) => true,
            Self::Token(err) => err.is_internal(),
            _ => false,
        }
    }

    /// Message exposé au client: verbatim pour validation/auth, générique sinon.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            return INTERNAL_MESSAGE.to_string();
        }
        match self {
            Self::Token(_) => INVALID_TOKEN_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::Validation(_) | Self::InvalidToken | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Token(err) if !err.is_internal() => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(self.public_message()))
    }
}
