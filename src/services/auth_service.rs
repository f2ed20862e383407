// ============================================================================
// SERVICE AUTH
// ============================================================================
//
// Cycle de vie du compte:
//   register -> verify_email -> login
//   forgot_password -> reset_password
//
// Points d'attention:
//   - Le token de vérification est l'id utilisateur (format hex sans tirets)
//   - forgot_password répond toujours pareil, que l'email existe ou non
//   - bcrypt tourne dans spawn_blocking
//   - Les emails partent par la file du Mailer, jamais en synchrone
//
// ============================================================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::dto::{
    ForgotPasswordRequest, LoggedInUser, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    RegisteredUser, ResetPasswordRequest, ResetPasswordResponse, ResetUser,
};
use crate::models::users;
use crate::services::credential_store::{CredentialStore, NewUser, is_unique_violation};
use crate::services::email::{Mailer, templates};
use crate::utils::deadline::Deadline;
use crate::utils::jwt::{TokenService, new_opaque_token};
use crate::utils::password;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const RESET_TOKEN_BYTES: usize = 32;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

// Mot de passe jetable pour le hash factice du login
const DUMMY_PASSWORD: &str = "vendora-unknown-account";

pub struct AuthService {
    db: DatabaseConnection,
    tokens: Arc<TokenService>,
    mailer: Mailer,
    frontend_url: String,
    hash_cost: u32,
    // Hash comparé quand l'email est inconnu, calculé au premier besoin
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        db: DatabaseConnection,
        tokens: Arc<TokenService>,
        mailer: Mailer,
        frontend_url: String,
        hash_cost: u32,
    ) -> Self {
        Self {
            db,
            tokens,
            mailer,
            frontend_url,
            hash_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Même coût bcrypt qu'un vrai compte, pour un email inconnu
    async fn burn_dummy_verify(&self, candidate: String) -> Result<(), AppError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| password::hash_password_blocking(DUMMY_PASSWORD.to_string(), self.hash_cost))
            .await?;
        password::verify_password_blocking(candidate, dummy.clone()).await?;
        Ok(())
    }

    fn verification_link(&self, user_id: Uuid) -> String {
        format!("{}/verify?token={}", self.frontend_url, user_id.simple())
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    /// Crée un client non vérifié et envoie le lien de vérification
    pub async fn register(&self, req: RegisterRequest, deadline: Deadline) -> Result<RegisterResponse, AppError> {
        // 1. Validation
        req.validate()?;

        // 2. Hash du mot de passe
        let password_hash = password::hash_password_blocking(req.password, self.hash_cost).await?;

        // 3. Insertion (l'index unique tranche les inscriptions concurrentes)
        let new_user = NewUser {
            email: req.email,
            name: req.name.trim().to_string(),
            phone: req.phone,
            address: req.address,
            password_hash,
        };
        let user = match deadline.run(CredentialStore::insert(&self.db, new_user)).await {
            Ok(user) => user,
            Err(AppError::Database(e)) if is_unique_violation(&e) => {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
            Err(e) => return Err(e),
        };

        // 4. Email de vérification (best-effort)
        self.mailer.dispatch_rendered(templates::verification(
            &user.email,
            &user.name,
            &self.verification_link(user.id),
        ));

        // 5. Token d'accès
        let access_token = self.tokens.issue(user.id, &user.role)?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(RegisterResponse {
            user: RegisteredUser {
                id: user.id,
                role: user.role,
                name: user.name,
                email: user.email,
            },
            access_token,
            is_verified: user.is_verified,
        })
    }

    /// Le token est l'id de l'utilisateur. Vérifier deux fois n'est pas une erreur.
    pub async fn verify_email(&self, token: &str, deadline: Deadline) -> Result<(), AppError> {
        let user_id = parse_verification_token(token)?;

        let updated = deadline.run(CredentialStore::mark_verified(&self.db, user_id)).await?;
        if updated == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = %user_id, "Email verified");
        Ok(())
    }

    pub async fn resend_verification(&self, token: &str, deadline: Deadline) -> Result<(), AppError> {
        let user_id = parse_verification_token(token)?;

        let user = deadline
            .run(CredentialStore::find_by_id(&self.db, user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.is_verified {
            return Err(AppError::BadRequest("User is already verified".to_string()));
        }

        self.mailer.dispatch_rendered(templates::resend_verification(
            &user.email,
            &user.name,
            &self.verification_link(user.id),
        ));
        Ok(())
    }

    pub async fn login(&self, req: LoginRequest, deadline: Deadline) -> Result<LoginResponse, AppError> {
        req.validate()?;

        // 1. Email inconnu et mauvais mot de passe: même réponse et même temps
        let user = match deadline.run(CredentialStore::find_by_email(&self.db, &req.email)).await? {
            Some(user) => user,
            None => {
                self.burn_dummy_verify(req.password).await?;
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        // 2. Comparaison bcrypt
        let valid = password::verify_password_blocking(req.password, user.password_hash.clone()).await?;
        if !valid {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        // 3. Compte vérifié ?
        if !user.is_verified {
            return Err(AppError::Forbidden("Please verify your account".to_string()));
        }

        let access_token = self.tokens.issue(user.id, &user.role)?;

        Ok(LoginResponse {
            user: LoggedInUser {
                name: user.name,
                email: user.email,
                address: user.address,
                role: user.role,
            },
            access_token,
        })
    }

    /// Toujours Ok: la réponse ne doit pas révéler si l'email existe
    pub async fn forgot_password(&self, req: ForgotPasswordRequest, deadline: Deadline) -> Result<(), AppError> {
        req.validate()?;

        let Some(user) = deadline.run(CredentialStore::find_by_email(&self.db, &req.email)).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        // 1. Nouveau token (écrase le précédent)
        let token = new_opaque_token(RESET_TOKEN_BYTES);
        let expiry = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        deadline
            .run(CredentialStore::set_reset_token(&self.db, user.id, &token, expiry))
            .await?;

        // 2. Lien par email
        self.mailer
            .dispatch_rendered(templates::password_reset(&user.email, &user.name, &self.reset_link(&token)));

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(())
    }

    pub async fn reset_password(
        &self,
        req: ResetPasswordRequest,
        deadline: Deadline,
    ) -> Result<ResetPasswordResponse, AppError> {
        req.validate()?;

        // 1. Token connu ?
        let user = deadline
            .run(CredentialStore::find_by_reset_token(&self.db, &req.token))
            .await?
            .ok_or_else(|| AppError::Forbidden("Invalid Reset Token".to_string()))?;

        // 2. Token encore valide ?
        let now = Utc::now();
        if user.reset_token_expiry.is_none_or(|expiry| expiry <= now) {
            return Err(AppError::Forbidden("Reset token has expired".to_string()));
        }

        // 3. Nouveau hash puis écriture conditionnelle (le token doit toujours être là)
        let password_hash = password::hash_password_blocking(req.new_password, self.hash_cost).await?;
        let updated = deadline
            .run(CredentialStore::complete_password_reset(
                &self.db,
                user.id,
                &req.token,
                &password_hash,
                now,
            ))
            .await?;
        if updated == 0 {
            return Err(AppError::Forbidden("Invalid Reset Token".to_string()));
        }

        tracing::info!(user_id = %user.id, "Password reset completed");

        Ok(ResetPasswordResponse {
            user: ResetUser {
                name: user.name,
                role: user.role,
                email: user.email,
            },
        })
    }

    pub async fn current_user(&self, user_id: Uuid, deadline: Deadline) -> Result<users::Model, AppError> {
        deadline
            .run(CredentialStore::find_by_id(&self.db, user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn parse_verification_token(token: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(token.trim()).map_err(|_| AppError::InvalidToken)
}
