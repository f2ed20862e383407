use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::users::AccountRole;

pub const ISSUER: &str = "vendora";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub iat: i64, // issued at
    pub exp: i64, // expiration timestamp
    pub iss: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("bad signature")]
    BadSignature,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Seule la signature côté serveur est une erreur interne, le reste vient du client
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Signing(_))
    }
}

/// Émet et vérifie les JWT HS256 de l'API.
/// La clé vient de la configuration chargée au démarrage (plus de lecture d'env à chaque appel).
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Génère un token d'accès avec la durée de vie par défaut (24h)
    pub fn issue(&self, user_id: Uuid, role: &AccountRole) -> Result<String, TokenError> {
        self.issue_for(user_id, role, self.ttl)
    }

    pub fn issue_for(
        &self,
        user_id: Uuid,
        role: &AccountRole,
        duration: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(duration)
            .ok_or_else(|| TokenError::Signing("Failed to calculate expiration".to_string()))?;

        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Vérifie et décode un JWT token
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }
}

/// Token opaque aléatoire (CSPRNG), encodé en hexadécimal.
/// 32 octets pour les liens de réinitialisation de mot de passe.
pub fn new_opaque_token(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
