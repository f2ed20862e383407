use bcrypt::BcryptError;

use crate::error::AppError;

/// Coût bcrypt par défaut de la librairie (12)
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Coût minimal accepté par bcrypt, pour garder les tests rapides
#[cfg(test)]
pub const TEST_COST: u32 = 4;

/// Hash un mot de passe avec bcrypt.
/// Le salt est généré par mot de passe et stocké dans le digest ($2b$cost$salt+hash).
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Vérifie un mot de passe contre un hash bcrypt (comparaison en temps constant côté librairie)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(password, stored_hash)
}

/// Versions async: bcrypt est coûteux en CPU, on le sort du worker actix
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
        .map_err(Into::into)
}

pub async fn verify_password_blocking(
    password: String,
    stored_hash: String,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))?
        .map_err(Into::into)
}
