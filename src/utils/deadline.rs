use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::AppError;

/// Échéance d'une requête, construite par le handler et transmise aux services.
/// Chaque appel à la BD ou à un service externe passe par `run`.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub const STANDARD: Duration = Duration::from_secs(10);
    /// Les handlers qui envoient un fichier vers Cloudinary ont plus de marge
    pub const UPLOAD: Duration = Duration::from_secs(15);

    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn standard() -> Self {
        Self::after(Self::STANDARD)
    }

    pub fn upload() -> Self {
        Self::after(Self::UPLOAD)
    }

    /// Exécute `fut` avant l'échéance; un dépassement devient une erreur interne.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<AppError>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(AppError::DeadlineExceeded(self.budget)),
        }
    }
}
