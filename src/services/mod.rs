pub mod auth_service;
pub mod blob;
pub mod credential_store;
pub mod draft_store;
pub mod email;
pub mod onboarding_service;
pub mod vendor_service;

use std::sync::Arc;

use actix_web::web;
use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::utils::jwt::TokenService;
use crate::utils::password;
use auth_service::AuthService;
use blob::{BlobStore, CloudinaryStore, UnconfiguredBlobStore};
use email::Mailer;
use onboarding_service::OnboardingService;
use vendor_service::VendorService;

/// Services partagés entre les workers actix (construits une fois au démarrage)
#[derive(Clone)]
pub struct Services {
    pub tokens: web::Data<TokenService>,
    pub auth: web::Data<AuthService>,
    pub onboarding: web::Data<OnboardingService>,
    pub vendor: web::Data<VendorService>,
}

impl Services {
    pub fn new(
        db: DatabaseConnection,
        tokens: Arc<TokenService>,
        mailer: Mailer,
        blobs: Arc<dyn BlobStore>,
        frontend_url: String,
        hash_cost: u32,
    ) -> Self {
        Self {
            tokens: web::Data::from(tokens.clone()),
            auth: web::Data::new(AuthService::new(
                db.clone(),
                tokens,
                mailer,
                frontend_url,
                hash_cost,
            )),
            onboarding: web::Data::new(OnboardingService::new(db.clone(), blobs)),
            vendor: web::Data::new(VendorService::new(db)),
        }
    }

    /// Enregistre chaque service comme `web::Data` de l'App
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.tokens.clone())
            .app_data(self.auth.clone())
            .app_data(self.onboarding.clone())
            .app_data(self.vendor.clone());
    }

    /// Câblage de production à partir de la configuration
    pub fn from_config(config: &AppConfig, db: DatabaseConnection, mailer: Mailer) -> Self {
        let tokens = Arc::new(TokenService::new(
            &config.jwt_secret,
            Duration::hours(config.jwt_ttl_hours),
        ));
        let blobs: Arc<dyn BlobStore> = match &config.cloudinary {
            Some(cloudinary) => Arc::new(CloudinaryStore::new(cloudinary.clone())),
            None => {
                tracing::warn!("Cloudinary is not configured, image uploads will fail");
                Arc::new(UnconfiguredBlobStore)
            }
        };

        Self::new(
            db,
            tokens,
            mailer,
            blobs,
            config.frontend_url.clone(),
            password::DEFAULT_COST,
        )
    }
}
