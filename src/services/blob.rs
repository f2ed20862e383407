// ============================================================================
// STOCKAGE D'IMAGES (Cloudinary)
// ============================================================================
//
// Description:
//   upload(image, folder) -> URL publique stable.
//   L'appelant a déjà validé le type MIME (jpeg / png) et borné la taille.
//
// Dossiers:
//   - users/profiles : photo de profil client
//   - stores/logo    : logo de boutique vendeur
//
// Points d'attention:
//   - Upload signé: sha256(params triés + secret), encodé en hexadécimal
//   - Toute erreur devient une erreur interne côté API
//
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::CloudinaryConfig;

pub const PROFILE_FOLDER: &str = "users/profiles";
pub const STORE_LOGO_FOLDER: &str = "stores/logo";

/// Taille max acceptée pour une image envoyée en multipart
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
}

impl ImageType {
    /// Seuls image/jpeg et image/png sont acceptés
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: ImageType,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("image storage is not configured")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload rejected with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, image: ImageUpload, folder: &str) -> Result<String, BlobError>;
}

/// Utilisé quand les variables CLOUDINARY_* sont absentes: chaque upload échoue
pub struct UnconfiguredBlobStore;

#[async_trait]
impl BlobStore for UnconfiguredBlobStore {
    async fn upload(&self, _image: ImageUpload, _folder: &str) -> Result<String, BlobError> {
        Err(BlobError::NotConfigured)
    }
}

pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

/// Signature Cloudinary: "k1=v1&k2=v2" (clés triées) suivi du secret, sha256 en hex
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload, folder: &str) -> Result<String, BlobError> {
        // 1. Paramètres signés
        let mut params = BTreeMap::new();
        params.insert("folder", folder.to_string());
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = sign_params(&params, self.config.api_secret.expose_secret());

        // 2. Formulaire multipart
        let file = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(image.content_type.mime())?;
        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        // 3. Envoi
        let response = self.client.post(self.endpoint()).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(BlobError::Rejected(response.status().as_u16()));
        }

        let body: UploadResponse = response.json().await?;
        tracing::debug!(folder = %folder, "Image uploaded");
        Ok(body.secure_url)
    }
}
