use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::StreamExt;

use crate::error::AppError;
use crate::services::blob::{ImageType, ImageUpload, MAX_IMAGE_BYTES};

/// Taille max d'un champ texte
const MAX_TEXT_BYTES: usize = 64 * 1024;
/// Taille max du formulaire entier: une image + les champs texte
pub const MAX_FORM_BYTES: usize = MAX_IMAGE_BYTES + 256 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Vérifie le type MIME déclaré (jpeg / png uniquement)
    pub fn into_image(self) -> Result<ImageUpload, AppError> {
        let content_type = self
            .content_type
            .as_deref()
            .and_then(ImageType::from_mime)
            .ok_or_else(|| AppError::invalid_input("Only JPEG/PNG images are allowed"))?;

        if self.bytes.is_empty() {
            return Err(AppError::invalid_input("Uploaded image is empty"));
        }

        Ok(ImageUpload {
            file_name: self.file_name,
            content_type,
            bytes: self.bytes,
        })
    }
}

/// Formulaire multipart lu entièrement en mémoire.
/// Seuls les champs attendus sont acceptés; chaque champ et le total sont bornés.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn read(payload: Multipart, expected: &[&str]) -> Result<Self, AppError> {
        Self::read_bounded(payload, expected, MAX_FORM_BYTES).await
    }

    async fn read_bounded(mut payload: Multipart, expected: &[&str], max_total: usize) -> Result<Self, AppError> {
        let mut form = FormData::default();
        let mut total = 0usize;

        while let Some(item) = payload.next().await {
            let mut field = item.map_err(|e| AppError::invalid_input(format!("Invalid multipart body: {e}")))?;

            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if !expected.contains(&name.as_str()) {
                return Err(AppError::invalid_input(format!("Unexpected field '{name}'")));
            }
            if form.fields.contains_key(&name) || form.files.contains_key(&name) {
                return Err(AppError::invalid_input(format!("Duplicate field '{name}'")));
            }

            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|mime| mime.essence_str().to_string());

            // fichier si un filename est présent, champ texte sinon
            let limit = if file_name.is_some() { MAX_IMAGE_BYTES } else { MAX_TEXT_BYTES };
            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| AppError::invalid_input(format!("Invalid multipart body: {e}")))?;
                total += chunk.len();
                if total > max_total {
                    return Err(AppError::invalid_input("Request body is too large"));
                }
                if bytes.len() + chunk.len() > limit {
                    return Err(AppError::invalid_input(format!("Field '{name}' is too large")));
                }
                bytes.extend_from_slice(&chunk);
            }

            match file_name {
                Some(file_name) => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let value = String::from_utf8(bytes)
                        .map_err(|_| AppError::invalid_input(format!("Field '{name}' must be UTF-8 text")))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
