// Outils de test partagés: BD sqlite en mémoire, faux services externes

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use secrecy::SecretString;

use crate::db::ensure_schema;
use crate::models::users;
use crate::services::Services;
use crate::services::auth_service::AuthService;
use crate::services::blob::{BlobError, BlobStore, ImageUpload};
use crate::services::credential_store::{CredentialStore, NewUser};
use crate::services::email::{EmailError, EmailMessage, EmailSender, Mailer};
use crate::services::onboarding_service::OnboardingService;
use crate::services::vendor_service::VendorService;
use crate::utils::jwt::TokenService;
use crate::utils::password::{TEST_COST, hash_password};

pub const TEST_JWT_SECRET: &str = "test-secret-key-12345";

/// Une seule connexion: chaque pool sqlite::memory: a sa propre base
pub async fn test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opts).await.unwrap();
    ensure_schema(&db).await.unwrap();
    db
}

/// Expéditeur qui garde les messages en mémoire
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmailError::Rejected(503));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Attend que le worker du Mailer ait livré `count` messages
pub async fn wait_for_emails(sender: &Arc<RecordingSender>, count: usize) -> Vec<EmailMessage> {
    let poll = async {
        loop {
            let sent = sender.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .unwrap_or_else(|_| panic!("expected {count} email(s), got {}", sender.sent().len()))
}

/// Stockage d'images factice: URL déterministe contenant le dossier
#[derive(Default)]
pub struct FakeBlobStore {
    uploads: Mutex<Vec<(String, String)>>,
    fail_next: AtomicBool,
}

impl FakeBlobStore {
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload(&self, image: ImageUpload, folder: &str) -> Result<String, BlobError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BlobError::Rejected(500));
        }
        let url = format!("https://res.cloudinary.test/{folder}/{}", image.file_name);
        self.uploads
            .lock()
            .unwrap()
            .push((folder.to_string(), image.file_name));
        Ok(url)
    }
}

/// Application complète câblée sur sqlite + faux services
pub struct TestContext {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenService>,
    pub emails: Arc<RecordingSender>,
    pub blobs: Arc<FakeBlobStore>,
    pub services: Services,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = test_db().await;
        let tokens = Arc::new(TokenService::new(
            &SecretString::from(TEST_JWT_SECRET),
            chrono::Duration::hours(TokenService::DEFAULT_TTL_HOURS),
        ));
        let emails = Arc::new(RecordingSender::default());
        let blobs = Arc::new(FakeBlobStore::default());
        let (mailer, _worker) = Mailer::start(emails.clone(), 16);

        let services = Services::new(
            db.clone(),
            tokens.clone(),
            mailer,
            blobs.clone(),
            "http://localhost:3000".to_string(),
            TEST_COST,
        );

        Self {
            db,
            tokens,
            emails,
            blobs,
            services,
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.services.auth
    }

    pub fn onboarding(&self) -> &OnboardingService {
        &self.services.onboarding
    }

    pub fn vendor(&self) -> &VendorService {
        &self.services.vendor
    }

    pub async fn seed_user(&self, email: &str, password: &str, verified: bool) -> users::Model {
        let user = CredentialStore::insert(
            &self.db,
            NewUser {
                email: email.to_string(),
                name: "Ada".to_string(),
                phone: None,
                address: Some("12 Marina Road".to_string()),
                password_hash: hash_password(password, TEST_COST).unwrap(),
            },
        )
        .await
        .unwrap();

        if verified {
            CredentialStore::mark_verified(&self.db, user.id).await.unwrap();
        }
        CredentialStore::find_by_id(&self.db, user.id).await.unwrap().unwrap()
    }

    pub fn bearer(&self, user: &users::Model) -> (&'static str, String) {
        let token = self.tokens.issue(user.id, &user.role).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }
}

/// Corps multipart/form-data minimal pour les tests HTTP
pub struct MultipartBody {
    boundary: &'static str,
    body: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "vendora-test-boundary",
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// App actix complète (services + routes) pour les tests HTTP
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(|cfg| $ctx.services.configure(cfg))
                .configure(crate::routes::configure_routes),
        )
        .await
    };
}

pub(crate) use test_app;
