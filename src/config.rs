// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Chargée une seule fois au démarrage (.env puis variables d'environnement).
//
// Obligatoires:
//   - DATABASE_URL (MONGO_URI accepté comme nom de repli)
//   - JWT_SECRET
//
// Optionnelles:
//   - HOST (0.0.0.0), PORT (8080)
//   - FRONTEND_URL (http://localhost:3000), CORS_ORIGINS (liste séparée par ',')
//   - BREVO_API_KEY, ou SMTP_HOST / SMTP_PORT / SMTP_USER / SMTP_PASSWORD
//   - SENDER_EMAIL, SENDER_NAME
//   - CLOUDINARY_CLOUD_NAME / CLOUDINARY_API_KEY / CLOUDINARY_API_SECRET
//   - EMAIL_QUEUE_CAPACITY (256), JWT_TTL_HOURS (24)
//
// Points d'attention:
//   - Les secrets restent dans des SecretString et n'apparaissent jamais dans Debug
//   - JWT_SECRET manquant = erreur fatale au démarrage
//
// ============================================================================

use std::fmt;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const PRODUCTION_FRONTEND_URL: &str = "https://vendora-app.vercel.app";
const DEFAULT_SENDER_EMAIL: &str = "no-reply@vendora.app";
const DEFAULT_SENDER_NAME: &str = "Vendora";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Identité de l'expéditeur des emails transactionnels
#[derive(Debug, Clone)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

/// Transport email choisi selon les variables présentes (Brevo prioritaire)
#[derive(Clone)]
pub enum EmailTransport {
    Brevo {
        api_key: SecretString,
    },
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: SecretString,
    },
    /// Aucun transport: les emails sont seulement journalisés
    Disabled,
}

impl fmt::Debug for EmailTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brevo { .. } => f.debug_struct("Brevo").field("api_key", &"[REDACTED]").finish(),
            Self::Smtp {
                host, port, username, ..
            } => f
                .debug_struct("Smtp")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: SecretString,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub jwt_ttl_hours: i64,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub email: EmailTransport,
    pub sender: Sender,
    pub email_queue_capacity: usize,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("frontend_url", &self.frontend_url)
            .field("cors_origins", &self.cors_origins)
            .field("email", &self.email)
            .field("sender", &self.sender)
            .field("email_queue_capacity", &self.email_queue_capacity)
            .field("cloudinary", &self.cloudinary)
            .finish()
    }
}

impl AppConfig {
    /// Charge la configuration depuis l'environnement (.env inclus)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Même chose à partir d'une fonction de lecture quelconque (utilisé par les tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        // 1. Base de données (MONGO_URI gardé comme nom de repli)
        let database_url = get("DATABASE_URL")
            .or_else(|| get("MONGO_URI"))
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        // 2. Secret JWT
        let jwt_secret = required("JWT_SECRET")?;

        // 3. Serveur HTTP
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", get("PORT"), 8080u16)?;
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", get("JWT_TTL_HOURS"), 24i64)?;
        if jwt_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        let frontend_url = get("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let cors_origins = match get("CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => vec![
                DEFAULT_FRONTEND_URL.to_string(),
                PRODUCTION_FRONTEND_URL.to_string(),
            ],
        };

        // 4. Email
        let email = match (get("BREVO_API_KEY"), get("SMTP_HOST")) {
            (Some(api_key), _) => EmailTransport::Brevo {
                api_key: SecretString::from(api_key),
            },
            (None, Some(host)) => EmailTransport::Smtp {
                host,
                port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587u16)?,
                username: required("SMTP_USER")?,
                password: SecretString::from(required("SMTP_PASSWORD")?),
            },
            (None, None) => EmailTransport::Disabled,
        };
        let sender = Sender {
            email: get("SENDER_EMAIL").unwrap_or_else(|| DEFAULT_SENDER_EMAIL.to_string()),
            name: get("SENDER_NAME").unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
        };
        let email_queue_capacity = parse_or("EMAIL_QUEUE_CAPACITY", get("EMAIL_QUEUE_CAPACITY"), 256usize)?;
        if email_queue_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "EMAIL_QUEUE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        // 5. Cloudinary: les trois variables ensemble ou aucune
        let cloudinary = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret: SecretString::from(api_secret),
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "CLOUDINARY_*".to_string(),
                    "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            jwt_secret: SecretString::from(jwt_secret),
            jwt_ttl_hours,
            frontend_url,
            cors_origins,
            email,
            sender,
            email_queue_capacity,
            cloudinary,
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
