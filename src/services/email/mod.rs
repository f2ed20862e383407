// ============================================================================
// SERVICE EMAIL (envoi best-effort)
// ============================================================================
//
// Description:
//   Les handlers ne font jamais l'envoi eux-mêmes: ils déposent un
//   EmailMessage dans la file du Mailer (bounded mpsc) et répondent tout de
//   suite. Un worker tokio vide la file vers l'EmailSender configuré.
//
// Points d'attention:
//   - File pleine => message abandonné avec un warning, la requête n'attend pas
//   - Un échec d'envoi est journalisé, jamais renvoyé au client
//   - Le destinataire est journalisé sous forme ***@domaine
//   - Quand le dernier Mailer est libéré, le worker termine la file puis s'arrête
//
// ============================================================================

pub mod brevo;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, EmailTransport};

pub use brevo::BrevoSender;
pub use smtp::SmtpSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email provider returned status {0}")]
    Rejected(u16),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Un transport capable d'envoyer un email HTML
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Transport utilisé quand ni Brevo ni SMTP ne sont configurés
pub struct LogOnlySender;

#[async_trait]
impl EmailSender for LogOnlySender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %redact_recipient(&message.to),
            subject = %message.subject,
            "Email transport disabled, message not sent"
        );
        Ok(())
    }
}

/// Construit le transport à partir de la configuration
pub fn sender_from_config(config: &AppConfig) -> Result<Arc<dyn EmailSender>, EmailError> {
    let sender: Arc<dyn EmailSender> = match &config.email {
        EmailTransport::Brevo { api_key } => Arc::new(BrevoSender::new(api_key.clone(), config.sender.clone())),
        EmailTransport::Smtp {
            host,
            port,
            username,
            password,
        } => Arc::new(SmtpSender::new(host, *port, username, password, &config.sender)?),
        EmailTransport::Disabled => {
            tracing::warn!("No email transport configured, emails will only be logged");
            Arc::new(LogOnlySender)
        }
    };
    Ok(sender)
}

/// Poignée clonable vers la file d'envoi
#[derive(Clone)]
pub struct Mailer {
    queue: mpsc::Sender<EmailMessage>,
}

impl Mailer {
    /// Démarre le worker. Doit être appelé depuis un runtime tokio.
    pub fn start(sender: Arc<dyn EmailSender>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, mut receiver) = mpsc::channel::<EmailMessage>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let to = redact_recipient(&message.to);
                match sender.send(&message).await {
                    Ok(()) => tracing::info!(to = %to, subject = %message.subject, "Email sent"),
                    Err(e) => {
                        tracing::error!(to = %to, subject = %message.subject, error = %e, "Failed to send email")
                    }
                }
            }
            tracing::debug!("Email queue closed, worker stopped");
        });

        (Self { queue }, worker)
    }

    /// Dépose un message sans attendre. Ne bloque jamais la requête.
    pub fn dispatch(&self, message: EmailMessage) {
        match self.queue.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => tracing::warn!(
                to = %redact_recipient(&message.to),
                subject = %message.subject,
                "Email queue full, message dropped"
            ),
            Err(TrySendError::Closed(message)) => tracing::error!(
                to = %redact_recipient(&message.to),
                "Email worker stopped, message dropped"
            ),
        }
    }

    /// Comme `dispatch`, pour un template: un échec de rendu est journalisé, jamais renvoyé
    pub fn dispatch_rendered(&self, rendered: Result<EmailMessage, EmailError>) {
        match rendered {
            Ok(message) => self.dispatch(message),
            Err(e) => tracing::error!(error = %e, "Failed to render email, message dropped"),
        }
    }
}

/// "jane.doe@example.com" -> "***@example.com"
pub fn redact_recipient(address: &str) -> String {
    match address.rsplit_once('@') {
        Some((_, domain)) => format!("***@{domain}"),
        None => "***".to_string(),
    }
}
