use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{EmailError, EmailMessage, EmailSender};
use crate::config::Sender;

const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoRequest<'a> {
    sender: BrevoContact<'a>,
    to: [BrevoContact<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Serialize)]
struct BrevoContact<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

/// Envoi via l'API transactionnelle Brevo (clé dans le header `api-key`)
pub struct BrevoSender {
    client: reqwest::Client,
    api_key: SecretString,
    sender: Sender,
}

impl BrevoSender {
    pub fn new(api_key: SecretString, sender: Sender) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            sender,
        }
    }
}

fn request_body<'a>(sender: &'a Sender, message: &'a EmailMessage) -> BrevoRequest<'a> {
    BrevoRequest {
        sender: BrevoContact {
            name: Some(&sender.name),
            email: &sender.email,
        },
        to: [BrevoContact {
            name: None,
            email: &message.to,
        }],
        subject: &message.subject,
        html_content: &message.html_body,
    }
}

#[async_trait]
impl EmailSender for BrevoSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .client
            .post(BREVO_ENDPOINT)
            .header("api-key", self.api_key.expose_secret())
            .json(&request_body(&self.sender, message))
            .send()
            .await?;

        // Brevo répond 201 Created quand le message est accepté
        if response.status() != StatusCode::CREATED {
            return Err(EmailError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let sender = Sender {
            email: "no-reply@vendora.app".to_string(),
            name: "Vendora".to_string(),
        };
        let message = EmailMessage {
            to: "a@b.co".to_string(),
            subject: "Verify Your Vendora Account".to_string(),
            html_body: "<p>hi</p>".to_string(),
        };

        let body = serde_json::to_value(request_body(&sender, &message)).unwrap();
        assert_eq!(
            body,
            json!({
                "sender": {"name": "Vendora", "email": "no-reply@vendora.app"},
                "to": [{"email": "a@b.co"}],
                "subject": "Verify Your Vendora Account",
                "htmlContent": "<p>hi</p>"
            })
        );
    }
}
