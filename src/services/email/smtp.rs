use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use super::{EmailError, EmailMessage, EmailSender};
use crate::config::Sender;

/// Envoi SMTP direct (STARTTLS)
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &SecretString,
        sender: &Sender,
    ) -> Result<Self, EmailError> {
        let credentials = Credentials::new(username.to_string(), password.expose_secret().to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from: mailbox(Some(&sender.name), &sender.email)?,
        })
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, EmailError> {
    let email = address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))?;
    Ok(Mailbox::new(name.map(str::to_string), email))
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(mailbox(None, &message.to)?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())?;

        self.transport.send(email).await?;
        Ok(())
    }
}
