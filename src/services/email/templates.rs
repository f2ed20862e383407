// Templates HTML des emails transactionnels (askama, échappement automatique)

use askama::Template;

use super::{EmailError, EmailMessage};

const VERIFY_SUBJECT: &str = "Verify Your Vendora Account";
const RESET_SUBJECT: &str = "Reset Your Vendora Password";

#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmailHtml<'a> {
    name: &'a str,
    intro: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    link: &'a str,
}

pub fn verification(to: &str, name: &str, link: &str) -> Result<EmailMessage, EmailError> {
    let html_body = VerificationEmailHtml {
        name,
        intro: "Thank you for registering. Please verify your email by clicking the button below:",
        link,
    }
    .render()?;

    Ok(EmailMessage {
        to: to.to_string(),
        subject: VERIFY_SUBJECT.to_string(),
        html_body,
    })
}

/// Même lien que l'inscription, seul le texte d'intro change
pub fn resend_verification(to: &str, name: &str, link: &str) -> Result<EmailMessage, EmailError> {
    let html_body = VerificationEmailHtml {
        name,
        intro: "Here is your verification link again. Please verify your email by clicking the button below:",
        link,
    }
    .render()?;

    Ok(EmailMessage {
        to: to.to_string(),
        subject: VERIFY_SUBJECT.to_string(),
        html_body,
    })
}

pub fn password_reset(to: &str, name: &str, link: &str) -> Result<EmailMessage, EmailError> {
    let html_body = PasswordResetEmailHtml { name, link }.render()?;

    Ok(EmailMessage {
        to: to.to_string(),
        subject: RESET_SUBJECT.to_string(),
        html_body,
    })
}
