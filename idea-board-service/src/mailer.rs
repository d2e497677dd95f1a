//! Outbound email delivery.
use async_trait::async_trait;
use serde_json::json;

use crate::errors::{MailerError, rejection_reason};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Sends email through the SendGrid v3 API.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    /// Mail is sent from `noreply@{sender_domain}`.
    pub fn new(api_key: impl Into<String>, sender_domain: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: format!("noreply@{sender_domain}"),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from },
            "subject": message.subject,
            "content": [{ "type": "text/plain", "value": message.text }],
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if let Some(reason) = rejection_reason(response).await {
            tracing::error!(to = %message.to, reason = %reason, "SendGrid rejected email");
            return Err(MailerError::Rejected(reason));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Logs emails instead of sending them. Used when no mail provider is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "No mail provider configured, email not sent"
        );
        Ok(())
    }
}
