use std::time::Duration;

use async_trait::async_trait;
use charter_core::mail::{EmailMessage, Mailer};
use charter_core::{CoreError, CoreResult};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::app_config::EmailConfig;

/// Sends through a transactional-email HTTP API (`api-key` header, JSON
/// body with `sender`, `to`, `subject` and `htmlContent`).
pub struct TransactionalMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_name: String,
    sender_email: String,
}

impl TransactionalMailer {
    pub fn new(config: &EmailConfig) -> CoreResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::External("Email API key is not configured".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent("charter-api/0.1.0")
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CoreError::External(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_name: config.sender_name.clone(),
            sender_email: config.sender_email.clone(),
        })
    }

    fn payload(&self, message: &EmailMessage) -> Value {
        json!({
            "sender": { "name": self.sender_name, "email": self.sender_email },
            "to": [{ "email": message.to_email.expose(), "name": message.to_name }],
            "subject": message.subject,
            "htmlContent": message.html_body,
        })
    }
}

#[async_trait]
impl Mailer for TransactionalMailer {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()> {
        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&self.payload(message))
            .send()
            .await
            .map_err(|e| CoreError::External(format!("Email API unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::External(format!("Email API returned {}: {}", status, body)));
        }

        info!("Email '{}' sent to {}", message.subject, message.to_email.email_hint());
        Ok(())
    }
}

/// Used when email is disabled: the message is logged and dropped.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()> {
        info!(
            "Email disabled, not sending '{}' to {}",
            message.subject,
            message.to_email.email_hint()
        );
        debug!("Suppressed email body: {} bytes", message.html_body.len());
        Ok(())
    }
}
