use async_trait::async_trait;
use charter_shared::Masked;
use serde::Serialize;

use crate::CoreResult;

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to_email: Masked<String>,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
}

/// Outbound transactional email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> CoreResult<()>;
}
