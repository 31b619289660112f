use std::time::Duration;

use async_trait::async_trait;
use charter_core::inquiry::{CaptchaVerifier, CharterInquiry, FormRelay};
use charter_core::{CoreError, CoreResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

fn http_client() -> CoreResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("charter-api/0.1.0")
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| CoreError::External(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct CaptchaResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// siteverify-style CAPTCHA check: form fields `secret` and `response`,
/// JSON answer `{ "success": bool }`.
pub struct HttpCaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl HttpCaptchaVerifier {
    pub fn new(verify_url: &str, secret: &str) -> CoreResult<Self> {
        Ok(Self {
            client: http_client()?,
            verify_url: verify_url.to_string(),
            secret: secret.to_string(),
        })
    }
}

#[async_trait]
impl CaptchaVerifier for HttpCaptchaVerifier {
    async fn verify(&self, token: &str) -> CoreResult<bool> {
        if token.trim().is_empty() {
            return Ok(false);
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| CoreError::External(format!("CAPTCHA service unreachable: {}", e)))?;

        let body: CaptchaResponse = response
            .json()
            .await
            .map_err(|e| CoreError::External(format!("Invalid CAPTCHA response: {}", e)))?;

        if !body.success {
            warn!("CAPTCHA rejected: {:?}", body.error_codes);
        }
        Ok(body.success)
    }
}

/// Accepts every token. Only installed when no CAPTCHA secret is
/// configured.
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    async fn verify(&self, _token: &str) -> CoreResult<bool> {
        Ok(true)
    }
}

/// Posts inquiries as JSON to a hosted form endpoint.
pub struct HttpFormRelay {
    client: reqwest::Client,
    relay_url: String,
}

impl HttpFormRelay {
    pub fn new(relay_url: &str) -> CoreResult<Self> {
        Ok(Self { client: http_client()?, relay_url: relay_url.to_string() })
    }
}

fn relay_payload(inquiry: &CharterInquiry) -> Value {
    json!({
        "_subject": format!("Charter inquiry: {}", inquiry.summary()),
        "name": inquiry.name,
        "email": inquiry.email.expose(),
        "phone": inquiry.phone.expose(),
        "origin": inquiry.origin.to_uppercase(),
        "destination": inquiry.destination.to_uppercase(),
        "trip_type": inquiry.trip_type.as_str(),
        "departure_date": inquiry.departure_date,
        "return_date": inquiry.return_date,
        "passengers": inquiry.passengers,
        "message": inquiry.message,
    })
}

#[async_trait]
impl FormRelay for HttpFormRelay {
    async fn relay(&self, inquiry: &CharterInquiry) -> CoreResult<()> {
        let response = self
            .client
            .post(&self.relay_url)
            .header("accept", "application/json")
            .json(&relay_payload(inquiry))
            .send()
            .await
            .map_err(|e| CoreError::External(format!("Form relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(CoreError::External(format!("Form relay returned {}", response.status())));
        }
        info!("Relayed charter inquiry from {}", inquiry.email.email_hint());
        Ok(())
    }
}

/// Logs inquiries when no relay endpoint is configured.
pub struct LogFormRelay;

#[async_trait]
impl FormRelay for LogFormRelay {
    async fn relay(&self, inquiry: &CharterInquiry) -> CoreResult<()> {
        info!("Form relay disabled, inquiry kept locally: {}", inquiry.summary());
        Ok(())
    }
}
