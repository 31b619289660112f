use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use charter_core::inquiry::CharterInquiry;
use charter_core::notification::{Notification, NotificationKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{error::AppError, notifications::publish, state::AppState};

#[derive(Debug, Deserialize)]
pub struct InquiryRequest {
    #[serde(flatten)]
    pub inquiry: CharterInquiry,
    #[serde(default)]
    pub captcha_token: String,
}

#[derive(Debug, Serialize)]
struct InquiryResponse {
    status: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/inquiries", post(submit_inquiry))
}

/// POST /v1/inquiries
async fn submit_inquiry(
    State(state): State<AppState>,
    Json(req): Json<InquiryRequest>,
) -> Result<(StatusCode, Json<InquiryResponse>), AppError> {
    let inquiry = req.inquiry;
    inquiry.validate(Utc::now().date_naive())?;

    if !state.captcha.verify(&req.captcha_token).await? {
        warn!("Rejected inquiry from {}: CAPTCHA failed", inquiry.email.email_hint());
        return Err(AppError::ValidationError("CAPTCHA verification failed".to_string()));
    }

    state.form_relay.relay(&inquiry).await?;

    let notification = Notification::new(
        NotificationKind::CharterInquiry,
        format!("Charter inquiry from {}", inquiry.name.trim()),
        inquiry.summary(),
    );
    publish(&state, notification).await?;

    info!("Charter inquiry received: {}", inquiry.summary());
    Ok((StatusCode::ACCEPTED, Json(InquiryResponse { status: "received" })))
}
