use chrono::{DateTime, Utc};
use charter_shared::models::events::NotificationEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewBooking,
    CharterInquiry,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewBooking => "new_booking",
            NotificationKind::CharterInquiry => "charter_inquiry",
        }
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        match value {
            "new_booking" => Ok(NotificationKind::NewBooking),
            "charter_inquiry" => Ok(NotificationKind::CharterInquiry),
            other => Err(CoreError::Storage(format!("Unknown notification kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub reference: Option<String>,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            reference: None,
            acknowledged: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn to_event(&self) -> NotificationEvent {
        NotificationEvent {
            notification_id: self.id,
            kind: self.kind.as_str().to_string(),
            title: self.title.clone(),
            message: self.message.clone(),
            reference: self.reference.clone(),
            timestamp: self.created_at.timestamp(),
        }
    }
}
