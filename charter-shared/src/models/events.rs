use uuid::Uuid;

/// Payload pushed to dashboard subscribers as a `new-notification` event.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct NotificationEvent {
    pub notification_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub reference: Option<String>,
    pub timestamp: i64,
}

