use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use charter_core::notification::Notification;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const SSE_EVENT_NAME: &str = "new-notification";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/notifications", get(list_notifications))
        .route("/v1/admin/notifications/stream", get(stream_notifications))
        .route("/v1/admin/notifications/{id}/ack", post(acknowledge))
}

/// Stores a notification and pushes it to connected admin dashboards.
pub(crate) async fn publish(state: &AppState, notification: Notification) -> Result<(), AppError> {
    state.notification_repo.add_notification(&notification).await?;
    if state.sse_tx.send(notification.to_event()).is_err() {
        debug!("No live subscribers for notification {}", notification.id);
    }
    Ok(())
}

/// GET /v1/admin/notifications?unread=true
async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.notification_repo.list_notifications(query.unread).await?))
}

/// POST /v1/admin/notifications/{id}/ack
async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.notification_repo.acknowledge(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/notifications/stream
async fn stream_notifications(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(event) => match Event::default().event(SSE_EVENT_NAME).json_data(&event) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to encode notification event: {}", e);
                    None
                }
            },
            // Lagged receivers skip what they missed; the list endpoint has it.
            Err(e) => {
                warn!("Notification stream lagged: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
