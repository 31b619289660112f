use axum::{extract::State, routing::get, Json, Router};
use charter_ticket::PrinterStatus;

use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/v1/admin/printer/status", get(printer_status))
}

/// GET /v1/admin/printer/status
async fn printer_status(State(state): State<AppState>) -> Json<PrinterStatus> {
    Json(state.printer.check().await)
}
