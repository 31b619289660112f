use axum::{extract::State, routing::get, Json, Router};
use charter_core::flight::Location;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/locations", get(list_locations))
}

/// GET /v1/locations
async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(state.location_repo.list_locations().await?))
}
