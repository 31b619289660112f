use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use charter_core::availability::{aggregate_availability, month_grid, month_start, DateOption, MonthGrid};
use charter_core::booking::MAX_PASSENGERS;
use charter_core::flight::{is_iata_code, Flight, FlightDraft, FlightStatus};
use chrono::{Days, Months, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// Longest range served by the availability endpoint.
pub const MAX_AVAILABILITY_DAYS: i64 = 366;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub from: String,
    pub to: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "one")]
    pub passengers: u32,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub offset: i32,
    #[serde(default = "one")]
    pub passengers: u32,
}

#[derive(Debug, Deserialize)]
pub struct FlightsOnDateQuery {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    #[serde(default = "one")]
    pub passengers: u32,
}

#[derive(Debug, Deserialize)]
pub struct RouteFilter {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn one() -> u32 {
    1
}

fn route_codes(from: &str, to: &str) -> Result<(String, String), AppError> {
    if !is_iata_code(from) || !is_iata_code(to) {
        return Err(AppError::ValidationError("Origin and destination must be airport codes".to_string()));
    }
    Ok((from.trim().to_uppercase(), to.trim().to_uppercase()))
}

fn ensure_passengers(passengers: u32) -> Result<(), AppError> {
    if passengers == 0 {
        return Err(AppError::ValidationError("Passengers must be at least 1".to_string()));
    }
    if passengers > MAX_PASSENGERS {
        return Err(AppError::ValidationError(format!(
            "Passengers cannot exceed {}",
            MAX_PASSENGERS
        )));
    }
    Ok(())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(flights_on_date))
        .route("/v1/flights/availability", get(availability))
        .route("/v1/flights/calendar", get(calendar_month))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/flights", get(list_flights).post(create_flight))
        .route(
            "/v1/admin/flights/{id}",
            get(get_flight).put(update_flight).delete(delete_flight),
        )
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /v1/flights?from&to&date&passengers
///
/// Scheduled flights of a route on one day that still seat the party.
async fn flights_on_date(
    State(state): State<AppState>,
    Query(query): Query<FlightsOnDateQuery>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let (origin, destination) = route_codes(&query.from, &query.to)?;
    ensure_passengers(query.passengers)?;

    let flights = state
        .flight_repo
        .flights_between(&origin, &destination, query.date, query.date)
        .await?
        .into_iter()
        .filter(|f| f.status == FlightStatus::Scheduled && f.seats_for(query.passengers))
        .collect();

    Ok(Json(flights))
}

/// GET /v1/flights/availability?from&to&start&end&passengers
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<DateOption>>, AppError> {
    let (origin, destination) = route_codes(&query.from, &query.to)?;
    ensure_passengers(query.passengers)?;
    if query.end < query.start {
        return Err(AppError::ValidationError("End date is before start date".to_string()));
    }
    if (query.end - query.start).num_days() >= MAX_AVAILABILITY_DAYS {
        return Err(AppError::ValidationError(format!(
            "Date range cannot exceed {} days",
            MAX_AVAILABILITY_DAYS
        )));
    }

    let flights = state
        .flight_repo
        .flights_between(&origin, &destination, query.start, query.end)
        .await?;

    Ok(Json(aggregate_availability(&flights, query.start, query.end, query.passengers)))
}

/// GET /v1/flights/calendar?from&to&offset&passengers
///
/// A Monday-first month grid, `offset` months from the current month.
async fn calendar_month(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthGrid>, AppError> {
    let (origin, destination) = route_codes(&query.from, &query.to)?;
    ensure_passengers(query.passengers)?;
    if query.offset.abs() > 24 {
        return Err(AppError::ValidationError("Month offset out of range".to_string()));
    }

    let today = Utc::now().date_naive();
    let first = month_start(today, query.offset);
    // Padding days of adjacent months are covered too.
    let start = first - Days::new(7);
    let end = first + Months::new(1) + Days::new(7);

    let flights = state
        .flight_repo
        .flights_between(&origin, &destination, start, end)
        .await?;
    let options = aggregate_availability(&flights, start, end, query.passengers);

    Ok(Json(month_grid(&options, today, query.offset)))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /v1/admin/flights
async fn list_flights(
    State(state): State<AppState>,
    Query(filter): Query<RouteFilter>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let flights = match (&filter.from, &filter.to) {
        (Some(from), Some(to)) => {
            let (origin, destination) = route_codes(from, to)?;
            state.flight_repo.list_flights(Some((&origin, &destination))).await?
        }
        (None, None) => state.flight_repo.list_flights(None).await?,
        _ => {
            return Err(AppError::ValidationError(
                "Both from and to are required to filter by route".to_string(),
            ))
        }
    };
    Ok(Json(flights))
}

fn with_default_currency(mut draft: FlightDraft, state: &AppState) -> FlightDraft {
    if draft.currency.trim().is_empty() {
        draft.currency = state.default_currency.clone();
    }
    draft
}

/// POST /v1/admin/flights
async fn create_flight(
    State(state): State<AppState>,
    Json(draft): Json<FlightDraft>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let flight = Flight::from_draft(with_default_currency(draft, &state))?;
    state.flight_repo.create_flight(&flight).await?;

    info!("Created flight {} ({} -> {})", flight.flight_number, flight.origin, flight.destination);
    Ok((StatusCode::CREATED, Json(flight)))
}

async fn load_flight(state: &AppState, id: Uuid) -> Result<Flight, AppError> {
    state
        .flight_repo
        .get_flight(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Flight {} not found", id)))
}

/// GET /v1/admin/flights/{id}
async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(load_flight(&state, id).await?))
}

/// PUT /v1/admin/flights/{id}
async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<FlightDraft>,
) -> Result<Json<Flight>, AppError> {
    let mut flight = load_flight(&state, id).await?;
    flight.apply_draft(with_default_currency(draft, &state))?;
    state.flight_repo.update_flight(&flight).await?;

    info!("Updated flight {}", flight.flight_number);
    Ok(Json(flight))
}

/// DELETE /v1/admin/flights/{id}
async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.flight_repo.delete_flight(id).await?;
    info!("Deleted flight {}", id);
    Ok(StatusCode::NO_CONTENT)
}
