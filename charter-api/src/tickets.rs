use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use charter_core::booking::{format_amount, CreateTicketRequest, Ticket};
use charter_core::flight::Flight;
use charter_core::mail::EmailMessage;
use charter_core::notification::{Notification, NotificationKind};
use charter_core::CoreError;
use charter_ticket::pdf::render_receipt_pdf;
use charter_ticket::reference::{generate_reference, is_reference, receipt_file_name};
use charter_ticket::template::{render_email_subject, render_ticket_html, Layout};
use charter_ticket::PrintOutcome;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{error::AppError, notifications::publish, state::AppState};

/// Fresh references tried when a generated one is already taken.
const MAX_REFERENCE_ATTEMPTS: u32 = 3;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub reference: String,
    pub total_price: i32,
    pub currency: String,
    pub total_display: String,
    pub print: Option<PrintOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub limit: Option<usize>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets", post(create_ticket))
        .route("/v1/tickets/{reference}", get(get_ticket))
        .route("/v1/tickets/{reference}/receipt", get(receipt_html))
        .route("/v1/tickets/{reference}/receipt.pdf", get(receipt_pdf))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/tickets", get(list_tickets))
        .route("/v1/admin/tickets/{reference}/print", post(print_ticket))
}

async fn load_flight(state: &AppState, id: Uuid) -> Result<Flight, AppError> {
    state
        .flight_repo
        .get_flight(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Flight {} not found", id)))
}

async fn load_ticket(state: &AppState, reference: &str) -> Result<Ticket, AppError> {
    let reference = reference.trim().to_uppercase();
    if !is_reference(&reference) {
        return Err(AppError::NotFoundError(format!("Ticket {} not found", reference)));
    }
    state
        .ticket_repo
        .get_ticket(&reference)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Ticket {} not found", reference)))
}

async fn release_all(state: &AppState, flight_ids: &[Uuid], seats: u32) {
    for id in flight_ids {
        if let Err(e) = state.flight_repo.release_seats(*id, seats).await {
            error!("Failed to release {} seats on flight {}: {}", seats, id, e);
        }
    }
}

/// Holds seats on every leg, giving back what was taken if any leg fails.
async fn reserve_legs(state: &AppState, ticket: &Ticket, seats: u32) -> Result<Vec<Uuid>, AppError> {
    let mut reserved = Vec::new();
    for leg in ticket.legs() {
        if let Err(e) = state.flight_repo.reserve_seats(leg.flight_id, seats).await {
            release_all(state, &reserved, seats).await;
            return Err(e.into());
        }
        reserved.push(leg.flight_id);
    }
    Ok(reserved)
}

fn send_confirmation(state: &AppState, ticket: &Ticket) {
    let message = EmailMessage {
        to_email: ticket.contact.email.clone(),
        to_name: ticket.contact.name.clone(),
        subject: render_email_subject(ticket, ticket.language),
        html_body: render_ticket_html(ticket, Layout::Single(ticket.language)),
    };
    let mailer = state.mailer.clone();
    let reference = ticket.reference.clone();

    tokio::spawn(async move {
        match mailer.send(&message).await {
            Ok(()) => info!("Confirmation for {} dispatched", reference),
            Err(e) => error!("Failed to send confirmation for {}: {}", reference, e),
        }
    });
}

// ============================================================================
// Public Handlers
// ============================================================================

/// POST /v1/tickets
async fn create_ticket(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<CreateTicketResponse>), AppError> {
    let today = Utc::now().date_naive();
    req.validate(today)?;
    let seats = req.passenger_count();

    let outbound = load_flight(&state, req.outbound_flight_id).await?;
    let return_flight = match req.return_flight_id {
        Some(id) => Some(load_flight(&state, id).await?),
        None => None,
    };
    if outbound.departure_time.date() < today {
        return Err(AppError::ValidationError(format!(
            "Flight {} has already departed",
            outbound.flight_number
        )));
    }

    let mut ticket = Ticket::assemble(generate_reference(), req, &outbound, return_flight.as_ref(), Utc::now())?;

    let reserved = reserve_legs(&state, &ticket, seats).await?;
    let mut attempts = 0;
    loop {
        match state.ticket_repo.create_ticket(&ticket).await {
            Ok(()) => break,
            Err(CoreError::Conflict(_)) if attempts < MAX_REFERENCE_ATTEMPTS => {
                attempts += 1;
                ticket.reference = generate_reference();
            }
            Err(e) => {
                release_all(&state, &reserved, seats).await;
                return Err(e.into());
            }
        }
    }
    info!(
        "Issued ticket {} for {} passenger(s), contact {}",
        ticket.reference,
        seats,
        ticket.contact.email.email_hint()
    );

    let notification = Notification::new(
        NotificationKind::NewBooking,
        format!("New booking {}", ticket.reference),
        format!(
            "{} -> {}, {} passenger(s), {}",
            ticket.origin,
            ticket.destination,
            seats,
            format_amount(ticket.total_price, &ticket.currency)
        ),
    )
    .with_reference(ticket.reference.clone());
    if let Err(e) = publish(&state, notification).await {
        warn!("Failed to record booking notification for {}: {}", ticket.reference, e);
    }

    send_confirmation(&state, &ticket);

    let print = match state.printer.print_receipt(&ticket).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Receipt for {} was not printed: {}", ticket.reference, e);
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            total_display: format_amount(ticket.total_price, &ticket.currency),
            reference: ticket.reference,
            total_price: ticket.total_price,
            currency: ticket.currency,
            print,
        }),
    ))
}

/// GET /v1/tickets/{reference}
async fn get_ticket(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Ticket>, AppError> {
    Ok(Json(load_ticket(&state, &reference).await?))
}

/// GET /v1/tickets/{reference}/receipt?lang=en|es|both
async fn receipt_html(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Query(query): Query<ReceiptQuery>,
) -> Result<Html<String>, AppError> {
    let layout = Layout::from_query(query.lang.as_deref())
        .ok_or_else(|| AppError::ValidationError("lang must be one of en, es, both".to_string()))?;
    let ticket = load_ticket(&state, &reference).await?;
    Ok(Html(render_ticket_html(&ticket, layout)))
}

/// GET /v1/tickets/{reference}/receipt.pdf
async fn receipt_pdf(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = load_ticket(&state, &reference).await?;
    let bytes = render_receipt_pdf(&ticket);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        receipt_file_name(&ticket.reference, Utc::now(), "pdf")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /v1/admin/tickets
async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<Vec<Ticket>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.ticket_list_limit)
        .min(state.ticket_list_limit);
    Ok(Json(state.ticket_repo.list_tickets(limit).await?))
}

/// POST /v1/admin/tickets/{reference}/print
async fn print_ticket(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<PrintOutcome>, AppError> {
    let ticket = load_ticket(&state, &reference).await?;
    Ok(Json(state.printer.print_receipt(&ticket).await?))
}
