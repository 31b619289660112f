use std::sync::Arc;

use charter_core::inquiry::{CaptchaVerifier, FormRelay};
use charter_core::mail::Mailer;
use charter_core::repository::{
    FlightRepository, LocationRepository, NotificationRepository, TicketRepository,
};
use charter_shared::models::events::NotificationEvent;
use charter_ticket::PrinterService;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub admin_username: String,
    pub admin_password: String,
}

#[derive(Clone)]
pub struct AppState {
    pub flight_repo: Arc<dyn FlightRepository>,
    pub ticket_repo: Arc<dyn TicketRepository>,
    pub location_repo: Arc<dyn LocationRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub form_relay: Arc<dyn FormRelay>,
    pub printer: Arc<PrinterService>,
    pub sse_tx: broadcast::Sender<NotificationEvent>,
    pub auth: AuthConfig,
    pub default_currency: String,
    pub ticket_list_limit: usize,
}
