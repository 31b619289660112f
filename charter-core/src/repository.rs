use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::booking::Ticket;
use crate::flight::{Flight, Location};
use crate::notification::Notification;
use crate::CoreResult;

/// Storage for the admin flight table.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn list_flights(&self, route: Option<(&str, &str)>) -> CoreResult<Vec<Flight>>;

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>>;

    async fn create_flight(&self, flight: &Flight) -> CoreResult<()>;

    async fn update_flight(&self, flight: &Flight) -> CoreResult<()>;

    async fn delete_flight(&self, id: Uuid) -> CoreResult<()>;

    /// Flights of a route departing within `start..=end` (local dates).
    async fn flights_between(
        &self,
        origin: &str,
        destination: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Flight>>;

    /// Takes `count` seats, failing with `Conflict` when fewer are left.
    async fn reserve_seats(&self, id: Uuid, count: u32) -> CoreResult<()>;

    async fn release_seats(&self, id: Uuid, count: u32) -> CoreResult<()>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create_ticket(&self, ticket: &Ticket) -> CoreResult<()>;

    async fn get_ticket(&self, reference: &str) -> CoreResult<Option<Ticket>>;

    /// Most recent first.
    async fn list_tickets(&self, limit: usize) -> CoreResult<Vec<Ticket>>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn list_locations(&self) -> CoreResult<Vec<Location>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn add_notification(&self, notification: &Notification) -> CoreResult<()>;

    /// Most recent first.
    async fn list_notifications(&self, unread_only: bool) -> CoreResult<Vec<Notification>>;

    async fn acknowledge(&self, id: Uuid) -> CoreResult<()>;
}
