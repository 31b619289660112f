use std::collections::HashMap;

use async_trait::async_trait;
use charter_core::booking::Ticket;
use charter_core::flight::Flight;
use charter_core::notification::Notification;
use charter_core::repository::{FlightRepository, NotificationRepository, TicketRepository};
use charter_core::{CoreError, CoreResult};
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store used for development and tests. Data is lost on
/// restart.
#[derive(Default)]
pub struct MemoryStore {
    flights: RwLock<HashMap<Uuid, Flight>>,
    tickets: RwLock<Vec<Ticket>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn flight_not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Flight {} not found", id))
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn list_flights(&self, route: Option<(&str, &str)>) -> CoreResult<Vec<Flight>> {
        let flights = self.flights.read().await;
        let mut result: Vec<Flight> = flights
            .values()
            .filter(|f| route.map_or(true, |(o, d)| f.serves(o, d)))
            .cloned()
            .collect();
        result.sort_by_key(|f| f.departure_time);
        Ok(result)
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        Ok(self.flights.read().await.get(&id).cloned())
    }

    async fn create_flight(&self, flight: &Flight) -> CoreResult<()> {
        let mut flights = self.flights.write().await;
        if flights.contains_key(&flight.id) {
            return Err(CoreError::Conflict(format!("Flight {} already exists", flight.id)));
        }
        flights.insert(flight.id, flight.clone());
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight) -> CoreResult<()> {
        let mut flights = self.flights.write().await;
        match flights.get_mut(&flight.id) {
            Some(existing) => {
                *existing = flight.clone();
                Ok(())
            }
            None => Err(flight_not_found(flight.id)),
        }
    }

    async fn delete_flight(&self, id: Uuid) -> CoreResult<()> {
        self.flights
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| flight_not_found(id))
    }

    async fn flights_between(
        &self,
        origin: &str,
        destination: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Flight>> {
        let flights = self.flights.read().await;
        let mut result: Vec<Flight> = flights
            .values()
            .filter(|f| f.serves(origin, destination))
            .filter(|f| {
                let day = f.departure_time.date();
                day >= start && day <= end
            })
            .cloned()
            .collect();
        result.sort_by_key(|f| f.departure_time);
        Ok(result)
    }

    async fn reserve_seats(&self, id: Uuid, count: u32) -> CoreResult<()> {
        let mut flights = self.flights.write().await;
        let flight = flights.get_mut(&id).ok_or_else(|| flight_not_found(id))?;
        let count = i32::try_from(count)
            .map_err(|_| CoreError::Validation("Seat count out of range".to_string()))?;
        if flight.available_seats < count {
            return Err(CoreError::Conflict(format!(
                "Only {} seats left on flight {}",
                flight.available_seats, flight.flight_number
            )));
        }
        flight.available_seats -= count;
        flight.updated_at = Utc::now();
        Ok(())
    }

    async fn release_seats(&self, id: Uuid, count: u32) -> CoreResult<()> {
        let mut flights = self.flights.write().await;
        let flight = flights.get_mut(&id).ok_or_else(|| flight_not_found(id))?;
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        flight.available_seats = flight.available_seats.saturating_add(count).min(flight.total_seats);
        flight.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn create_ticket(&self, ticket: &Ticket) -> CoreResult<()> {
        let mut tickets = self.tickets.write().await;
        if tickets.iter().any(|t| t.reference == ticket.reference) {
            return Err(CoreError::Conflict(format!("Ticket {} already exists", ticket.reference)));
        }
        tickets.push(ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, reference: &str) -> CoreResult<Option<Ticket>> {
        let tickets = self.tickets.read().await;
        Ok(tickets.iter().find(|t| t.reference == reference).cloned())
    }

    async fn list_tickets(&self, limit: usize) -> CoreResult<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut result: Vec<Ticket> = tickets.clone();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit);
        Ok(result)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn add_notification(&self, notification: &Notification) -> CoreResult<()> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, unread_only: bool) -> CoreResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mut result: Vec<Notification> = notifications
            .iter()
            .filter(|n| !unread_only || !n.acknowledged)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn acknowledge(&self, id: Uuid) -> CoreResult<()> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("Notification {} not found", id)))?;
        notification.acknowledged = true;
        Ok(())
    }
}
