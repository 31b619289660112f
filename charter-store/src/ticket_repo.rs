use async_trait::async_trait;
use charter_core::booking::Ticket;
use charter_core::repository::TicketRepository;
use charter_core::{CoreError, CoreResult};
use sqlx::types::Json;

use crate::database::storage_error;

/// Tickets are kept whole as JSONB; only the reference and issue time are
/// queried on.
pub struct PostgresTicketRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn create_ticket(&self, ticket: &Ticket) -> CoreResult<()> {
        sqlx::query("INSERT INTO tickets (reference, payload, created_at) VALUES ($1, $2, $3)")
            .bind(&ticket.reference)
            .bind(Json(ticket))
            .bind(ticket.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    CoreError::Conflict(format!("Ticket {} already exists", ticket.reference))
                }
                other => storage_error(other),
            })?;

        Ok(())
    }

    async fn get_ticket(&self, reference: &str) -> CoreResult<Option<Ticket>> {
        let row: Option<(Json<Ticket>,)> =
            sqlx::query_as("SELECT payload FROM tickets WHERE reference = $1")
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(row.map(|(Json(ticket),)| ticket))
    }

    async fn list_tickets(&self, limit: usize) -> CoreResult<Vec<Ticket>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(Json<Ticket>,)> =
            sqlx::query_as("SELECT payload FROM tickets ORDER BY created_at DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(rows.into_iter().map(|(Json(ticket),)| ticket).collect())
    }
}
