use async_trait::async_trait;
use charter_core::flight::{Flight, FlightStatus};
use charter_core::repository::FlightRepository;
use charter_core::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::database::storage_error;

const FLIGHT_COLUMNS: &str = "id, flight_number, origin, destination, departure_time, arrival_time, \
     price, currency, total_seats, available_seats, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    origin: String,
    destination: String,
    departure_time: NaiveDateTime,
    arrival_time: NaiveDateTime,
    price: i32,
    currency: String,
    total_seats: i32,
    available_seats: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FlightRow> for Flight {
    type Error = CoreError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        Ok(Flight {
            id: row.id,
            flight_number: row.flight_number,
            origin: row.origin.trim().to_string(),
            destination: row.destination.trim().to_string(),
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            price: row.price,
            currency: row.currency.trim().to_string(),
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            status: FlightStatus::parse(&row.status)
                .map_err(|e| CoreError::Storage(e.to_string()))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_flights(rows: Vec<FlightRow>) -> CoreResult<Vec<Flight>> {
    rows.into_iter().map(Flight::try_from).collect()
}

pub struct PostgresFlightRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn list_flights(&self, route: Option<(&str, &str)>) -> CoreResult<Vec<Flight>> {
        let rows = match route {
            Some((origin, destination)) => {
                sqlx::query_as::<_, FlightRow>(&format!(
                    "SELECT {} FROM flights WHERE origin = $1 AND destination = $2 ORDER BY departure_time",
                    FLIGHT_COLUMNS
                ))
                .bind(origin.to_uppercase())
                .bind(destination.to_uppercase())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, FlightRow>(&format!(
                    "SELECT {} FROM flights ORDER BY departure_time",
                    FLIGHT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(storage_error)?;

        into_flights(rows)
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE id = $1",
            FLIGHT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(Flight::try_from).transpose()
    }

    async fn create_flight(&self, flight: &Flight) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (id, flight_number, origin, destination, departure_time, arrival_time,
                                 price, currency, total_seats, available_seats, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price)
        .bind(&flight.currency)
        .bind(flight.total_seats)
        .bind(flight.available_seats)
        .bind(flight.status.as_str())
        .bind(flight.created_at)
        .bind(flight.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn update_flight(&self, flight: &Flight) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE flights
            SET flight_number = $2, origin = $3, destination = $4, departure_time = $5,
                arrival_time = $6, price = $7, currency = $8, total_seats = $9,
                available_seats = $10, status = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price)
        .bind(&flight.currency)
        .bind(flight.total_seats)
        .bind(flight.available_seats)
        .bind(flight.status.as_str())
        .bind(flight.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Flight {} not found", flight.id)));
        }
        Ok(())
    }

    async fn delete_flight(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Flight {} not found", id)));
        }
        Ok(())
    }

    async fn flights_between(
        &self,
        origin: &str,
        destination: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            r#"
            SELECT {} FROM flights
            WHERE origin = $1 AND destination = $2
              AND departure_time::date BETWEEN $3 AND $4
            ORDER BY departure_time
            "#,
            FLIGHT_COLUMNS
        ))
        .bind(origin.to_uppercase())
        .bind(destination.to_uppercase())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        into_flights(rows)
    }

    async fn reserve_seats(&self, id: Uuid, count: u32) -> CoreResult<()> {
        let count = i32::try_from(count)
            .map_err(|_| CoreError::Validation("Seat count out of range".to_string()))?;

        // Single statement so concurrent bookings cannot oversell.
        let result = sqlx::query(
            r#"
            UPDATE flights
            SET available_seats = available_seats - $2, updated_at = now()
            WHERE id = $1 AND available_seats >= $2
            "#,
        )
        .bind(id)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get_flight(id).await? {
            Some(flight) => Err(CoreError::Conflict(format!(
                "Only {} seats left on flight {}",
                flight.available_seats, flight.flight_number
            ))),
            None => Err(CoreError::NotFound(format!("Flight {} not found", id))),
        }
    }

    async fn release_seats(&self, id: Uuid, count: u32) -> CoreResult<()> {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        sqlx::query(
            r#"
            UPDATE flights
            SET available_seats = LEAST(total_seats, available_seats + $2), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}
