use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Scheduled,
    Cancelled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        match value {
            "scheduled" => Ok(FlightStatus::Scheduled),
            "cancelled" => Ok(FlightStatus::Cancelled),
            other => Err(CoreError::Validation(format!("Unknown flight status: {}", other))),
        }
    }
}

/// A row of the admin flight table. Times are local to the departure and
/// arrival airports; prices are per seat in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub price: i32,
    pub currency: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub status: FlightStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flight {
    pub fn from_draft(draft: FlightDraft) -> CoreResult<Self> {
        draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            flight_number: draft.flight_number.trim().to_uppercase(),
            origin: draft.origin.trim().to_uppercase(),
            destination: draft.destination.trim().to_uppercase(),
            departure_time: draft.departure_time,
            arrival_time: draft.arrival_time,
            price: draft.price,
            currency: draft.currency.trim().to_uppercase(),
            total_seats: draft.total_seats,
            available_seats: draft.available_seats.unwrap_or(draft.total_seats),
            status: draft.status.unwrap_or(FlightStatus::Scheduled),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an edit from the admin table, keeping identity and creation time.
    pub fn apply_draft(&mut self, draft: FlightDraft) -> CoreResult<()> {
        draft.validate()?;
        let sold = self.total_seats - self.available_seats;
        self.flight_number = draft.flight_number.trim().to_uppercase();
        self.origin = draft.origin.trim().to_uppercase();
        self.destination = draft.destination.trim().to_uppercase();
        self.departure_time = draft.departure_time;
        self.arrival_time = draft.arrival_time;
        self.price = draft.price;
        self.currency = draft.currency.trim().to_uppercase();
        self.total_seats = draft.total_seats;
        self.available_seats = draft
            .available_seats
            .unwrap_or_else(|| (draft.total_seats - sold).max(0));
        if let Some(status) = draft.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn serves(&self, origin: &str, destination: &str) -> bool {
        self.origin.eq_ignore_ascii_case(origin) && self.destination.eq_ignore_ascii_case(destination)
    }

    /// True when at least `passengers` seats are still open.
    pub fn seats_for(&self, passengers: u32) -> bool {
        u32::try_from(self.available_seats).is_ok_and(|seats| seats >= passengers)
    }

    #[cfg(test)]
    pub(crate) fn sample(
        number: &str,
        origin: &str,
        destination: &str,
        date: chrono::NaiveDate,
        price: i32,
    ) -> Self {
        let departure_time = date.and_hms_opt(9, 30, 0).unwrap();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            flight_number: number.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_time,
            arrival_time: departure_time + chrono::Duration::hours(4),
            price,
            currency: "USD".to_string(),
            total_seats: 50,
            available_seats: 50,
            status: FlightStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create/update payload for the admin flight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDraft {
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub price: i32,
    pub currency: String,
    pub total_seats: i32,
    #[serde(default)]
    pub available_seats: Option<i32>,
    #[serde(default)]
    pub status: Option<FlightStatus>,
}

impl FlightDraft {
    pub fn validate(&self) -> CoreResult<()> {
        if self.flight_number.trim().is_empty() {
            return Err(CoreError::Validation("Flight number is required".to_string()));
        }
        for code in [&self.origin, &self.destination] {
            if !is_iata_code(code) {
                return Err(CoreError::Validation(format!("Invalid airport code: {}", code)));
            }
        }
        if self.origin.trim().eq_ignore_ascii_case(self.destination.trim()) {
            return Err(CoreError::Validation("Origin and destination must differ".to_string()));
        }
        if self.arrival_time <= self.departure_time {
            return Err(CoreError::Validation("Arrival must be after departure".to_string()));
        }
        if self.price < 0 {
            return Err(CoreError::Validation("Price cannot be negative".to_string()));
        }
        if self.currency.trim().len() != 3 {
            return Err(CoreError::Validation(format!("Invalid currency: {}", self.currency)));
        }
        if self.total_seats <= 0 {
            return Err(CoreError::Validation("Total seats must be positive".to_string()));
        }
        if let Some(available) = self.available_seats {
            if available < 0 || available > self.total_seats {
                return Err(CoreError::Validation(
                    "Available seats must be between 0 and total seats".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

pub fn is_iata_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft() -> FlightDraft {
        let dep = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap().and_hms_opt(8, 0, 0).unwrap();
        FlightDraft {
            flight_number: "ch101".to_string(),
            origin: "ubn".to_string(),
            destination: "HND".to_string(),
            departure_time: dep,
            arrival_time: dep + chrono::Duration::hours(5),
            price: 45000,
            currency: "usd".to_string(),
            total_seats: 120,
            available_seats: None,
            status: None,
        }
    }

    #[test]
    fn test_from_draft_normalises_codes() {
        let flight = Flight::from_draft(draft()).unwrap();
        assert_eq!(flight.flight_number, "CH101");
        assert_eq!(flight.origin, "UBN");
        assert_eq!(flight.currency, "USD");
        assert_eq!(flight.available_seats, 120);
        assert_eq!(flight.status, FlightStatus::Scheduled);
        assert!(flight.serves("ubn", "hnd"));
    }

    #[test]
    fn test_draft_validation() {
        let mut bad = draft();
        bad.destination = "UBN".to_string();
        assert!(matches!(bad.validate(), Err(CoreError::Validation(_))));

        let mut bad = draft();
        bad.arrival_time = bad.departure_time;
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.available_seats = Some(121);
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.origin = "U1".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_apply_draft_keeps_sold_seats() {
        let mut flight = Flight::from_draft(draft()).unwrap();
        flight.available_seats = 100;
        let id = flight.id;

        let mut edit = draft();
        edit.total_seats = 150;
        flight.apply_draft(edit).unwrap();

        assert_eq!(flight.id, id);
        assert_eq!(flight.total_seats, 150);
        assert_eq!(flight.available_seats, 130);
    }

    #[test]
    fn test_seats_for_compares_without_wrapping() {
        let mut flight = Flight::from_draft(draft()).unwrap();
        flight.available_seats = 3;
        assert!(flight.seats_for(3));
        assert!(!flight.seats_for(4));
        assert!(!flight.seats_for(u32::MAX));

        flight.available_seats = -1;
        assert!(!flight.seats_for(1));
    }
}
