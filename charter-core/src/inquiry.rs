use async_trait::async_trait;
use chrono::NaiveDate;
use charter_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::booking::{is_valid_email, TripType};
use crate::flight::is_iata_code;
use crate::{CoreError, CoreResult};

/// Charter request submitted from the public inquiry form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharterInquiry {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub trip_type: TripType,
    pub passengers: u32,
    #[serde(default)]
    pub message: String,
}

impl CharterInquiry {
    pub fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(self.email.expose()) {
            return Err(CoreError::Validation("Email is invalid".to_string()));
        }
        if self.phone.expose().trim().is_empty() {
            return Err(CoreError::Validation("Phone is required".to_string()));
        }
        if !is_iata_code(&self.origin) || !is_iata_code(&self.destination) {
            return Err(CoreError::Validation("Origin and destination must be airport codes".to_string()));
        }
        if self.departure_date < today {
            return Err(CoreError::Validation("Departure date is in the past".to_string()));
        }
        if self.passengers == 0 {
            return Err(CoreError::Validation("At least one passenger is required".to_string()));
        }
        match (self.trip_type, self.return_date) {
            (TripType::RoundTrip, None) => Err(CoreError::Validation(
                "A round trip requires a return date".to_string(),
            )),
            (TripType::RoundTrip, Some(back)) if back < self.departure_date => Err(
                CoreError::Validation("Return date cannot be before departure date".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} -> {} on {} for {} passenger(s)",
            self.trip_type.as_str(),
            self.origin.to_uppercase(),
            self.destination.to_uppercase(),
            self.departure_date,
            self.passengers
        )
    }
}

/// Bot check guarding the inquiry form.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> CoreResult<bool>;
}

/// Third-party form relay that forwards inquiries to the charter desk inbox.
#[async_trait]
pub trait FormRelay: Send + Sync {
    async fn relay(&self, inquiry: &CharterInquiry) -> CoreResult<()>;
}
