use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use charter_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flight::{Flight, FlightStatus};
use crate::{CoreError, CoreResult};

/// Largest party accepted on a single ticket or availability query.
pub const MAX_PASSENGERS: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TripType {
    #[default]
    #[serde(rename = "oneway")]
    OneWay,
    #[serde(rename = "roundtrip")]
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "oneway",
            TripType::RoundTrip => "roundtrip",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl Passenger {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn validate(&self, index: usize, today: NaiveDate) -> CoreResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Passenger {}: first and last name are required",
                index + 1
            )));
        }
        if self.birth_date > today {
            return Err(CoreError::Validation(format!(
                "Passenger {}: birth date is in the future",
                index + 1
            )));
        }
        if self.nationality.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Passenger {}: nationality is required",
                index + 1
            )));
        }
        Ok(())
    }

    fn normalised(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.nationality = self.nationality.trim().to_string();
        self.passport_number = self
            .passport_number
            .map(|p| p.trim().to_uppercase())
            .filter(|p| !p.is_empty());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

impl Contact {
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Contact name is required".to_string()));
        }
        if !is_valid_email(self.email.expose()) {
            return Err(CoreError::Validation("Contact email is invalid".to_string()));
        }
        let digits = self.phone.expose().chars().filter(|c| c.is_ascii_digit()).count();
        if digits < 6 {
            return Err(CoreError::Validation("Contact phone is invalid".to_string()));
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Body of `POST /v1/tickets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub trip_type: TripType,
    pub outbound_flight_id: Uuid,
    #[serde(default)]
    pub return_flight_id: Option<Uuid>,
    pub passengers: Vec<Passenger>,
    pub contact: Contact,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub language: Option<Language>,
}

impl CreateTicketRequest {
    pub fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        if self.passengers.is_empty() {
            return Err(CoreError::Validation("At least one passenger is required".to_string()));
        }
        if self.passengers.len() > MAX_PASSENGERS as usize {
            return Err(CoreError::Validation(format!(
                "At most {} passengers per ticket",
                MAX_PASSENGERS
            )));
        }
        for (i, p) in self.passengers.iter().enumerate() {
            p.validate(i, today)?;
        }
        self.contact.validate()?;

        match (self.trip_type, self.return_flight_id) {
            (TripType::OneWay, Some(_)) => Err(CoreError::Validation(
                "A one-way trip cannot have a return flight".to_string(),
            )),
            (TripType::RoundTrip, None) => Err(CoreError::Validation(
                "A round trip requires a return flight".to_string(),
            )),
            (TripType::RoundTrip, Some(id)) if id == self.outbound_flight_id => Err(
                CoreError::Validation("Return flight must differ from outbound".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn passenger_count(&self) -> u32 {
        self.passengers.len() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightLeg {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub price: i32,
}

impl From<&Flight> for FlightLeg {
    fn from(flight: &Flight) -> Self {
        Self {
            flight_id: flight.id,
            flight_number: flight.flight_number.clone(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            price: flight.price,
        }
    }
}

/// A confirmed booking as stored and printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub reference: String,
    pub trip_type: TripType,
    pub origin: String,
    pub destination: String,
    pub outbound: FlightLeg,
    pub return_leg: Option<FlightLeg>,
    pub passengers: Vec<Passenger>,
    pub contact: Contact,
    pub total_price: i32,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Builds a ticket from a validated request and the flights it refers to.
    pub fn assemble(
        reference: String,
        req: CreateTicketRequest,
        outbound: &Flight,
        return_flight: Option<&Flight>,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if outbound.id != req.outbound_flight_id {
            return Err(CoreError::Validation("Outbound flight mismatch".to_string()));
        }
        ensure_bookable(outbound)?;

        let return_leg = match (req.trip_type, return_flight) {
            (TripType::RoundTrip, Some(back)) => {
                ensure_bookable(back)?;
                if !back.serves(&outbound.destination, &outbound.origin) {
                    return Err(CoreError::Validation(
                        "Return flight must fly the outbound route in reverse".to_string(),
                    ));
                }
                if back.departure_time.date() < outbound.departure_time.date() {
                    return Err(CoreError::Validation(
                        "Return date cannot be before departure date".to_string(),
                    ));
                }
                if back.currency != outbound.currency {
                    return Err(CoreError::Validation(
                        "Outbound and return flights are priced in different currencies".to_string(),
                    ));
                }
                Some(FlightLeg::from(back))
            }
            (TripType::RoundTrip, None) => {
                return Err(CoreError::Validation("A round trip requires a return flight".to_string()))
            }
            (TripType::OneWay, _) => None,
        };

        let out_of_range = || CoreError::Validation("Total price out of range".to_string());
        let pax = i32::try_from(req.passengers.len()).map_err(|_| out_of_range())?;
        let total_price = outbound
            .price
            .checked_add(return_leg.as_ref().map_or(0, |l| l.price))
            .and_then(|per_seat| per_seat.checked_mul(pax))
            .ok_or_else(out_of_range)?;

        Ok(Self {
            reference,
            trip_type: req.trip_type,
            origin: outbound.origin.clone(),
            destination: outbound.destination.clone(),
            outbound: FlightLeg::from(outbound),
            return_leg,
            passengers: req.passengers.into_iter().map(Passenger::normalised).collect(),
            contact: Contact {
                name: req.contact.name.trim().to_string(),
                email: Masked::new(req.contact.email.expose().trim().to_string()),
                phone: Masked::new(req.contact.phone.expose().trim().to_string()),
            },
            total_price,
            currency: outbound.currency.clone(),
            payment_method: req.payment_method,
            language: req.language.unwrap_or_default(),
            created_at,
        })
    }

    pub fn legs(&self) -> impl Iterator<Item = &FlightLeg> {
        std::iter::once(&self.outbound).chain(self.return_leg.iter())
    }
}

fn ensure_bookable(flight: &Flight) -> CoreResult<()> {
    if flight.status == FlightStatus::Cancelled {
        return Err(CoreError::Conflict(format!(
            "Flight {} is cancelled",
            flight.flight_number
        )));
    }
    Ok(())
}

/// Formats minor units as `1,234.50 USD`.
pub fn format_amount(amount: i32, currency: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{:02} {}", sign, grouped, abs % 100, currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn passenger() -> Passenger {
        Passenger {
            first_name: " Jane ".to_string(),
            last_name: "Doe".to_string(),
            birth_date: d(1990, 1, 1),
            nationality: "MN".to_string(),
            passport_number: Some(" e1234567 ".to_string()),
            gender: None,
        }
    }

    fn request(trip_type: TripType, outbound: &Flight, back: Option<&Flight>) -> CreateTicketRequest {
        CreateTicketRequest {
            trip_type,
            outbound_flight_id: outbound.id,
            return_flight_id: back.map(|f| f.id),
            passengers: vec![passenger(), passenger()],
            contact: Contact {
                name: "Jane Doe".to_string(),
                email: Masked::new("jane@example.com".to_string()),
                phone: Masked::new("+976 9911 2233".to_string()),
            },
            payment_method: PaymentMethod::Card,
            language: None,
        }
    }

    #[test]
    fn test_request_validation() {
        let out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 30000);
        let back = Flight::sample("CH102", "HND", "UBN", d(2026, 4, 20), 32000);
        let today = d(2026, 3, 1);

        assert!(request(TripType::OneWay, &out, None).validate(today).is_ok());
        assert!(request(TripType::RoundTrip, &out, Some(&back)).validate(today).is_ok());
        assert!(request(TripType::OneWay, &out, Some(&back)).validate(today).is_err());
        assert!(request(TripType::RoundTrip, &out, None).validate(today).is_err());

        let mut req = request(TripType::OneWay, &out, None);
        req.passengers.clear();
        assert!(req.validate(today).is_err());

        let mut req = request(TripType::OneWay, &out, None);
        req.contact.email = Masked::new("jane@".to_string());
        assert!(req.validate(today).is_err());

        let mut req = request(TripType::OneWay, &out, None);
        req.passengers[1].birth_date = d(2027, 1, 1);
        let err = req.validate(today).unwrap_err();
        assert!(err.to_string().contains("Passenger 2"));
    }

    #[test]
    fn test_request_deserializes_from_form_payload() {
        let json = r#"{
            "trip_type": "roundtrip",
            "outbound_flight_id": "6f1c0a3e-1f0e-4a55-9d8a-2f3f5b0f9a11",
            "return_flight_id": "0b7f0e64-5a38-4df3-8e5b-1c1b8f6f6b22",
            "passengers": [{"first_name": "Jane", "last_name": "Doe", "birth_date": "1990-01-01", "nationality": "MN"}],
            "contact": {"name": "Jane", "email": "jane@example.com", "phone": "99112233"},
            "payment_method": "bank_transfer"
        }"#;
        let req: CreateTicketRequest = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(req.trip_type, TripType::RoundTrip);
        assert_eq!(req.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(req.contact.email.expose(), "jane@example.com");
        assert!(req.passengers[0].passport_number.is_none());
    }

    #[test]
    fn test_assemble_round_trip_totals() {
        let out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 30000);
        let back = Flight::sample("CH102", "HND", "UBN", d(2026, 4, 20), 32000);
        let req = request(TripType::RoundTrip, &out, Some(&back));

        let ticket = Ticket::assemble("CHABC123".into(), req, &out, Some(&back), Utc::now()).unwrap();
        assert_eq!(ticket.total_price, (30000 + 32000) * 2);
        assert_eq!(ticket.legs().count(), 2);
        assert_eq!(ticket.passengers[0].first_name, "Jane");
        assert_eq!(ticket.passengers[0].passport_number.as_deref(), Some("E1234567"));
        assert_eq!(ticket.language, Language::En);
    }

    #[test]
    fn test_assemble_rejects_total_out_of_range() {
        let out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 150_000_000);
        let mut req = request(TripType::OneWay, &out, None);
        req.passengers = vec![passenger(); 15];
        assert!(req.validate(d(2026, 3, 1)).is_ok());

        let err = Ticket::assemble("CHABC123".into(), req, &out, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref msg) if msg == "Total price out of range"));

        let back = Flight::sample("CH102", "HND", "UBN", d(2026, 4, 20), i32::MAX);
        let req = request(TripType::RoundTrip, &out, Some(&back));
        let err = Ticket::assemble("CHABC123".into(), req, &out, Some(&back), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_request_caps_party_size() {
        let out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 30000);
        let mut req = request(TripType::OneWay, &out, None);
        req.passengers = vec![passenger(); MAX_PASSENGERS as usize];
        assert!(req.validate(d(2026, 3, 1)).is_ok());

        req.passengers.push(passenger());
        let err = req.validate(d(2026, 3, 1)).unwrap_err();
        assert!(err.to_string().contains("At most"));
    }

    #[test]
    fn test_assemble_rejects_return_before_departure() {
        let out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 30000);
        let back = Flight::sample("CH102", "HND", "UBN", d(2026, 4, 5), 32000);
        let req = request(TripType::RoundTrip, &out, Some(&back));
        let err = Ticket::assemble("CHABC123".into(), req, &out, Some(&back), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_assemble_rejects_wrong_return_route() {
        let out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 30000);
        let back = Flight::sample("CH202", "ICN", "UBN", d(2026, 4, 20), 32000);
        let req = request(TripType::RoundTrip, &out, Some(&back));
        assert!(Ticket::assemble("CHABC123".into(), req, &out, Some(&back), Utc::now()).is_err());
    }

    #[test]
    fn test_assemble_rejects_cancelled_flight() {
        let mut out = Flight::sample("CH101", "UBN", "HND", d(2026, 4, 10), 30000);
        out.status = FlightStatus::Cancelled;
        let req = request(TripType::OneWay, &out, None);
        let err = Ticket::assemble("CHABC123".into(), req, &out, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(123450, "USD"), "1,234.50 USD");
        assert_eq!(format_amount(5, "EUR"), "0.05 EUR");
        assert_eq!(format_amount(-100000000, "USD"), "-1,000,000.00 USD");
    }
}
