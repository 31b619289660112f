pub mod escpos;
pub mod pdf;
pub mod printer;
pub mod reference;
pub mod template;

pub use printer::{PrintOutcome, PrinterConfig, PrinterError, PrinterMode, PrinterService, PrinterStatus};
pub use template::Layout;

#[cfg(test)]
pub(crate) mod fixtures {
    use charter_core::booking::{
        Contact, FlightLeg, Language, Passenger, PaymentMethod, Ticket, TripType,
    };
    use charter_shared::Masked;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn leg(number: &str, origin: &str, destination: &str, day: u32, price: i32) -> FlightLeg {
        let departure_time = NaiveDate::from_ymd_opt(2026, 4, day)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        FlightLeg {
            flight_id: Uuid::new_v4(),
            flight_number: number.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_time,
            arrival_time: departure_time + chrono::Duration::hours(4),
            price,
        }
    }

    pub fn sample_ticket(round_trip: bool) -> Ticket {
        let passenger = |first: &str| Passenger {
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            nationality: "MN".to_string(),
            passport_number: Some("E1234567".to_string()),
            gender: None,
        };
        let outbound = leg("CH101", "UBN", "HND", 10, 30000);
        let return_leg = round_trip.then(|| leg("CH102", "HND", "UBN", 20, 32000));
        let per_seat = outbound.price + return_leg.as_ref().map_or(0, |l| l.price);

        Ticket {
            reference: "CHA1B2C3".to_string(),
            trip_type: if round_trip { TripType::RoundTrip } else { TripType::OneWay },
            origin: "UBN".to_string(),
            destination: "HND".to_string(),
            outbound,
            return_leg,
            passengers: vec![passenger("Jane"), passenger("John")],
            contact: Contact {
                name: "Jane Doe".to_string(),
                email: Masked::new("jane@example.com".to_string()),
                phone: Masked::new("+976 9911 2233".to_string()),
            },
            total_price: per_seat * 2,
            currency: "USD".to_string(),
            payment_method: PaymentMethod::Card,
            language: Language::En,
            created_at: Utc::now(),
        }
    }
}
