use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::flight::{Flight, FlightStatus};

/// One calendar day's flight availability for a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOption {
    pub date: NaiveDate,
    #[serde(default)]
    pub price: Option<i32>,
    pub has_flight: bool,
    #[serde(default)]
    pub has_any_flight: bool,
}

impl DateOption {
    pub fn unavailable(date: NaiveDate) -> Self {
        Self {
            date,
            price: None,
            has_flight: false,
            has_any_flight: false,
        }
    }
}

/// A grid cell: a `DateOption` tagged with whether it belongs to the
/// displayed month or is padding from an adjacent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub price: Option<i32>,
    pub has_flight: bool,
    pub has_any_flight: bool,
    pub is_current_month: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub offset: i32,
    pub days: Vec<MonthDay>,
}

impl MonthGrid {
    pub fn find(&self, date: NaiveDate) -> Option<&MonthDay> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Looks the date up among the days of the displayed month only.
    pub fn find_in_month(&self, date: NaiveDate) -> Option<&MonthDay> {
        self.days
            .iter()
            .find(|d| d.is_current_month && d.date == date)
    }
}

/// First day of the month `offset` months away from `today`'s month.
pub fn month_start(today: NaiveDate, offset: i32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    let shifted = if offset >= 0 {
        first.checked_add_months(Months::new(offset as u32))
    } else {
        first.checked_sub_months(Months::new(offset.unsigned_abs()))
    };
    shifted.unwrap_or(first)
}

/// Number of months between `today`'s month and `date`'s month.
pub fn offset_of(today: NaiveDate, date: NaiveDate) -> i32 {
    (date.year() - today.year()) * 12 + (date.month() as i32 - today.month() as i32)
}

/// Builds the Monday-first grid for the month at `offset`, matching every
/// day against `options` by calendar date. Unmatched days are unavailable.
pub fn month_grid(options: &[DateOption], today: NaiveDate, offset: i32) -> MonthGrid {
    let first = month_start(today, offset);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);

    let lead = u64::from(first.weekday().num_days_from_monday());
    let trail = u64::from(6 - last.weekday().num_days_from_monday());
    let grid_start = first.checked_sub_days(Days::new(lead)).unwrap_or(first);
    let grid_end = last.checked_add_days(Days::new(trail)).unwrap_or(last);

    let days = grid_start
        .iter_days()
        .take_while(|d| *d <= grid_end)
        .map(|date| {
            let option = options
                .iter()
                .find(|o| o.date == date)
                .cloned()
                .unwrap_or_else(|| DateOption::unavailable(date));
            MonthDay {
                date,
                price: option.price,
                has_flight: option.has_flight,
                has_any_flight: option.has_any_flight,
                is_current_month: date.month() == first.month() && date.year() == first.year(),
            }
        })
        .collect();

    MonthGrid {
        year: first.year(),
        month: first.month(),
        offset,
        days,
    }
}

/// Collapses the scheduled flights of a route into one `DateOption` per day
/// in `start..=end`.
pub fn aggregate_availability(
    flights: &[Flight],
    start: NaiveDate,
    end: NaiveDate,
    passengers: u32,
) -> Vec<DateOption> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let scheduled = flights
                .iter()
                .filter(|f| f.status == FlightStatus::Scheduled && f.departure_time.date() == date);

            let mut has_any_flight = false;
            let mut price: Option<i32> = None;
            for flight in scheduled {
                has_any_flight = true;
                if flight.seats_for(passengers) {
                    price = Some(price.map_or(flight.price, |p| p.min(flight.price)));
                }
            }

            DateOption {
                date,
                price,
                has_flight: price.is_some(),
                has_any_flight,
            }
        })
        .collect()
}
