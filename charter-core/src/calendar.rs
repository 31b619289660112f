//! Departure/return date selection over two independently paginated month
//! grids.
//!
//! The picker keeps a *tentative* selection that the user can change freely
//! and only hands indices back to the caller on [`DatePicker::apply`].
//! Tentative picks are stored as calendar dates, so paging through months
//! never invalidates them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::availability::{month_grid, offset_of, DateOption, MonthDay, MonthGrid};
use crate::booking::TripType;

/// Month shifts allowed while locating the externally selected date.
pub const MAX_INIT_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Departure,
    Return,
}

/// Indices into the caller's availability sequences that are currently
/// committed outside the picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSelection {
    pub departure_index: Option<usize>,
    pub return_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStatus {
    /// No data loaded yet.
    Pending,
    /// Data loaded but the caller had nothing selected for this leg.
    Unselected,
    Located,
    /// The external index was out of range or its month could not be reached.
    NotFound,
}

/// Validation messages shown next to the calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum SelectionError {
    #[error("No return flights are available on or after the selected departure date")]
    NoReturnAvailable,
    #[error("Return date cannot be before departure date")]
    ReturnBeforeDeparture,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("{date} cannot be selected for {leg:?}")]
    DateUnavailable { leg: Leg, date: NaiveDate },
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("Selection is incomplete")]
    NotApplicable,
    #[error("{date} is missing from the {leg:?} availability list")]
    IndexNotFound { leg: Leg, date: NaiveDate },
}

/// Receives the committed selection. Mirrors the callbacks a form passes to
/// the calendar popup.
pub trait SelectionHandler {
    fn on_departure_selected(&mut self, index: usize);
    fn on_return_selected(&mut self, index: usize);
    fn on_close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommittedSelection {
    pub departure_index: usize,
    pub return_index: Option<usize>,
}

#[derive(Debug, Clone)]
struct LegState {
    options: Vec<DateOption>,
    offset: i32,
    tentative: Option<NaiveDate>,
    init: InitStatus,
}

impl LegState {
    fn empty() -> Self {
        Self {
            options: Vec::new(),
            offset: 0,
            tentative: None,
            init: InitStatus::Pending,
        }
    }

    fn option(&self, date: NaiveDate) -> Option<&DateOption> {
        self.options.iter().find(|o| o.date == date)
    }

    fn has_flight(&self, date: NaiveDate) -> bool {
        self.option(date).is_some_and(|o| o.has_flight)
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.options.iter().position(|o| o.date == date)
    }

    /// Finds the externally selected date in the visible month, paging to
    /// its month when it is elsewhere.
    fn locate(&mut self, today: NaiveDate, index: Option<usize>) {
        self.tentative = None;
        let Some(index) = index else {
            self.init = InitStatus::Unselected;
            return;
        };
        let Some(date) = self.options.get(index).map(|o| o.date) else {
            warn!("External selection {} is outside {} availability entries", index, self.options.len());
            self.init = InitStatus::NotFound;
            return;
        };

        for attempt in 0..MAX_INIT_ATTEMPTS {
            let grid = month_grid(&self.options, today, self.offset);
            if grid.find_in_month(date).is_some() {
                debug!("Located {} at month offset {} after {} shift(s)", date, self.offset, attempt);
                self.tentative = Some(date);
                self.init = InitStatus::Located;
                return;
            }
            self.offset = offset_of(today, date);
        }

        warn!("Could not locate {} after {} attempts", date, MAX_INIT_ATTEMPTS);
        self.init = InitStatus::NotFound;
    }
}

#[derive(Debug, Clone)]
pub struct DatePicker {
    today: NaiveDate,
    trip_type: TripType,
    departure: LegState,
    ret: LegState,
    error: Option<SelectionError>,
}

impl DatePicker {
    pub fn new(today: NaiveDate, trip_type: TripType) -> Self {
        Self {
            today,
            trip_type,
            departure: LegState::empty(),
            ret: LegState::empty(),
            error: None,
        }
    }

    /// Replaces both availability sequences and re-runs initialization
    /// against the caller's current selection.
    pub fn load(
        &mut self,
        departures: Vec<DateOption>,
        returns: Vec<DateOption>,
        selection: ExternalSelection,
    ) {
        self.departure = LegState { options: departures, ..LegState::empty() };
        self.ret = LegState { options: returns, ..LegState::empty() };
        self.error = None;

        self.departure.locate(self.today, selection.departure_index);
        match self.trip_type {
            TripType::RoundTrip => self.ret.locate(self.today, selection.return_index),
            TripType::OneWay => self.ret.init = InitStatus::Unselected,
        }
    }

    pub fn trip_type(&self) -> TripType {
        self.trip_type
    }

    pub fn set_trip_type(&mut self, trip_type: TripType) {
        self.trip_type = trip_type;
        match trip_type {
            TripType::OneWay => {
                self.ret.tentative = None;
                self.error = None;
            }
            TripType::RoundTrip => {
                if let Some(departure) = self.departure.tentative {
                    self.reconcile_return(departure);
                }
            }
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn init_status(&self, leg: Leg) -> InitStatus {
        self.leg(leg).init
    }

    pub fn offset(&self, leg: Leg) -> i32 {
        self.leg(leg).offset
    }

    pub fn tentative(&self, leg: Leg) -> Option<NaiveDate> {
        self.leg(leg).tentative
    }

    pub fn error(&self) -> Option<SelectionError> {
        self.error
    }

    /// The month currently shown for `leg`.
    pub fn grid(&self, leg: Leg) -> MonthGrid {
        let state = self.leg(leg);
        month_grid(&state.options, self.today, state.offset)
    }

    pub fn next_month(&mut self, leg: Leg) -> MonthGrid {
        self.leg_mut(leg).offset += 1;
        self.grid(leg)
    }

    pub fn prev_month(&mut self, leg: Leg) -> MonthGrid {
        self.leg_mut(leg).offset -= 1;
        self.grid(leg)
    }

    pub fn is_disabled(&self, leg: Leg, day: &MonthDay) -> bool {
        if !day.has_flight || !day.is_current_month {
            return true;
        }
        match (leg, self.departure.tentative) {
            (Leg::Return, Some(departure)) => day.date < departure,
            _ => false,
        }
    }

    pub fn select(&mut self, leg: Leg, date: NaiveDate) -> Result<(), CalendarError> {
        if leg == Leg::Return && self.trip_type == TripType::OneWay {
            return Err(CalendarError::DateUnavailable { leg, date });
        }

        let grid = self.grid(leg);
        let day = grid
            .find(date)
            .ok_or(CalendarError::DateUnavailable { leg, date })?;

        if !day.has_flight || !day.is_current_month {
            return Err(CalendarError::DateUnavailable { leg, date });
        }

        if leg == Leg::Return {
            if let Some(departure) = self.departure.tentative {
                if date < departure {
                    self.error = Some(SelectionError::ReturnBeforeDeparture);
                    return Err(SelectionError::ReturnBeforeDeparture.into());
                }
            }
        }

        self.error = None;
        match leg {
            Leg::Departure => {
                self.departure.tentative = Some(date);
                if self.trip_type == TripType::RoundTrip {
                    self.reconcile_return(date);
                }
            }
            Leg::Return => self.ret.tentative = Some(date),
        }
        Ok(())
    }

    /// Replaces a missing or now-invalid return pick with the first bookable
    /// return on or after `departure`.
    fn reconcile_return(&mut self, departure: NaiveDate) {
        let still_valid = self.ret.tentative.is_some_and(|r| r >= departure);
        if still_valid {
            return;
        }

        let next = self
            .ret
            .options
            .iter()
            .filter(|o| o.has_flight && o.date >= departure)
            .map(|o| o.date)
            .min();

        match next {
            Some(date) => {
                debug!("Auto-selected return {} for departure {}", date, departure);
                self.ret.tentative = Some(date);
                self.ret.offset = offset_of(self.today, date);
                self.error = None;
            }
            None => {
                self.ret.tentative = None;
                self.error = Some(SelectionError::NoReturnAvailable);
            }
        }
    }

    pub fn can_apply(&self) -> bool {
        let Some(departure) = self.departure.tentative else {
            return false;
        };
        if !self.departure.has_flight(departure) {
            return false;
        }
        match self.trip_type {
            TripType::OneWay => true,
            TripType::RoundTrip => self
                .ret
                .tentative
                .is_some_and(|r| self.ret.has_flight(r) && r >= departure),
        }
    }

    /// Commits the tentative selection: maps dates back to indices in the
    /// caller's sequences, fires the handler callbacks, then closes.
    pub fn apply<H>(&mut self, handler: &mut H) -> Result<CommittedSelection, CalendarError>
    where
        H: SelectionHandler + ?Sized,
    {
        if !self.can_apply() {
            return Err(CalendarError::NotApplicable);
        }
        let departure = self.departure.tentative.ok_or(CalendarError::NotApplicable)?;
        let departure_index = self
            .departure
            .index_of(departure)
            .ok_or(CalendarError::IndexNotFound { leg: Leg::Departure, date: departure })?;

        let return_index = match self.trip_type {
            TripType::OneWay => None,
            TripType::RoundTrip => {
                let date = self.ret.tentative.ok_or(CalendarError::NotApplicable)?;
                Some(
                    self.ret
                        .index_of(date)
                        .ok_or(CalendarError::IndexNotFound { leg: Leg::Return, date })?,
                )
            }
        };

        handler.on_departure_selected(departure_index);
        if let Some(index) = return_index {
            handler.on_return_selected(index);
        }
        handler.on_close();

        Ok(CommittedSelection { departure_index, return_index })
    }

    fn leg(&self, leg: Leg) -> &LegState {
        match leg {
            Leg::Departure => &self.departure,
            Leg::Return => &self.ret,
        }
    }

    fn leg_mut(&mut self, leg: Leg) -> &mut LegState {
        match leg {
            Leg::Departure => &mut self.departure,
            Leg::Return => &mut self.ret,
        }
    }
}
