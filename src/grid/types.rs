use std::fmt;
use serde::{Serialize, Deserialize};
use crate::error::GridError;
use super::slot_utils::{minutes_to_time_string, parse_time_to_minutes};

/// A bookable row of the calendar, always held in normalised `HH:MM` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    // Field order matters: ordering is chronological first.
    minutes: u32,
    label: String,
}

impl TimeSlot {
    pub fn parse(label: &str) -> Result<Self, GridError> {
        let minutes = parse_time_to_minutes(label)
            .ok_or_else(|| GridError::InvalidTimeSlot(label.to_string()))?;
        Ok(Self::from_minutes(minutes))
    }

    pub(crate) fn from_minutes(minutes: u32) -> Self {
        TimeSlot {
            minutes,
            label: minutes_to_time_string(minutes),
        }
    }

    /// Minutes since midnight
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.label
    }
}

/// A bookable column of the calendar: a bay, box or service station
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resource(String);

impl Resource {
    pub fn new(name: &str) -> Result<Self, GridError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GridError::EmptyResource);
        }
        Ok(Resource(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Resource {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Resource::new(&value)
    }
}

impl From<Resource> for String {
    fn from(resource: Resource) -> Self {
        resource.0
    }
}

/// Address of one cell: (row, column)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub time: TimeSlot,
    pub resource: Resource,
}

impl CellCoord {
    pub fn new(time: TimeSlot, resource: Resource) -> Self {
        CellCoord { time, resource }
    }

    /// Builds a coordinate from raw labels, e.g. `("09:00", "Engine 1")`
    pub fn parse(time: &str, resource: &str) -> Result<Self, GridError> {
        Ok(CellCoord {
            time: TimeSlot::parse(time)?,
            resource: Resource::new(resource)?,
        })
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.time, self.resource)
    }
}

/// An existing reservation as delivered by the booking listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub vehicle_label: String,
    pub plate_number: String,
    pub service_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CellState {
    Empty,
    Booked(Booking),
    Blocked,
    /// The operator is choosing what to do with this empty cell
    Selecting,
}

impl CellState {
    pub fn is_free(&self) -> bool {
        matches!(self, CellState::Empty | CellState::Selecting)
    }
}

/// The two choices offered on a selecting cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellAction {
    AddReservation,
    MarkUnavailable,
}

/// Handed to the reservation-creation flow when the operator picks "add reservation"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub coord: CellCoord,
}
