//! Booking calendar for service bays: a fixed grid of time slots by
//! resources, with a single active selection and row/column visibility
//! toggles, plus the CSV snapshot loader, text rendering and HTTP view
//! built around it.

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod grid;
pub mod parser;
pub mod telemetry;
pub mod web;

pub use error::{FormError, GridError, SnapshotError};
pub use grid::{AvailabilityGrid, Booking, CellAction, CellCoord, CellState, ReservationDraft, Resource, TimeSlot};
