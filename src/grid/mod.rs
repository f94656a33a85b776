pub mod types;
pub mod slot_utils;
pub mod availability;
pub mod stats;

pub use types::{Booking, CellAction, CellCoord, CellState, ReservationDraft, Resource, TimeSlot};
pub use availability::AvailabilityGrid;
pub use slot_utils::calculate_time_slots;
pub use stats::{CellCounts, OccupancyStats, ResourceCounts, SlotCounts};
