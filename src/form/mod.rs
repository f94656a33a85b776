pub mod reservation;

pub use reservation::{ReservationRequest, validate_reservation};
