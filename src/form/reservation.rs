use serde::{Deserialize, Serialize};
use crate::error::FormError;
use crate::grid::{AvailabilityGrid, Booking, CellCoord, Resource, TimeSlot};

/// Reservation details entered for a cell picked with "add reservation"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub time: String,
    pub resource: String,
    pub vehicle_label: String,
    pub plate_number: String,
    pub service_type: String,
}

fn valid_plate(plate: &str) -> bool {
    let len = plate.chars().count();
    (2..=12).contains(&len)
        && plate.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
        && plate.chars().any(|c| c.is_ascii_alphanumeric())
}

/// Validates a reservation against the grid it targets.
///
/// Returns the booking to pass on to the reservation service. The grid is not
/// changed: the cell shows as booked once a fresh listing contains it.
pub fn validate_reservation(req: &ReservationRequest, grid: &AvailabilityGrid) -> Result<Booking, FormError> {
    let vehicle_label = req.vehicle_label.trim();
    if vehicle_label.is_empty() {
        return Err(FormError::Required("Vehicle"));
    }

    let plate_number = req.plate_number.trim().to_uppercase();
    if plate_number.is_empty() {
        return Err(FormError::Required("Plate number"));
    }
    if !valid_plate(&plate_number) {
        return Err(FormError::InvalidPlate(req.plate_number.trim().to_string()));
    }

    let service_type = req.service_type.trim();
    if service_type.is_empty() {
        return Err(FormError::Required("Service type"));
    }

    let unknown = || FormError::UnknownCell {
        time: req.time.trim().to_string(),
        resource: req.resource.trim().to_string(),
    };
    let time = TimeSlot::parse(&req.time).map_err(|_| unknown())?;
    let resource = Resource::new(&req.resource).map_err(|_| unknown())?;
    let coord = CellCoord::new(time, resource);

    match grid.cell_state(&coord) {
        None => Err(unknown()),
        Some(state) if !state.is_free() => Err(FormError::CellTaken {
            time: coord.time.to_string(),
            resource: coord.resource.to_string(),
        }),
        Some(_) => Ok(Booking {
            vehicle_label: vehicle_label.to_string(),
            plate_number,
            service_type: service_type.to_string(),
        }),
    }
}
