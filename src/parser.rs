use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::SnapshotError;
use crate::grid::{Booking, CellCoord, CellState, Resource, TimeSlot};

/// Column positions in a bookings listing
struct Columns {
    time: usize,
    resource: usize,
    status: Option<usize>,
    vehicle: Option<usize>,
    plate: Option<usize>,
    service: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, SnapshotError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        Ok(Columns {
            time: find("time").ok_or(SnapshotError::MissingColumn("time"))?,
            resource: find("resource").ok_or(SnapshotError::MissingColumn("resource"))?,
            status: find("status"),
            vehicle: find("vehicle"),
            plate: find("plate"),
            service: find("service"),
        })
    }
}

fn field<'r>(record: &'r StringRecord, col: Option<usize>) -> &'r str {
    col.and_then(|c| record.get(c)).unwrap_or("").trim()
}

/// Loads the initial cells of a grid from a bookings CSV file
pub fn load_snapshot<P: AsRef<Path>>(csv_path: P) -> Result<Vec<(CellCoord, CellState)>, SnapshotError> {
    let path = csv_path.as_ref();
    let file = std::fs::File::open(path)?;
    let cells = read_snapshot(file)?;
    info!(path = %path.display(), cells = cells.len(), "loaded booking snapshot");
    Ok(cells)
}

/// Reads snapshot cells from any CSV source.
///
/// A later row for the same cell replaces an earlier one. Rows with a blank
/// time or resource are skipped.
pub fn read_snapshot<R: Read>(source: R) -> Result<Vec<(CellCoord, CellState)>, SnapshotError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);
    let columns = Columns::locate(reader.headers()?)?;

    // Keep first-seen order so construction errors point at the earliest row
    let mut order: Vec<CellCoord> = Vec::new();
    let mut cells: HashMap<CellCoord, CellState> = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let time = field(&record, Some(columns.time));
        let resource = field(&record, Some(columns.resource));
        if time.is_empty() || resource.is_empty() {
            debug!(line, "skipping row without time or resource");
            continue;
        }

        let time = TimeSlot::parse(time).map_err(|source| SnapshotError::Row { line, source })?;
        let resource = Resource::new(resource).map_err(|source| SnapshotError::Row { line, source })?;
        let coord = CellCoord::new(time, resource);

        let vehicle = field(&record, columns.vehicle);
        let status = field(&record, columns.status).to_lowercase();
        let state = match status.as_str() {
            "booked" => CellState::Booked(booking_from(&record, &columns, line)?),
            "" if !vehicle.is_empty() => CellState::Booked(booking_from(&record, &columns, line)?),
            "blocked" => CellState::Blocked,
            "empty" | "" => CellState::Empty,
            _ => return Err(SnapshotError::UnknownStatus { line, status: status.clone() }),
        };

        if cells.insert(coord.clone(), state).is_none() {
            order.push(coord);
        } else {
            debug!(line, cell = %coord, "row replaces an earlier listing");
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|coord| cells.remove(&coord).map(|state| (coord, state)))
        .collect())
}

fn booking_from(record: &StringRecord, columns: &Columns, line: u64) -> Result<Booking, SnapshotError> {
    let vehicle_label = field(record, columns.vehicle);
    if vehicle_label.is_empty() {
        return Err(SnapshotError::MissingVehicle { line });
    }
    Ok(Booking {
        vehicle_label: vehicle_label.to_string(),
        plate_number: field(record, columns.plate).to_string(),
        service_type: field(record, columns.service).to_string(),
    })
}
