use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use crate::grid::{AvailabilityGrid, CellCoord, CellState};

const TIME_COLUMN_WIDTH: usize = 6;

/// Short text for one cell in the matrix view
fn cell_label(state: &CellState) -> String {
    match state {
        CellState::Empty => ".".to_string(),
        CellState::Booked(booking) if booking.plate_number.is_empty() => format!("[{}]", booking.vehicle_label),
        CellState::Booked(booking) => format!("[{}]", booking.plate_number),
        CellState::Blocked => "XX".to_string(),
        CellState::Selecting => "??".to_string(),
    }
}

/// Renders the visible part of the grid as a matrix: one line per time slot,
/// one column per resource
pub fn render_grid(grid: &AvailabilityGrid) -> String {
    let resources = grid.visible_resources();
    let slots = grid.visible_slots();

    let widths: Vec<usize> = resources
        .iter()
        .map(|resource| {
            slots
                .iter()
                .filter_map(|time| grid.cell_state(&CellCoord::new(time.clone(), resource.clone())))
                .map(|state| cell_label(&state).chars().count())
                .chain(std::iter::once(resource.as_str().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let mut header = format!("{:<width$}", "", width = TIME_COLUMN_WIDTH);
    for (resource, width) in resources.iter().zip(&widths) {
        let _ = write!(header, " | {:<width$}", resource.as_str(), width = width);
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for time in &slots {
        let mut line = format!("{:<width$}", time.as_str(), width = TIME_COLUMN_WIDTH);
        for (resource, width) in resources.iter().zip(&widths) {
            let state = grid
                .cell_state(&CellCoord::new(time.clone(), resource.clone()))
                .unwrap_or(CellState::Empty);
            let _ = write!(line, " | {:<width$}", cell_label(&state), width = width);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Renders the bookings as a list: `HH:MM resource plate vehicle (service)`
pub fn render_booking_list(grid: &AvailabilityGrid) -> String {
    let mut out = String::new();
    for (coord, booking) in grid.bookings() {
        let mut line = format!("{} {}", coord.time, coord.resource);
        if !booking.plate_number.is_empty() {
            let _ = write!(line, " {}", booking.plate_number);
        }
        let _ = write!(line, " {}", booking.vehicle_label);
        if !booking.service_type.is_empty() {
            let _ = write!(line, " ({})", booking.service_type);
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Writes the matrix view to a file, headed by `** title **`
pub fn write_grid_to_file<P: AsRef<Path>>(
    title: &str,
    grid: &AvailabilityGrid,
    path: P,
) -> Result<(), std::io::Error> {
    let mut file = File::create(path)?;
    writeln!(file, "** {} **", title)?;
    file.write_all(render_grid(grid).as_bytes())?;
    Ok(())
}
