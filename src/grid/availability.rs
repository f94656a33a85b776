use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use crate::error::GridError;
use super::types::{Booking, CellAction, CellCoord, CellState, ReservationDraft, Resource, TimeSlot};

/// Booking calendar for one day: time slots as rows, resources as columns.
///
/// Slots and resources are fixed at construction. Cells are stored sparsely,
/// a coordinate with no entry is `Empty`. The selecting state is never stored
/// per cell; it is derived from the single `active` pointer.
#[derive(Debug, Clone)]
pub struct AvailabilityGrid {
    slots: Vec<TimeSlot>,
    resources: Vec<Resource>,
    cells: HashMap<CellCoord, CellState>,
    active: Option<CellCoord>,
    slot_visibility: HashMap<TimeSlot, bool>,
    resource_visibility: HashMap<Resource, bool>,
}

impl AvailabilityGrid {
    /// Builds a grid from chronologically ordered slots, ordered resources and
    /// an initial snapshot of `Empty` / `Booked` / `Blocked` cells
    pub fn new<I>(slots: Vec<TimeSlot>, resources: Vec<Resource>, snapshot: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (CellCoord, CellState)>,
    {
        for pair in slots.windows(2) {
            if pair[1] <= pair[0] {
                return Err(GridError::SlotsOutOfOrder {
                    earlier: pair[0].to_string(),
                    later: pair[1].to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for resource in &resources {
            if !seen.insert(resource) {
                return Err(GridError::DuplicateResource(resource.to_string()));
            }
        }

        let mut grid = AvailabilityGrid {
            slot_visibility: slots.iter().map(|s| (s.clone(), true)).collect(),
            resource_visibility: resources.iter().map(|r| (r.clone(), true)).collect(),
            slots,
            resources,
            cells: HashMap::new(),
            active: None,
        };

        for (coord, state) in snapshot {
            if !grid.contains(&coord) {
                return Err(GridError::UnknownCell {
                    time: coord.time.to_string(),
                    resource: coord.resource.to_string(),
                });
            }
            match state {
                CellState::Empty => {
                    grid.cells.remove(&coord);
                }
                CellState::Selecting => {
                    return Err(GridError::SelectingInSnapshot {
                        time: coord.time.to_string(),
                        resource: coord.resource.to_string(),
                    });
                }
                state => {
                    grid.cells.insert(coord, state);
                }
            }
        }

        debug!(
            slots = grid.slots.len(),
            resources = grid.resources.len(),
            occupied = grid.cells.len(),
            "availability grid constructed"
        );
        Ok(grid)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn has_slot(&self, time: &TimeSlot) -> bool {
        self.slots.binary_search(time).is_ok()
    }

    pub fn has_resource(&self, resource: &Resource) -> bool {
        self.resources.contains(resource)
    }

    pub fn contains(&self, coord: &CellCoord) -> bool {
        self.has_slot(&coord.time) && self.has_resource(&coord.resource)
    }

    pub fn active_cell(&self) -> Option<&CellCoord> {
        self.active.as_ref()
    }

    /// State of one cell as the calendar shows it, `None` outside the grid
    pub fn cell_state(&self, coord: &CellCoord) -> Option<CellState> {
        if !self.contains(coord) {
            return None;
        }
        match self.cells.get(coord) {
            Some(state) => Some(state.clone()),
            None if self.active.as_ref() == Some(coord) => Some(CellState::Selecting),
            None => Some(CellState::Empty),
        }
    }

    /// Points the selection at `coord`, or clears it with `None`.
    /// Any previously selected cell reverts to its stored state.
    pub fn set_active_cell(&mut self, coord: Option<CellCoord>) {
        match coord {
            Some(coord) if !self.contains(&coord) => {
                warn!(cell = %coord, "ignoring selection outside the grid");
            }
            coord => {
                debug!(cell = ?coord.as_ref().map(|c| c.to_string()), "active cell changed");
                self.active = coord;
            }
        }
    }

    /// Blocks a cell regardless of what it held before, and drops the selection
    /// if it pointed at this cell
    pub fn mark_unavailable(&mut self, coord: &CellCoord) {
        if !self.contains(coord) {
            warn!(cell = %coord, "ignoring block request outside the grid");
            return;
        }
        self.cells.insert(coord.clone(), CellState::Blocked);
        if self.active.as_ref() == Some(coord) {
            self.active = None;
        }
        debug!(cell = %coord, "cell marked unavailable");
    }

    /// Applies the operator's choice to the active cell.
    ///
    /// `AddReservation` releases the selection and returns the draft for the
    /// reservation-creation flow; the cell itself stays empty until a fresh
    /// snapshot lists the booking. Without an active cell nothing happens.
    pub fn choose_action(&mut self, action: CellAction) -> Option<ReservationDraft> {
        let coord = self.active.clone()?;
        match action {
            CellAction::MarkUnavailable => {
                self.mark_unavailable(&coord);
                None
            }
            CellAction::AddReservation => {
                self.active = None;
                debug!(cell = %coord, "handing cell to reservation flow");
                Some(ReservationDraft { coord })
            }
        }
    }

    pub fn toggle_resource_visibility(&mut self, resource: &Resource) {
        let visible = self.resource_visibility.entry(resource.clone()).or_insert(true);
        *visible = !*visible;
    }

    pub fn toggle_time_slot_visibility(&mut self, time: &TimeSlot) {
        let visible = self.slot_visibility.entry(time.clone()).or_insert(true);
        *visible = !*visible;
    }

    pub fn is_resource_visible(&self, resource: &Resource) -> bool {
        self.resource_visibility.get(resource).copied().unwrap_or(true)
    }

    pub fn is_slot_visible(&self, time: &TimeSlot) -> bool {
        self.slot_visibility.get(time).copied().unwrap_or(true)
    }

    /// Visible rows in construction order
    pub fn visible_slots(&self) -> Vec<TimeSlot> {
        self.slots.iter().filter(|s| self.is_slot_visible(s)).cloned().collect()
    }

    /// Visible columns in construction order
    pub fn visible_resources(&self) -> Vec<Resource> {
        self.resources.iter().filter(|r| self.is_resource_visible(r)).cloned().collect()
    }

    /// Visible cells, row by row
    pub fn cells(&self) -> Vec<(CellCoord, CellState)> {
        let resources = self.visible_resources();
        let mut out = Vec::with_capacity(self.slots.len() * resources.len());
        for time in self.visible_slots() {
            for resource in &resources {
                let coord = CellCoord::new(time.clone(), resource.clone());
                if let Some(state) = self.cell_state(&coord) {
                    out.push((coord, state));
                }
            }
        }
        out
    }

    /// All booked cells, chronologically and then in column order
    pub fn bookings(&self) -> Vec<(CellCoord, &Booking)> {
        let mut out = Vec::new();
        for time in &self.slots {
            for resource in &self.resources {
                let coord = CellCoord::new(time.clone(), resource.clone());
                if let Some(CellState::Booked(booking)) = self.cells.get(&coord) {
                    out.push((coord, booking));
                }
            }
        }
        out
    }
}
