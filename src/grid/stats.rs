use serde::Serialize;
use super::availability::AvailabilityGrid;
use super::types::{CellCoord, CellState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellCounts {
    pub booked: u32,
    pub blocked: u32,
    pub free: u32,
}

impl CellCounts {
    fn record(&mut self, state: &CellState) {
        match state {
            CellState::Booked(_) => self.booked += 1,
            CellState::Blocked => self.blocked += 1,
            CellState::Empty | CellState::Selecting => self.free += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceCounts {
    pub resource: String,
    #[serde(flatten)]
    pub counts: CellCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCounts {
    pub time: String,
    #[serde(flatten)]
    pub counts: CellCounts,
}

/// Load per column and per row, counted over every cell regardless of visibility.
/// Rows and columns keep the grid's construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyStats {
    pub per_resource: Vec<ResourceCounts>,
    pub per_slot: Vec<SlotCounts>,
    pub total: CellCounts,
}

impl OccupancyStats {
    pub fn for_resource(&self, resource: &str) -> Option<&CellCounts> {
        self.per_resource.iter().find(|r| r.resource == resource).map(|r| &r.counts)
    }

    pub fn for_slot(&self, time: &str) -> Option<&CellCounts> {
        self.per_slot.iter().find(|s| s.time == time).map(|s| &s.counts)
    }
}

impl AvailabilityGrid {
    pub fn occupancy(&self) -> OccupancyStats {
        let mut per_resource: Vec<ResourceCounts> = self
            .resources()
            .iter()
            .map(|r| ResourceCounts { resource: r.to_string(), counts: CellCounts::default() })
            .collect();
        let mut total = CellCounts::default();
        let mut per_slot = Vec::with_capacity(self.slots().len());

        for time in self.slots() {
            let mut row = CellCounts::default();
            for (resource, column) in self.resources().iter().zip(per_resource.iter_mut()) {
                let coord = CellCoord::new(time.clone(), resource.clone());
                let Some(state) = self.cell_state(&coord) else {
                    continue;
                };
                column.counts.record(&state);
                row.record(&state);
                total.record(&state);
            }
            per_slot.push(SlotCounts { time: time.to_string(), counts: row });
        }

        OccupancyStats { per_resource, per_slot, total }
    }
}
