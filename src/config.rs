use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{GridError, SnapshotError};
use crate::grid::{calculate_time_slots, AvailabilityGrid, Resource};
use crate::parser::load_snapshot;

#[derive(Parser, Debug)]
#[command(name = "bay-calendar", version, about = "Service bay booking calendar")]
pub struct Cli {
    #[command(flatten)]
    pub layout: GridLayout,

    #[command(subcommand)]
    pub command: Command,
}

/// Rows, columns and initial bookings of the calendar
#[derive(Args, Debug, Clone)]
pub struct GridLayout {
    /// First bookable time (HH:MM)
    #[arg(long, env = "BAY_OPEN", default_value = "08:00")]
    pub open: String,

    /// Closing time (HH:MM), no slot starts at or after it
    #[arg(long, env = "BAY_CLOSE", default_value = "18:00")]
    pub close: String,

    /// Slot length in minutes
    #[arg(long, env = "BAY_INTERVAL", default_value_t = 30)]
    pub interval: u32,

    /// Comma separated bay names, in display order
    #[arg(long, env = "BAY_RESOURCES", value_delimiter = ',', required = true)]
    pub resources: Vec<String>,

    /// Bookings CSV for the day (time,resource,status,vehicle,plate,service)
    #[arg(long, env = "BAY_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the calendar for the day
    Show {
        /// Heading used when writing to a file
        #[arg(long, default_value = "Service bays")]
        title: String,

        /// Print bookings as a list instead of the grid
        #[arg(long)]
        list: bool,

        /// Also write the grid to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve the calendar over HTTP
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,

        /// Enables snapshot uploads when set
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl GridLayout {
    pub fn build_grid(&self) -> Result<AvailabilityGrid, LayoutError> {
        let slots = calculate_time_slots(&self.open, &self.close, self.interval)?;
        let resources = self
            .resources
            .iter()
            .map(|name| Resource::new(name))
            .collect::<Result<Vec<_>, _>>()?;
        let cells = match &self.snapshot {
            Some(path) => load_snapshot(path)?,
            None => Vec::new(),
        };
        Ok(AvailabilityGrid::new(slots, resources, cells)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_show_with_defaults() {
        let cli = Cli::try_parse_from(["bay-calendar", "--resources", "Engine 1,Battery 1", "show"]).unwrap();
        assert_eq!(cli.layout.open, "08:00");
        assert_eq!(cli.layout.interval, 30);
        assert_eq!(cli.layout.resources, vec!["Engine 1", "Battery 1"]);
        assert!(matches!(cli.command, Command::Show { list: false, output: None, .. }));
    }

    #[test]
    fn builds_grid_from_layout_and_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,resource,status").unwrap();
        writeln!(file, "09:30,Battery 1,blocked").unwrap();

        let layout = GridLayout {
            open: "09:00".into(),
            close: "10:30".into(),
            interval: 30,
            resources: vec!["Engine 1".into(), "Battery 1".into()],
            snapshot: Some(file.path().to_path_buf()),
        };
        let grid = layout.build_grid().unwrap();

        assert_eq!(grid.slots().len(), 3);
        assert_eq!(grid.occupancy().total.blocked, 1);
    }

    #[test]
    fn snapshot_outside_opening_hours_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,resource,status").unwrap();
        writeln!(file, "19:00,Engine 1,blocked").unwrap();

        let layout = GridLayout {
            open: "09:00".into(),
            close: "18:00".into(),
            interval: 30,
            resources: vec!["Engine 1".into()],
            snapshot: Some(file.path().to_path_buf()),
        };
        assert!(matches!(layout.build_grid(), Err(LayoutError::Grid(GridError::UnknownCell { .. }))));
    }
}
