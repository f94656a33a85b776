use thiserror::Error;

/// Errors raised while building a grid from slots, resources and a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("invalid time slot '{0}', expected HH:MM")]
    InvalidTimeSlot(String),

    #[error("time slot {later} does not come after {earlier}")]
    SlotsOutOfOrder { earlier: String, later: String },

    #[error("resource name must not be empty")]
    EmptyResource,

    #[error("duplicate resource '{0}'")]
    DuplicateResource(String),

    #[error("snapshot cell {time} / {resource} is outside the grid")]
    UnknownCell { time: String, resource: String },

    #[error("snapshot cell {time} / {resource} cannot start in the selecting state")]
    SelectingInSnapshot { time: String, resource: String },

    #[error("slot interval must be a positive number of minutes")]
    ZeroInterval,

    #[error("closing time {close} must be after opening time {open}")]
    EmptyOpeningHours { open: String, close: String },
}

/// Errors raised while loading a bookings CSV into a grid snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: GridError,
    },

    #[error("line {line}: unknown status '{status}'")]
    UnknownStatus { line: u64, status: String },

    #[error("line {line}: booked cell needs a vehicle label")]
    MissingVehicle { line: u64 },
}

/// Errors raised while validating the details of a new reservation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("plate number '{0}' is not valid")]
    InvalidPlate(String),

    #[error("{time} / {resource} is not part of this calendar")]
    UnknownCell { time: String, resource: String },

    #[error("{time} / {resource} is not free")]
    CellTaken { time: String, resource: String },
}
