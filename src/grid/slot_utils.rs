use chrono::{NaiveTime, Timelike};
use crate::error::GridError;
use super::types::TimeSlot;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parses a time string (HH:MM) to minutes since midnight
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let time = NaiveTime::parse_from_str(time_str.trim(), "%H:%M").ok()?;
    Some(time.hour() * 60 + time.minute())
}

/// Formats minutes since midnight to time string (HH:MM)
pub fn minutes_to_time_string(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Calculates the rows of a calendar day from opening hours
/// Slot 1 = open
/// Slot n = open + (n - 1) * interval
/// Continues while the slot starts strictly before close
pub fn calculate_time_slots(open: &str, close: &str, interval_minutes: u32) -> Result<Vec<TimeSlot>, GridError> {
    if interval_minutes == 0 {
        return Err(GridError::ZeroInterval);
    }
    let open_minutes = parse_time_to_minutes(open)
        .ok_or_else(|| GridError::InvalidTimeSlot(open.to_string()))?;
    let close_minutes = parse_time_to_minutes(close)
        .ok_or_else(|| GridError::InvalidTimeSlot(close.to_string()))?;
    if close_minutes <= open_minutes {
        return Err(GridError::EmptyOpeningHours {
            open: open.to_string(),
            close: close.to_string(),
        });
    }

    let slots = (open_minutes..close_minutes)
        .step_by(interval_minutes as usize)
        .map(TimeSlot::from_minutes)
        .collect();
    Ok(slots)
}
