//! Time-based charges.
//!
//! Stays are billed per started hour, with a minimum of one hour.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// The outcome of pricing a stay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Charge {
    /// Exact length of the stay in hours.
    pub hours_parked: f64,
    /// Hours billed after rounding up.
    pub billed_hours: u64,
    /// The hourly rate applied.
    pub hourly_rate: f64,
    /// Total amount due.
    pub amount: f64,
}

/// Error returned when a stay ends before it starts.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("Invalid duration: exit time {exit} is before entry time {entry}")]
pub struct InvalidDuration {
    /// When the stay started.
    pub entry: DateTime<Utc>,
    /// When the stay was claimed to end.
    pub exit: DateTime<Utc>,
}

/// Prices a stay from `entry` to `exit` at `hourly_rate`.
///
/// ```
/// use chrono::{TimeDelta, Utc};
///
/// let entry = Utc::now();
/// let charge = parking::billing::charge(100.0, entry, entry + TimeDelta::minutes(90)).unwrap();
/// assert_eq!(charge.billed_hours, 2);
/// assert_eq!(charge.amount, 200.0);
/// ```
///
/// # Errors
///
/// Returns [`InvalidDuration`] if `exit` is earlier than `entry`.
pub fn charge(
    hourly_rate: f64,
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
) -> Result<Charge, InvalidDuration> {
    if exit < entry {
        return Err(InvalidDuration { entry, exit });
    }
    Ok(quote(hourly_rate, exit - entry))
}

/// Prices a stay of known, non-negative length.
///
/// Negative durations are billed as zero-length stays.
#[must_use]
pub fn quote(hourly_rate: f64, duration: TimeDelta) -> Charge {
    let hours_parked = duration.num_milliseconds().max(0) as f64 / MILLIS_PER_HOUR;
    let billed_hours = (hours_parked.ceil() as u64).max(1);
    Charge {
        hours_parked,
        billed_hours,
        hourly_rate,
        amount: hourly_rate * billed_hours as f64,
    }
}
