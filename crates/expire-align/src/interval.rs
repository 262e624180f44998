//! Interval types and parameter validation.
//!
//! [`IntervalType`] is a closed set: a value of this type is always one of
//! the three supported units. Untyped input (strings, legacy integer codes)
//! goes through [`FromStr`] or [`TryFrom<i32>`], which reject anything else
//! with [`ExpireError::InvalidArgument`].

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::{ExpireError, Result};

/// The time unit an interval is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalType {
    /// Align on seconds within a minute (cycle of 60).
    #[serde(alias = "seconds", alias = "s")]
    Second,
    /// Align on minutes within an hour (cycle of 60).
    #[serde(alias = "minutes", alias = "m")]
    Minute,
    /// Align on hours within a day (cycle of 24).
    #[serde(alias = "hours", alias = "h")]
    Hour,
}

impl IntervalType {
    /// All supported interval types, in ascending unit order.
    pub const ALL: [IntervalType; 3] = [IntervalType::Second, IntervalType::Minute, IntervalType::Hour];

    /// Length of one cycle in this unit: 60 seconds, 60 minutes or 24 hours.
    pub const fn cycle_len(self) -> u32 {
        match self {
            IntervalType::Second | IntervalType::Minute => 60,
            IntervalType::Hour => 24,
        }
    }

    /// The component of `dt` this unit aligns on.
    pub fn position<T: Timelike>(self, dt: &T) -> u32 {
        match self {
            IntervalType::Second => dt.second(),
            IntervalType::Minute => dt.minute(),
            IntervalType::Hour => dt.hour(),
        }
    }

    /// Lowercase name, as used by `Display` and serde.
    pub fn as_str(self) -> &'static str {
        match self {
            IntervalType::Second => "second",
            IntervalType::Minute => "minute",
            IntervalType::Hour => "hour",
        }
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalType {
    type Err = ExpireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "second" | "seconds" | "sec" | "s" => Ok(IntervalType::Second),
            "minute" | "minutes" | "min" | "m" => Ok(IntervalType::Minute),
            "hour" | "hours" | "h" => Ok(IntervalType::Hour),
            _ => Err(ExpireError::unknown_interval_type(s.trim())),
        }
    }
}

/// Legacy integer codes: 1 = second, 2 = minute, 3 = hour.
impl TryFrom<i32> for IntervalType {
    type Error = ExpireError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            1 => Ok(IntervalType::Second),
            2 => Ok(IntervalType::Minute),
            3 => Ok(IntervalType::Hour),
            other => Err(ExpireError::unknown_interval_type(other)),
        }
    }
}

impl From<IntervalType> for i32 {
    fn from(interval_type: IntervalType) -> i32 {
        match interval_type {
            IntervalType::Second => 1,
            IntervalType::Minute => 2,
            IntervalType::Hour => 3,
        }
    }
}

/// Check that `interval` is a usable grid spacing and narrow it.
///
/// # Errors
///
/// Returns [`ExpireError::InvalidArgument`] if `interval <= 0`. Intervals
/// beyond `u32::MAX` are clamped, since they behave like any interval of a
/// full cycle or more.
pub fn validate_interval(interval: i64) -> Result<u32> {
    if interval <= 0 {
        return Err(ExpireError::non_positive_interval(interval));
    }
    // Anything at or past a cycle length already yields the grid `[0]`.
    Ok(u32::try_from(interval).unwrap_or(u32::MAX))
}
