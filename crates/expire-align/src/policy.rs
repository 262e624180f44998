//! Validated expiry alignment settings.

use serde::{Deserialize, Serialize};

use crate::error::{ExpireError, Result};
use crate::interval::{validate_interval, IntervalType};

/// An `(interval, interval_type)` pair that has passed validation.
///
/// Deserializes from `{"interval": 10, "interval_type": "minute"}` and
/// refuses non-positive intervals, so a surrounding cache can keep its
/// alignment in configuration without re-checking it on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy")]
pub struct ExpiryPolicy {
    interval: u32,
    interval_type: IntervalType,
}

#[derive(Deserialize)]
struct RawPolicy {
    interval: i64,
    interval_type: IntervalType,
}

impl TryFrom<RawPolicy> for ExpiryPolicy {
    type Error = ExpireError;

    fn try_from(raw: RawPolicy) -> Result<Self> {
        ExpiryPolicy::new(raw.interval, raw.interval_type)
    }
}

impl ExpiryPolicy {
    /// Validate `interval` and pair it with `interval_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpireError::InvalidArgument`] if `interval <= 0`.
    pub fn new(interval: i64, interval_type: IntervalType) -> Result<Self> {
        Ok(Self {
            interval: validate_interval(interval)?,
            interval_type,
        })
    }

    /// Grid spacing, always at least 1.
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Unit the interval is measured in.
    pub fn interval_type(&self) -> IntervalType {
        self.interval_type
    }
}
