//! # expire-align
//!
//! Grid-aligned cache expiration.
//!
//! Rather than expiring a cache entry exactly N units after it was written,
//! expire-align snaps the expiry to the next boundary of a fixed grid
//! (every 10 minutes: :00, :10, :20, ...). Entries created at different
//! moments converge on a few shared expiry instants, which keeps the number
//! of distinct expiration events an eviction sweep has to handle small.
//!
//! This crate only computes instants and durations. Storage and eviction
//! belong to the caller.
//!
//! ## Modules
//!
//! - [`interval`] — The closed set of interval units and parameter validation
//! - [`grid`] — Boundary grids and the concurrent grid cache
//! - [`expiry`] — Truncation, projection and the [`ExpiryCalculator`]
//! - [`policy`] — Validated, deserializable `(interval, unit)` settings
//! - [`clock`] — Injectable source of "now"
//! - [`error`] — Error types

pub mod clock;
pub mod error;
pub mod expiry;
pub mod grid;
pub mod interval;
pub mod policy;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ExpireError, Result};
pub use expiry::{minutes_until, next_expire_time, truncate, ExpiryCalculator, ScheduledExpiry};
pub use grid::{build_grid, next_boundary, GridCache, GridKey};
pub use interval::{validate_interval, IntervalType};
pub use policy::ExpiryPolicy;
