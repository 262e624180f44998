//! Boundary grids and the shared grid cache.
//!
//! A boundary grid lists every offset inside one cycle that an expiry may be
//! aligned to. For a 10-minute interval that is `[0, 10, 20, 30, 40, 50]`;
//! for a 5-hour interval it is `[0, 5, 10, 15, 20]`.
//!
//! Grids are small and depend only on `(interval_type, interval)`, so they
//! are built once and published into a [`GridCache`] as `Arc<[u32]>`. A
//! published grid is never mutated.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::Result;
use crate::interval::{validate_interval, IntervalType};

/// Upper bound on grid construction steps; every cycle is at most 60 long.
const MAX_GRID_STEPS: usize = 60;

/// Composite cache key of a boundary grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    /// Unit the grid aligns on.
    pub interval_type: IntervalType,
    /// Grid spacing, already validated.
    pub interval: u32,
}

impl GridKey {
    /// Key for `interval` units of `interval_type`.
    pub fn new(interval_type: IntervalType, interval: u32) -> Self {
        Self {
            interval_type,
            interval,
        }
    }
}

/// Build the ascending boundary grid for `interval` units of `interval_type`.
///
/// Always starts at 0. Values stay strictly below the cycle length, so an
/// interval at or beyond the cycle yields `[0]`.
pub fn build_grid(interval: u32, interval_type: IntervalType) -> Vec<u32> {
    let cycle = interval_type.cycle_len();
    let mut grid = Vec::with_capacity((cycle / interval.max(1)) as usize + 1);
    let mut boundary = 0u32;
    grid.push(boundary);

    for _ in 0..MAX_GRID_STEPS {
        boundary = match boundary.checked_add(interval) {
            Some(next) if next < cycle => next,
            _ => break,
        };
        grid.push(boundary);
    }

    grid
}

/// First boundary strictly greater than `position`.
///
/// `None` means the current cycle has no boundary left and the caller must
/// wrap to the start of the next cycle.
pub fn next_boundary(grid: &[u32], position: u32) -> Option<u32> {
    let idx = grid.partition_point(|&boundary| boundary <= position);
    grid.get(idx).copied()
}

/// Concurrent memo table of boundary grids.
///
/// Lookups of an already-published grid only take a shard read lock.
/// On a miss the grid is built outside any lock and then published with
/// insert-if-absent, so racing first requests may build the same grid twice
/// but only one copy is ever kept and no reader sees a partial list.
#[derive(Debug, Default)]
pub struct GridCache {
    grids: DashMap<GridKey, Arc<[u32]>>,
}

impl GridCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The boundary grid for `interval` units of `interval_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpireError::InvalidArgument`](crate::ExpireError::InvalidArgument)
    /// if `interval <= 0`.
    pub fn grid(&self, interval: i64, interval_type: IntervalType) -> Result<Arc<[u32]>> {
        let interval = validate_interval(interval)?;
        Ok(self.get_or_build(GridKey::new(interval_type, interval)))
    }

    /// Look up a grid by an already validated key, building it on first use.
    pub fn get_or_build(&self, key: GridKey) -> Arc<[u32]> {
        if let Some(grid) = self.grids.get(&key) {
            trace!(interval_type = %key.interval_type, interval = key.interval, "Grid cache hit");
            return Arc::clone(grid.value());
        }

        let built: Arc<[u32]> = build_grid(key.interval, key.interval_type).into();
        debug!(
            interval_type = %key.interval_type,
            interval = key.interval,
            len = built.len(),
            "Grid cache miss, built boundary grid"
        );

        let published = self.grids.entry(key).or_insert(built);
        Arc::clone(published.value())
    }

    #[cfg(test)]
    fn contains(&self, key: &GridKey) -> bool {
        self.grids.contains_key(key)
    }

    /// Number of published grids.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Whether no grid has been published yet.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}
