//! Grid-aligned expiry computation.
//!
//! Instead of expiring an entry exactly N units after it was written, the
//! expiry is snapped to the next boundary of a fixed grid. With a 10-minute
//! interval every entry expires at :00, :10, :20, :30, :40 or :50, so entries
//! written at different moments share a handful of expiry instants.
//!
//! # Functions
//!
//! - [`next_expire_time`] — Pure projection with an explicit reference time
//! - [`truncate`] — Drop every component finer than the alignment unit
//! - [`ExpiryCalculator`] — Owns the grid cache and a clock; fills in "now"
//!
//! # Time zones
//!
//! Seconds, minutes and hours are read on the wall clock of the reference
//! time's zone, so an hour grid in `America/New_York` aligns on New York
//! hours on both sides of a DST change. The target is built as a local
//! datetime and then resolved in the zone:
//!
//! - An ambiguous local time (fall-back overlap) resolves to the earliest
//!   instant still after the truncated reference.
//! - A local time inside a gap (spring-forward) falls forward to the first
//!   wall-clock minute after the gap.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use serde::Serialize;
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::error::{ExpireError, Result};
use crate::grid::{next_boundary, GridCache, GridKey};
use crate::interval::{validate_interval, IntervalType};
use crate::policy::ExpiryPolicy;

/// Longest spring-forward gap searched when falling forward (two days).
const MAX_GAP_MINUTES: usize = 48 * 60;

// ── Pure projection ─────────────────────────────────────────────────────────

/// Truncate `dt` to whole units of `interval_type` on its local wall clock.
///
/// `Second` drops the sub-second part, `Minute` also drops seconds, `Hour`
/// also drops minutes. When the truncated local time occurs twice, the
/// occurrence with `dt`'s own offset is kept, so the result is never after
/// `dt`.
///
/// # Errors
///
/// Returns [`ExpireError::OutOfRange`] if the truncated instant is not
/// representable.
pub fn truncate<Tz: TimeZone>(dt: &DateTime<Tz>, interval_type: IntervalType) -> Result<DateTime<Tz>> {
    let naive = truncate_naive(dt.naive_local(), interval_type)
        .ok_or_else(|| out_of_range(dt, "truncation"))?;
    let tz = dt.timezone();
    let own_offset = dt.offset().fix();

    let truncated = match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, latest) => {
            if latest.offset().fix() == own_offset {
                Some(latest)
            } else {
                Some(earliest)
            }
        }
        LocalResult::None => fall_forward(&tz, naive),
    };
    truncated.ok_or_else(|| out_of_range(dt, "truncation"))
}

fn truncate_naive(naive: NaiveDateTime, interval_type: IntervalType) -> Option<NaiveDateTime> {
    let naive = naive.with_nanosecond(0)?;
    match interval_type {
        IntervalType::Second => Some(naive),
        IntervalType::Minute => naive.with_second(0),
        IntervalType::Hour => naive.with_second(0)?.with_minute(0),
    }
}

/// Compute the next grid-aligned expiry after `reference`.
///
/// # Arguments
///
/// * `cache` — Grid cache to read boundary grids from (and publish into)
/// * `interval` — Grid spacing, in units of `interval_type`
/// * `interval_type` — Unit to align on
/// * `reference` — Anchor instant; its zone decides which wall clock aligns
///
/// # Errors
///
/// Returns [`ExpireError::InvalidArgument`] if `interval <= 0`, or
/// [`ExpireError::OutOfRange`] at the edges of the representable range.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use expire_align::{next_expire_time, GridCache, IntervalType};
///
/// let cache = GridCache::new();
/// let at = Utc.with_ymd_and_hms(2026, 3, 15, 14, 23, 41).unwrap();
/// let expiry = next_expire_time(&cache, 10, IntervalType::Minute, &at).unwrap();
/// assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap());
/// ```
pub fn next_expire_time<Tz: TimeZone>(
    cache: &GridCache,
    interval: i64,
    interval_type: IntervalType,
    reference: &DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let interval = validate_interval(interval)?;
    project(cache, GridKey::new(interval_type, interval), reference)
}

fn project<Tz: TimeZone>(cache: &GridCache, key: GridKey, reference: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    let kind = key.interval_type;
    let base = truncate(reference, kind)?;
    let grid = cache.get_or_build(key);
    let local = base.naive_local();
    let position = kind.position(&local);

    let target = match next_boundary(&grid, position) {
        Some(boundary) => set_component(local, kind, boundary),
        // No boundary left in this cycle: go to the start of the next one.
        None => start_of_next_cycle(local, kind),
    }
    .ok_or_else(|| out_of_range(&base, "projection"))?;

    let expiry = resolve_after(&base, target).ok_or_else(|| out_of_range(&base, "projection"))?;

    trace!(
        interval_type = %kind,
        interval = key.interval,
        position,
        expiry = %expiry.naive_local(),
        "Projected expiry"
    );
    Ok(expiry)
}

fn set_component(local: NaiveDateTime, kind: IntervalType, value: u32) -> Option<NaiveDateTime> {
    match kind {
        IntervalType::Second => local.with_second(value),
        IntervalType::Minute => local.with_minute(value),
        IntervalType::Hour => local.with_hour(value),
    }
}

fn start_of_next_cycle(local: NaiveDateTime, kind: IntervalType) -> Option<NaiveDateTime> {
    match kind {
        IntervalType::Second => local
            .with_second(0)?
            .checked_add_signed(chrono::Duration::minutes(1)),
        IntervalType::Minute => local
            .with_minute(0)?
            .checked_add_signed(chrono::Duration::hours(1)),
        IntervalType::Hour => local.date().succ_opt()?.and_hms_opt(0, 0, 0),
    }
}

/// Resolve local `target` in `base`'s zone to an instant strictly after `base`.
fn resolve_after<Tz: TimeZone>(base: &DateTime<Tz>, target: NaiveDateTime) -> Option<DateTime<Tz>> {
    let tz = base.timezone();
    let resolved = match tz.from_local_datetime(&target) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, latest) => {
            if earliest > *base {
                Some(earliest)
            } else {
                Some(latest)
            }
        }
        LocalResult::None => fall_forward(&tz, target),
    }?;
    (resolved > *base).then_some(resolved)
}

/// First existing wall-clock minute after a local time that falls in a gap.
fn fall_forward<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    let mut candidate = naive.with_second(0)?.with_nanosecond(0)?;
    for _ in 0..MAX_GAP_MINUTES {
        candidate = candidate.checked_add_signed(chrono::Duration::minutes(1))?;
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return Some(dt);
        }
    }
    None
}

/// Fractional minutes from `now` until `expiry`; negative if already past.
pub fn minutes_until<Tz: TimeZone>(now: DateTime<Utc>, expiry: &DateTime<Tz>) -> f64 {
    let delta = expiry.with_timezone(&Utc) - now;
    (delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9) / 60.0
}

fn out_of_range<Tz: TimeZone>(dt: &DateTime<Tz>, stage: &str) -> ExpireError {
    ExpireError::OutOfRange(format!("{stage} of {} leaves the supported range", dt.naive_utc()))
}

// ── Calculator ──────────────────────────────────────────────────────────────

/// One entry of an expiry schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledExpiry {
    /// The aligned expiry instant, with the calculator zone's offset.
    pub expire_at: DateTime<FixedOffset>,
    /// Minutes from the clock's "now" until `expire_at`.
    pub minutes_until: f64,
}

/// Computes aligned expiries against a shared [`GridCache`] and a [`Clock`].
///
/// The cache is held behind an `Arc` so several calculators (for instance
/// one per time zone) can share the same grids. The calculator itself is
/// `Send + Sync` whenever its zone and clock are.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use expire_align::{ExpiryCalculator, FixedClock, IntervalType};
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 15, 14, 3, 30).unwrap();
/// let calc = ExpiryCalculator::new().with_clock(FixedClock(now));
///
/// let expiry = calc.next_expire_time(10, IntervalType::Minute, None).unwrap();
/// assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 3, 15, 14, 10, 0).unwrap());
///
/// let minutes = calc.next_expire_duration_minutes(10, IntervalType::Minute, None).unwrap();
/// assert_eq!(minutes, 6.5);
/// ```
#[derive(Debug, Clone)]
pub struct ExpiryCalculator<Tz: TimeZone = Utc, C: Clock = SystemClock> {
    cache: Arc<GridCache>,
    clock: C,
    timezone: Tz,
}

impl ExpiryCalculator {
    /// A UTC calculator on the system clock with a fresh, empty cache.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(GridCache::new()), SystemClock, Utc)
    }
}

impl Default for ExpiryCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone, C: Clock> ExpiryCalculator<Tz, C> {
    /// Assemble a calculator from a (possibly shared) cache, a clock and a zone.
    pub fn with_parts(cache: Arc<GridCache>, clock: C, timezone: Tz) -> Self {
        Self {
            cache,
            clock,
            timezone,
        }
    }

    /// Same cache and clock, aligned in another zone.
    pub fn with_timezone<Tz2: TimeZone>(self, timezone: Tz2) -> ExpiryCalculator<Tz2, C> {
        ExpiryCalculator::with_parts(self.cache, self.clock, timezone)
    }

    /// Same cache and zone, reading "now" from another clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ExpiryCalculator<Tz, C2> {
        ExpiryCalculator::with_parts(self.cache, clock, self.timezone)
    }

    /// The grid cache, for sharing with other calculators.
    pub fn cache(&self) -> &Arc<GridCache> {
        &self.cache
    }

    /// The zone whose wall clock grids align to.
    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    /// The clock's current instant in the calculator's zone.
    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.timezone)
    }

    /// Next aligned expiry after `reference` (or after now, if `None`).
    ///
    /// # Errors
    ///
    /// Returns [`ExpireError::InvalidArgument`] if `interval <= 0`.
    pub fn next_expire_time(
        &self,
        interval: i64,
        interval_type: IntervalType,
        reference: Option<DateTime<Tz>>,
    ) -> Result<DateTime<Tz>> {
        let interval = validate_interval(interval)?;
        let reference = reference.unwrap_or_else(|| self.now());
        project(&self.cache, GridKey::new(interval_type, interval), &reference)
    }

    /// Minutes from the clock's current instant until the next aligned expiry.
    ///
    /// The expiry is projected from `reference`, but the duration is always
    /// measured from the clock's "now". With a reference far from now the
    /// result can be large or negative.
    ///
    /// # Errors
    ///
    /// Returns [`ExpireError::InvalidArgument`] if `interval <= 0`.
    pub fn next_expire_duration_minutes(
        &self,
        interval: i64,
        interval_type: IntervalType,
        reference: Option<DateTime<Tz>>,
    ) -> Result<f64> {
        let interval = validate_interval(interval)?;
        let now = self.clock.now();
        let reference = reference.unwrap_or_else(|| now.with_timezone(&self.timezone));
        let expiry = project(&self.cache, GridKey::new(interval_type, interval), &reference)?;
        Ok(minutes_until(now, &expiry))
    }

    /// [`next_expire_time`](Self::next_expire_time) for a pre-validated policy.
    pub fn next_expire_time_for(
        &self,
        policy: &ExpiryPolicy,
        reference: Option<DateTime<Tz>>,
    ) -> Result<DateTime<Tz>> {
        let reference = reference.unwrap_or_else(|| self.now());
        project(&self.cache, policy_key(policy), &reference)
    }

    /// [`next_expire_duration_minutes`](Self::next_expire_duration_minutes) for a
    /// pre-validated policy.
    pub fn next_expire_duration_minutes_for(
        &self,
        policy: &ExpiryPolicy,
        reference: Option<DateTime<Tz>>,
    ) -> Result<f64> {
        let now = self.clock.now();
        let reference = reference.unwrap_or_else(|| now.with_timezone(&self.timezone));
        let expiry = project(&self.cache, policy_key(policy), &reference)?;
        Ok(minutes_until(now, &expiry))
    }

    /// The next `count` aligned expiries, each projected from the previous one.
    ///
    /// Every entry's `minutes_until` is measured from a single clock reading
    /// taken at the start of the call.
    ///
    /// # Errors
    ///
    /// Returns [`ExpireError::InvalidArgument`] if `interval <= 0`.
    pub fn upcoming(
        &self,
        interval: i64,
        interval_type: IntervalType,
        reference: Option<DateTime<Tz>>,
        count: usize,
    ) -> Result<Vec<ScheduledExpiry>> {
        let key = GridKey::new(interval_type, validate_interval(interval)?);
        let now = self.clock.now();
        let mut reference = reference.unwrap_or_else(|| now.with_timezone(&self.timezone));

        let mut schedule = Vec::with_capacity(count);
        for _ in 0..count {
            let expiry = project(&self.cache, key, &reference)?;
            schedule.push(ScheduledExpiry {
                expire_at: expiry.with_timezone(&expiry.offset().fix()),
                minutes_until: minutes_until(now, &expiry),
            });
            reference = expiry;
        }
        Ok(schedule)
    }
}

fn policy_key(policy: &ExpiryPolicy) -> GridKey {
    GridKey::new(policy.interval_type(), policy.interval())
}
