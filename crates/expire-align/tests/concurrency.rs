//! Many threads hammering one calculator with a handful of keys.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use expire_align::{build_grid, truncate, ExpiryCalculator, FixedClock, IntervalType};

const THREADS: usize = 16;
const CALLS_PER_THREAD: usize = 250;

const KEYS: [(i64, IntervalType); 5] = [
    (10, IntervalType::Minute),
    (15, IntervalType::Second),
    (5, IntervalType::Hour),
    (7, IntervalType::Minute),
    (17, IntervalType::Second),
];

#[test]
fn test_concurrent_calls_share_cache_and_stay_aligned() {
    let start = Utc.with_ymd_and_hms(2026, 3, 15, 14, 3, 30).unwrap();
    let calc = Arc::new(ExpiryCalculator::new().with_clock(FixedClock(start)));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let calc = Arc::clone(&calc);
            thread::spawn(move || {
                for i in 0..CALLS_PER_THREAD {
                    let (interval, kind) = KEYS[(t + i) % KEYS.len()];
                    let reference: DateTime<Utc> = start + Duration::seconds((t * 7919 + i * 37) as i64);

                    let expiry = calc.next_expire_time(interval, kind, Some(reference)).unwrap();
                    assert!(expiry > truncate(&reference, kind).unwrap());

                    let grid = build_grid(interval as u32, kind);
                    assert!(grid.contains(&kind.position(&expiry)));

                    let minutes = calc.next_expire_duration_minutes(interval, kind, None).unwrap();
                    assert!(minutes > 0.0);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(calc.cache().len(), KEYS.len());
}

#[test]
fn test_concurrent_grid_requests_see_identical_grids() {
    let calc = Arc::new(ExpiryCalculator::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let calc = Arc::clone(&calc);
            thread::spawn(move || {
                KEYS.iter()
                    .map(|&(interval, kind)| calc.cache().grid(interval, kind).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for grids in &results {
        for (grid, &(interval, kind)) in grids.iter().zip(KEYS.iter()) {
            assert_eq!(&**grid, build_grid(interval as u32, kind).as_slice());
            assert!(Arc::ptr_eq(grid, &calc.cache().grid(interval, kind).unwrap()));
        }
    }
}
