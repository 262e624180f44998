use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use expire_align::{build_grid, next_expire_time, GridCache, IntervalType};
use std::hint::black_box;

fn bench_build_grid(c: &mut Criterion) {
    c.bench_function("build_grid_second_1", |b| {
        b.iter(|| build_grid(black_box(1), IntervalType::Second))
    });
}

fn bench_next_expire_time(c: &mut Criterion) {
    let at = Utc.with_ymd_and_hms(2026, 3, 15, 14, 23, 41).unwrap();

    let warm = GridCache::new();
    c.bench_function("next_expire_time_cached", |b| {
        b.iter(|| next_expire_time(&warm, black_box(10), IntervalType::Minute, black_box(&at)))
    });

    c.bench_function("next_expire_time_cold_cache", |b| {
        b.iter(|| {
            let cold = GridCache::new();
            next_expire_time(&cold, black_box(10), IntervalType::Minute, black_box(&at))
        })
    });
}

criterion_group!(benches, bench_build_grid, bench_next_expire_time);
criterion_main!(benches);
