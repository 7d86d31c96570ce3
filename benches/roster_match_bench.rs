//! Benchmarks for roster matching.
//!
//! Matching is a linear scan with a constant-time comparison per record, so
//! its cost grows with the roster. These benchmarks show where that starts
//! to matter for a scan-to-feedback budget measured in milliseconds.
//!
//! # Run Benchmarks
//!
//! ```sh
//! # Run all roster benchmarks
//! cargo bench --bench roster_match_bench
//!
//! # Only the worst-case group
//! cargo bench --bench roster_match_bench -- roster_miss
//!
//! # Compare against a saved baseline
//! cargo bench --bench roster_match_bench -- --save-baseline before
//! cargo bench --bench roster_match_bench -- --baseline before
//! ```
//!
//! # Expected Results
//!
//! - A miss scans the whole roster and is the slowest case
//! - A hit on the first record is independent of roster size
//! - Inactive records cost the same as active ones (they are still visited)

use checkin_core::{IdentityCode, StaffId, StaffRecord};
use checkin_terminal::match_staff;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const ROSTER_SIZES: [usize; 4] = [10, 100, 1_000, 10_000];

fn roster(size: usize) -> Vec<StaffRecord> {
    (0..size)
        .map(|i| {
            let record = StaffRecord::new(
                StaffId::new(format!("T{}", i)).unwrap(),
                IdentityCode::new(format!("DED-{:06}", i)).unwrap(),
                format!("Staff {}", i),
            );
            // Every tenth record belongs to someone who left.
            if i % 10 == 9 { record.inactive() } else { record }
        })
        .collect()
}

/// Code found at the front, middle and end of the roster.
fn bench_roster_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_hit");

    for size in ROSTER_SIZES {
        let staff = roster(size);
        group.throughput(Throughput::Elements(size as u64));

        for (position, index) in [("first", 0), ("middle", size / 2), ("last", size - 2)] {
            let code = staff[index].identity_code.as_str().to_string();
            group.bench_with_input(
                BenchmarkId::new(position, size),
                &code,
                |b, code| b.iter(|| black_box(match_staff(black_box(&staff), black_box(code)))),
            );
        }
    }

    group.finish();
}

/// Unknown code: the full roster is visited.
fn bench_roster_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_miss");

    for size in ROSTER_SIZES {
        let staff = roster(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("garbage", size), &staff, |b, staff| {
            b.iter(|| black_box(match_staff(black_box(staff), black_box("GARBAGE"))))
        });
    }

    group.finish();
}

/// Code belonging to an inactive record.
fn bench_roster_inactive(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_inactive");

    for size in ROSTER_SIZES {
        let staff = roster(size);
        let code = staff[9].identity_code.as_str().to_string();
        group.bench_with_input(BenchmarkId::new("inactive", size), &code, |b, code| {
            b.iter(|| black_box(match_staff(black_box(&staff), black_box(code))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_roster_hit,
    bench_roster_miss,
    bench_roster_inactive
);
criterion_main!(benches);
