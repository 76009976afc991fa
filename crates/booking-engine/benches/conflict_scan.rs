//! Benchmarks for the hot read paths: conflict scans over a large booking
//! history and sub-slot expansion of a full week.

use std::hint::black_box;

use booking_engine::booking::{BookingStatus, InterviewBooking, SessionKind};
use booking_engine::conflict::has_conflict;
use booking_engine::interval::sub_slots;
use booking_engine::schedule::{compile, TimeRange, WeeklySchedule};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use uuid::Uuid;

fn booking_history(count: i64) -> Vec<InterviewBooking> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let scheduled_at = base + Duration::hours(i);
            InterviewBooking {
                id: Uuid::new_v4(),
                candidate_id: format!("cand-{i}"),
                interviewer_id: Some("int-1".to_string()),
                scheduled_at,
                duration_minutes: 45,
                status: BookingStatus::Confirmed,
                session: SessionKind::Live,
                meeting: None,
                cancellation: None,
                created_at: scheduled_at,
                updated_at: scheduled_at,
            }
        })
        .collect()
}

fn full_week() -> WeeklySchedule {
    let day = || {
        Some(vec![
            TimeRange {
                start: "09:00".to_string(),
                end: "12:00".to_string(),
            },
            TimeRange {
                start: "13:00".to_string(),
                end: "17:30".to_string(),
            },
        ])
    };
    WeeklySchedule {
        sunday: day(),
        monday: day(),
        tuesday: day(),
        wednesday: day(),
        thursday: day(),
        friday: day(),
        saturday: day(),
    }
}

fn bench_conflict_scan(c: &mut Criterion) {
    let history = booking_history(10_000);
    // Probe past the end of the history so every scan walks the full list.
    let probe = Utc.with_ymd_and_hms(2028, 1, 1, 9, 0, 0).unwrap();

    c.bench_function("has_conflict_10k_miss", |b| {
        b.iter(|| has_conflict(black_box(&history), black_box(probe), black_box(60)))
    });

    let hit = Utc.with_ymd_and_hms(2026, 1, 1, 9, 15, 0).unwrap();
    c.bench_function("has_conflict_10k_early_hit", |b| {
        b.iter(|| has_conflict(black_box(&history), black_box(hit), black_box(60)))
    });
}

fn bench_sub_slot_expansion(c: &mut Criterion) {
    c.bench_function("sub_slots_full_day_15min", |b| {
        b.iter(|| sub_slots(black_box(0), black_box(1440), black_box(15)).count())
    });
}

fn bench_schedule_compile(c: &mut Criterion) {
    let schedule = full_week();
    c.bench_function("compile_full_week", |b| {
        b.iter(|| compile(black_box("int-1"), black_box(&schedule), black_box("America/New_York")))
    });
}

criterion_group!(
    benches,
    bench_conflict_scan,
    bench_sub_slot_expansion,
    bench_schedule_compile
);
criterion_main!(benches);
