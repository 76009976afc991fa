//! Property-based tests for the scheduling core.
//!
//! These verify laws that must hold for *any* input: interval algebra,
//! sub-slot partitioning, schedule compilation determinism, and the
//! no-double-booking guarantee under arbitrary request sequences.

use std::sync::Arc;

use booking_engine::booking::{BookingRequest, SessionKind};
use booking_engine::error::BookingError;
use booking_engine::interval::{minutes_to_time, overlaps, sub_slots, time_to_minutes};
use booking_engine::schedule::{compile, TimeRange, WeeklySchedule};
use booking_engine::{BookingEngine, MemoryStore};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A non-empty `[start, end)` window within one day, in minutes.
fn arb_window() -> impl Strategy<Value = (u16, u16)> {
    (0u16..1440, 1u16..1440)
        .prop_map(|(start, len)| (start, start.saturating_add(len).min(1440)))
}

/// One day column: disabled, or a single quarter-hour-aligned range.
fn arb_day() -> impl Strategy<Value = Option<Vec<TimeRange>>> {
    prop_oneof![
        Just(None),
        (0u16..80, 1u16..16).prop_map(|(start_q, len_q)| {
            let start = start_q * 15;
            let end = start + len_q * 15;
            Some(vec![TimeRange {
                start: minutes_to_time(start),
                end: minutes_to_time(end),
            }])
        }),
    ]
}

fn arb_schedule() -> impl Strategy<Value = WeeklySchedule> {
    (
        arb_day(),
        arb_day(),
        arb_day(),
        arb_day(),
        arb_day(),
        arb_day(),
        arb_day(),
    )
        .prop_map(
            |(sunday, monday, tuesday, wednesday, thursday, friday, saturday)| WeeklySchedule {
                sunday,
                monday,
                tuesday,
                wednesday,
                thursday,
                friday,
                saturday,
            },
        )
}

/// Booking attempts as (quarter-hours past 06:00, duration in quarter hours).
fn arb_requests() -> impl Strategy<Value = Vec<(u16, u16)>> {
    prop::collection::vec((0u16..64, 1u16..=6), 1..40)
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: The overlap predicate is symmetric
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn overlap_is_symmetric(
        a in 0u16..1440,
        b in 0u16..1440,
        c in 0u16..1440,
        d in 0u16..1440,
    ) {
        prop_assert_eq!(overlaps(a, b, c, d), overlaps(c, d, a, b));
    }
}

// ---------------------------------------------------------------------------
// Property 2: For well-formed windows, overlap means exactly a non-empty
// intersection
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn overlap_iff_nonempty_intersection(
        (a, b) in arb_window(),
        (c, d) in arb_window(),
    ) {
        let expected = a.max(c) < b.min(d);
        prop_assert_eq!(
            overlaps(a, b, c, d),
            expected,
            "[{}, {}) vs [{}, {})", a, b, c, d
        );
    }
}

// ---------------------------------------------------------------------------
// Property 3: Adjacent windows never overlap, non-empty windows overlap
// themselves
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn adjacency_is_never_overlap(
        start in 0u16..1000,
        first_len in 1u16..200,
        second_len in 1u16..200,
    ) {
        let mid = start + first_len;
        let end = mid + second_len;

        prop_assert!(!overlaps(start, mid, mid, end));
        prop_assert!(!overlaps(mid, end, start, mid));
        prop_assert!(overlaps(start, mid, start, mid));
    }
}

// ---------------------------------------------------------------------------
// Property 4: Sub-slots partition the window from its start
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn sub_slots_partition_the_window(
        start in 0u16..1440,
        len in 0u16..1440,
        duration in 1u16..240,
    ) {
        let end = start.saturating_add(len).min(1440);
        let slots: Vec<(u16, u16)> = sub_slots(start, end, duration).collect();

        // Count: exactly as many whole durations as fit.
        prop_assert_eq!(slots.len(), usize::from((end - start) / duration));

        // Width and bounds.
        for (slot_start, slot_end) in &slots {
            prop_assert_eq!(slot_end - slot_start, duration);
            prop_assert!(*slot_start >= start);
            prop_assert!(*slot_end <= end);
        }

        // Contiguity from the window start.
        if let Some(first) = slots.first() {
            prop_assert_eq!(first.0, start);
        }
        for pair in slots.windows(2) {
            prop_assert_eq!(pair[0].1, pair[1].0, "sub-slots must be gapless");
        }

        // Whatever remains after the last slot is too small for another.
        let tail_start = slots.last().map_or(start, |last| last.1);
        prop_assert!(end - tail_start < duration);
    }
}

// ---------------------------------------------------------------------------
// Property 5: HH:MM parsing round-trips, padded or not
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn clock_times_round_trip(hour in 0u16..24, minute in 0u16..60) {
        let padded = format!("{hour:02}:{minute:02}");
        let bare = format!("{hour}:{minute:02}");
        let expected = hour * 60 + minute;

        prop_assert_eq!(time_to_minutes(&padded).unwrap(), expected);
        prop_assert_eq!(time_to_minutes(&bare).unwrap(), expected);
        prop_assert_eq!(minutes_to_time(expected), padded);
    }
}

// ---------------------------------------------------------------------------
// Property 6: Schedule compilation is deterministic and well-formed
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn compilation_is_deterministic(schedule in arb_schedule()) {
        let first = compile("int-1", &schedule, "America/New_York");
        let second = compile("int-1", &schedule, "America/New_York");

        match (first, second) {
            (Ok(a), Ok(b)) => {
                let ids_a: Vec<String> = a.iter().map(|s| s.id.clone()).collect();
                let ids_b: Vec<String> = b.iter().map(|s| s.id.clone()).collect();
                prop_assert_eq!(ids_a, ids_b);

                for slot in &a {
                    prop_assert!(slot.recurrence.is_recurring());
                    prop_assert!(slot.bounds_minutes().is_some(), "stored bounds must parse");
                }
            }
            (Err(_), Err(_)) => {} // Same grid must fail the same way.
            (first, second) => {
                return Err(TestCaseError::fail(format!(
                    "one compile succeeded and one failed: {first:?} vs {second:?}"
                )));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 7: No request sequence ever double-books an interviewer
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn no_sequence_of_requests_double_books(requests in arb_requests()) {
        let engine = BookingEngine::new(Arc::new(MemoryStore::new()));
        let schedule = WeeklySchedule {
            monday: Some(vec![TimeRange {
                start: "06:00".to_string(),
                end: "22:00".to_string(),
            }]),
            ..WeeklySchedule::default()
        };
        engine.set_weekly_schedule("int-1", &schedule, "UTC").unwrap();

        // 2026-03-16 is a Monday.
        let window_close: u32 = 22 * 60;
        let mut winners: Vec<(u32, u32)> = Vec::new();

        for (index, &(quarter, quarters_long)) in requests.iter().enumerate() {
            let start_minute = u32::from(360 + quarter * 15);
            let duration = u32::from(quarters_long * 15);
            let fits = start_minute + duration <= window_close;

            let result = engine.request_booking(BookingRequest {
                candidate_id: format!("cand-{index}"),
                interviewer_id: Some("int-1".to_string()),
                scheduled_at: Utc
                    .with_ymd_and_hms(2026, 3, 16, start_minute / 60, start_minute % 60, 0)
                    .unwrap(),
                duration_minutes: duration,
                session: SessionKind::Live,
            });

            match result {
                Ok(_) => {
                    prop_assert!(fits, "a booking landed outside the declared window");
                    for &(taken_start, taken_end) in &winners {
                        prop_assert!(
                            !overlaps(start_minute, start_minute + duration, taken_start, taken_end),
                            "two accepted bookings overlap: [{}, {}) vs [{}, {})",
                            start_minute, start_minute + duration, taken_start, taken_end
                        );
                    }
                    winners.push((start_minute, start_minute + duration));
                }
                Err(BookingError::Conflict(_)) => {
                    let collides = winners
                        .iter()
                        .any(|&(s, e)| overlaps(start_minute, start_minute + duration, s, e));
                    prop_assert!(
                        !fits || collides,
                        "a fitting, non-colliding request was rejected"
                    );
                }
                Err(other) => {
                    return Err(TestCaseError::fail(format!("unexpected error: {other}")));
                }
            }
        }

        prop_assert_eq!(engine.bookings_for_interviewer("int-1").len(), winners.len());
    }
}
