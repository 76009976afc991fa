//! Detect bookings that would collide with a proposed session.
//!
//! Only bookings whose status still holds time (`pending`, `accepted`,
//! `confirmed`) participate; cancelled, completed, no-show, and in-progress
//! bookings do not block. Adjacent sessions (one ends exactly when the next
//! starts) are NOT conflicts.

use chrono::{DateTime, Duration, Utc};

use crate::booking::InterviewBooking;
use crate::interval;

/// Find every existing booking that overlaps the proposed session.
///
/// Two sessions overlap iff `a.start < b.end && b.start < a.end`, which
/// excludes the back-to-back case. The caller supplies the bookings to scan,
/// typically everything held by one interviewer.
pub fn find_overlapping<'a>(
    existing: &'a [InterviewBooking],
    proposed_start: DateTime<Utc>,
    duration_minutes: u32,
) -> Vec<&'a InterviewBooking> {
    let proposed_end = proposed_start + Duration::minutes(i64::from(duration_minutes));

    existing
        .iter()
        .filter(|booking| booking.status.blocks_scheduling())
        .filter(|booking| {
            interval::overlaps(
                proposed_start,
                proposed_end,
                booking.scheduled_at,
                booking.end_at(),
            )
        })
        .collect()
}

/// Whether any existing booking overlaps the proposed session.
pub fn has_conflict(
    existing: &[InterviewBooking],
    proposed_start: DateTime<Utc>,
    duration_minutes: u32,
) -> bool {
    !find_overlapping(existing, proposed_start, duration_minutes).is_empty()
}
