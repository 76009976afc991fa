//! Wall-clock interval arithmetic on minutes-of-day.
//!
//! All availability math runs on `u16` minute offsets from local midnight
//! (`"09:30"` → 570). Intervals are half-open `[start, end)`, so two intervals
//! that merely touch (one ends exactly when the other starts) do NOT overlap.

use crate::error::{BookingError, Result};

/// Parse an `HH:MM` clock time into minutes since midnight.
///
/// Accepts one- or two-digit hours (`"9:30"` and `"09:30"` both parse to 570)
/// but requires exactly two minute digits. Anything outside `0:00`..`23:59`
/// is rejected.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] for malformed or out-of-range input.
pub fn time_to_minutes(time: &str) -> Result<u16> {
    let (hours, minutes) = time.split_once(':').ok_or_else(|| invalid_time(time))?;
    if hours.is_empty() || hours.len() > 2 || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_time(time));
    }
    if minutes.len() != 2 || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_time(time));
    }

    let hours: u16 = hours.parse().map_err(|_| invalid_time(time))?;
    let minutes: u16 = minutes.parse().map_err(|_| invalid_time(time))?;
    if hours > 23 || minutes > 59 {
        return Err(invalid_time(time));
    }

    Ok(hours * 60 + minutes)
}

/// Format minutes since midnight as a zero-padded `HH:MM` string.
///
/// Inverse of [`time_to_minutes`] for canonical input; `570` → `"09:30"`.
pub fn minutes_to_time(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn invalid_time(time: &str) -> BookingError {
    BookingError::Validation(format!("invalid time {time:?}, expected HH:MM"))
}

/// Whether two half-open intervals overlap.
///
/// Two intervals overlap iff `a_start < b_end && b_start < a_end`.
/// This excludes the adjacent case where `a_end == b_start`, so back-to-back
/// bookings never count as a conflict.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Iterator over fixed-duration sub-slots of a minute interval.
///
/// Created by [`sub_slots`]. `Clone` the iterator to restart the walk.
#[derive(Debug, Clone)]
pub struct SubSlots {
    cursor: u16,
    end: u16,
    duration: u16,
}

/// Carve `[start, end)` into consecutive `(start, end)` sub-slots of
/// `duration_minutes` each, walking forward from `start` until the next
/// sub-slot would cross `end`.
///
/// A trailing remainder shorter than the duration is dropped, and a window
/// shorter than the duration yields nothing. A zero duration also yields
/// nothing rather than looping in place.
pub fn sub_slots(start: u16, end: u16, duration_minutes: u16) -> SubSlots {
    SubSlots {
        cursor: start,
        end,
        duration: duration_minutes,
    }
}

impl Iterator for SubSlots {
    type Item = (u16, u16);

    fn next(&mut self) -> Option<(u16, u16)> {
        if self.duration == 0 {
            return None;
        }
        let slot_end = self.cursor.checked_add(self.duration)?;
        if slot_end > self.end {
            return None;
        }
        let slot = (self.cursor, slot_end);
        self.cursor = slot_end;
        Some(slot)
    }
}
