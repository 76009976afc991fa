//! Interviewer availability slots and wall-clock evaluation.
//!
//! A slot is a window of local time an interviewer has opened for bookings,
//! either weekly-recurring on a day of the week or pinned to one calendar
//! date. All slot times are wall-clock in the interviewer's IANA timezone;
//! instants are converted into that zone before any comparison, so an
//! interviewer in Tokyo and one in New York can both declare "Monday 09:00"
//! and mean their own Monday.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::interval;

/// When a slot applies.
///
/// The two cases are mutually exclusive by construction: a slot either
/// repeats weekly or names one date, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Repeats every week on the given day (0 = Sunday .. 6 = Saturday).
    Weekly { day_of_week: u8 },
    /// Applies to a single calendar date only.
    Date { date: NaiveDate },
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Recurrence::Weekly { .. })
    }

    /// Whether this recurrence covers the given local date.
    fn applies_on(&self, date: NaiveDate, day_of_week: u8) -> bool {
        match self {
            Recurrence::Weekly { day_of_week: day } => *day == day_of_week,
            Recurrence::Date { date: on } => *on == date,
        }
    }
}

/// A declared availability window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Deterministic id derived from interviewer, recurrence, and window.
    /// Re-declaring the same window yields the same id, which is what makes
    /// upserts idempotent.
    pub id: String,
    pub interviewer_id: String,
    pub recurrence: Recurrence,
    /// Window start as canonical zero-padded `HH:MM` local time.
    pub start_time: String,
    /// Window end as canonical zero-padded `HH:MM` local time (exclusive).
    pub end_time: String,
    /// IANA timezone name the window is anchored in (e.g. "America/New_York").
    pub timezone: String,
    /// Soft-delete flag; inactive slots never match queries.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    /// Build a weekly-recurring slot (`day_of_week`: 0 = Sunday .. 6 = Saturday).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for a day outside 0..=6, malformed
    /// or inverted times, or an unknown timezone.
    pub fn weekly(
        interviewer_id: &str,
        day_of_week: u8,
        start: &str,
        end: &str,
        timezone: &str,
    ) -> Result<Self> {
        if day_of_week > 6 {
            return Err(BookingError::Validation(format!(
                "day_of_week {day_of_week} outside 0..=6"
            )));
        }
        Self::build(
            interviewer_id,
            Recurrence::Weekly { day_of_week },
            start,
            end,
            timezone,
        )
    }

    /// Build a one-off slot for a single calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for malformed or inverted times,
    /// or an unknown timezone.
    pub fn on_date(
        interviewer_id: &str,
        date: NaiveDate,
        start: &str,
        end: &str,
        timezone: &str,
    ) -> Result<Self> {
        Self::build(
            interviewer_id,
            Recurrence::Date { date },
            start,
            end,
            timezone,
        )
    }

    fn build(
        interviewer_id: &str,
        recurrence: Recurrence,
        start: &str,
        end: &str,
        timezone: &str,
    ) -> Result<Self> {
        let start_minutes = interval::time_to_minutes(start)?;
        let end_minutes = interval::time_to_minutes(end)?;
        if start_minutes >= end_minutes {
            return Err(BookingError::Validation(format!(
                "slot {start}-{end} must start before it ends"
            )));
        }
        timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            BookingError::Validation(format!("invalid timezone: {timezone}"))
        })?;

        // Stored bounds are re-rendered so "9:30" and "09:30" produce the
        // same record and the same id.
        let start_time = interval::minutes_to_time(start_minutes);
        let end_time = interval::minutes_to_time(end_minutes);
        let id = slot_id(interviewer_id, &recurrence, &start_time, &end_time);

        Ok(Self {
            id,
            interviewer_id: interviewer_id.to_string(),
            recurrence,
            start_time,
            end_time,
            timezone: timezone.to_string(),
            is_active: true,
            created_at: Utc::now(),
        })
    }

    /// The slot window as minute offsets, or `None` if the stored bounds are
    /// not a well-formed forward interval. Constructor-built slots always
    /// parse; hand-edited records that do not simply never match.
    pub fn bounds_minutes(&self) -> Option<(u16, u16)> {
        let start = interval::time_to_minutes(&self.start_time).ok()?;
        let end = interval::time_to_minutes(&self.end_time).ok()?;
        (start < end).then_some((start, end))
    }
}

/// Deterministic slot id: `interviewer:w<day>:<HHMM>-<HHMM>` for weekly slots,
/// `interviewer:<date>:<HHMM>-<HHMM>` for one-offs.
pub fn slot_id(
    interviewer_id: &str,
    recurrence: &Recurrence,
    start_time: &str,
    end_time: &str,
) -> String {
    let window = format!(
        "{}-{}",
        start_time.replace(':', ""),
        end_time.replace(':', "")
    );
    match recurrence {
        Recurrence::Weekly { day_of_week } => format!("{interviewer_id}:w{day_of_week}:{window}"),
        Recurrence::Date { date } => format!("{interviewer_id}:{date}:{window}"),
    }
}

/// A concrete bookable window on one date, as local `HH:MM` bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

/// An instant resolved into an interviewer's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMoment {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday, matching [`Recurrence::Weekly`].
    pub day_of_week: u8,
    /// Minutes since local midnight, seconds truncated.
    pub minute: u16,
}

/// Resolve a UTC instant into local date, weekday, and minute-of-day.
///
/// UTC-to-local conversion is total, so unlike the reverse direction there is
/// no DST gap or fold to worry about here.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if `timezone` is not a known IANA name.
pub fn resolve_in_zone(instant: DateTime<Utc>, timezone: &str) -> Result<LocalMoment> {
    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| BookingError::Validation(format!("invalid timezone: {timezone}")))?;
    let local = instant.with_timezone(&tz);
    Ok(LocalMoment {
        date: local.date_naive(),
        day_of_week: local.weekday().num_days_from_sunday() as u8,
        minute: (local.hour() * 60 + local.minute()) as u16,
    })
}

/// Find the first active slot that fully contains a request starting at
/// `at` and running `duration_minutes`.
///
/// Containment is inclusive at the slot start and at the slot end:
/// a 09:00-10:00 slot covers a 09:00+60m request exactly. A request that
/// would run past local midnight can never be contained, since slot windows
/// end by 23:59.
pub fn covering_slot<'a>(
    slots: &'a [AvailabilitySlot],
    at: LocalMoment,
    duration_minutes: u32,
) -> Option<&'a AvailabilitySlot> {
    let request_start = u32::from(at.minute);
    // A duration too large to even compute an end for fits no window.
    let request_end = request_start.checked_add(duration_minutes)?;

    slots
        .iter()
        .filter(|slot| slot.is_active && slot.recurrence.applies_on(at.date, at.day_of_week))
        .find(|slot| match slot.bounds_minutes() {
            Some((slot_start, slot_end)) => {
                request_start >= u32::from(slot_start) && request_end <= u32::from(slot_end)
            }
            None => false,
        })
}

/// Expand every slot applicable on `date` into fixed-duration sub-slots.
///
/// The result is the union across slots, sorted by start time with exact
/// duplicates collapsed (a one-off slot can restate part of a recurring one).
pub fn sub_slots_for_date(
    slots: &[AvailabilitySlot],
    date: NaiveDate,
    duration_minutes: u32,
) -> Vec<TimeSlot> {
    let day_of_week = date.weekday().num_days_from_sunday() as u8;
    let Ok(duration) = u16::try_from(duration_minutes) else {
        return Vec::new();
    };

    let mut windows: Vec<(u16, u16)> = slots
        .iter()
        .filter(|slot| slot.is_active && slot.recurrence.applies_on(date, day_of_week))
        .filter_map(AvailabilitySlot::bounds_minutes)
        .flat_map(|(start, end)| interval::sub_slots(start, end, duration))
        .collect();
    windows.sort_unstable();
    windows.dedup();

    windows
        .into_iter()
        .map(|(start, end)| TimeSlot {
            start: interval::minutes_to_time(start),
            end: interval::minutes_to_time(end),
        })
        .collect()
}
