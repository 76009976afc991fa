//! Weekly schedule compilation.
//!
//! Interviewers edit availability as a week grid (per-day lists of time
//! ranges). [`compile`] validates the whole grid up front and lowers it to
//! recurring [`AvailabilitySlot`]s; nothing is produced unless every day
//! passes, so a stored schedule can never be half-replaced.

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilitySlot;
use crate::error::{BookingError, Result};
use crate::interval;

/// One `HH:MM`-bounded range inside a day column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// A week grid of availability, one optional column per day.
///
/// `None` means the day is disabled. `Some` means enabled, and an enabled day
/// must list at least one range. Unknown keys are rejected rather than
/// ignored, so a misspelled day name in submitted JSON fails loudly instead
/// of silently disabling the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeeklySchedule {
    pub sunday: Option<Vec<TimeRange>>,
    pub monday: Option<Vec<TimeRange>>,
    pub tuesday: Option<Vec<TimeRange>>,
    pub wednesday: Option<Vec<TimeRange>>,
    pub thursday: Option<Vec<TimeRange>>,
    pub friday: Option<Vec<TimeRange>>,
    pub saturday: Option<Vec<TimeRange>>,
}

impl WeeklySchedule {
    /// Day columns in week order, paired with their day-of-week number
    /// (0 = Sunday .. 6 = Saturday).
    pub fn days(&self) -> [(u8, Option<&[TimeRange]>); 7] {
        [
            (0, self.sunday.as_deref()),
            (1, self.monday.as_deref()),
            (2, self.tuesday.as_deref()),
            (3, self.wednesday.as_deref()),
            (4, self.thursday.as_deref()),
            (5, self.friday.as_deref()),
            (6, self.saturday.as_deref()),
        ]
    }

    /// Number of enabled days.
    pub fn enabled_days(&self) -> usize {
        self.days().iter().filter(|(_, ranges)| ranges.is_some()).count()
    }
}

fn day_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        _ => "Saturday",
    }
}

/// Validate a week grid and lower it to weekly-recurring slots.
///
/// Checks, in order: the timezone is a known IANA name, at least one day is
/// enabled, every enabled day has at least one range, every range parses and
/// runs forward, and no two ranges on the same day overlap (adjacent ranges
/// like 09:00-12:00 and 12:00-17:00 are fine).
///
/// The output is deterministic: slots come out in week order, then in the
/// order ranges were listed within the day, and a given grid always compiles
/// to the same slot ids.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] naming the offending day and range;
/// no slots are returned on any failure.
pub fn compile(
    interviewer_id: &str,
    schedule: &WeeklySchedule,
    timezone: &str,
) -> Result<Vec<AvailabilitySlot>> {
    timezone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| BookingError::Validation(format!("invalid timezone: {timezone}")))?;

    let enabled: Vec<(u8, &[TimeRange])> = schedule
        .days()
        .into_iter()
        .filter_map(|(day, ranges)| ranges.map(|r| (day, r)))
        .collect();
    if enabled.is_empty() {
        return Err(BookingError::Validation(
            "schedule enables no days".to_string(),
        ));
    }

    let mut slots = Vec::new();
    for (day, ranges) in enabled {
        if ranges.is_empty() {
            return Err(BookingError::Validation(format!(
                "{} is enabled but lists no time ranges",
                day_name(day)
            )));
        }

        let mut parsed: Vec<(u16, u16, &TimeRange)> = Vec::with_capacity(ranges.len());
        for range in ranges {
            let start = interval::time_to_minutes(&range.start).map_err(|_| {
                BookingError::Validation(format!(
                    "{}: invalid time {:?}, expected HH:MM",
                    day_name(day),
                    range.start
                ))
            })?;
            let end = interval::time_to_minutes(&range.end).map_err(|_| {
                BookingError::Validation(format!(
                    "{}: invalid time {:?}, expected HH:MM",
                    day_name(day),
                    range.end
                ))
            })?;
            if start >= end {
                return Err(BookingError::Validation(format!(
                    "{}: range {}-{} must start before it ends",
                    day_name(day),
                    range.start,
                    range.end
                )));
            }
            parsed.push((start, end, range));
        }

        for i in 0..parsed.len() {
            for j in (i + 1)..parsed.len() {
                if interval::overlaps(parsed[i].0, parsed[i].1, parsed[j].0, parsed[j].1) {
                    return Err(BookingError::Validation(format!(
                        "{}: ranges {}-{} and {}-{} overlap",
                        day_name(day),
                        parsed[i].2.start,
                        parsed[i].2.end,
                        parsed[j].2.start,
                        parsed[j].2.end
                    )));
                }
            }
        }

        for (start, end, _) in parsed {
            slots.push(AvailabilitySlot::weekly(
                interviewer_id,
                day,
                &interval::minutes_to_time(start),
                &interval::minutes_to_time(end),
                timezone,
            )?);
        }
    }

    Ok(slots)
}
