//! In-memory availability and booking store.
//!
//! Slots and bookings live behind `RwLock`ed maps keyed by interviewer and
//! booking id. Reservation is the one operation that must be atomic across a
//! check and a write, so each interviewer has a reservation gate: a mutex
//! taken for the whole availability-check / conflict-check / insert sequence.
//! Two concurrent requests for the same interviewer serialize on that gate,
//! and the loser sees the winner's booking when its own conflict scan runs.
//!
//! Status transitions never need the gate. The set of time-holding bookings
//! only ever grows under the gate; a transition can shrink it (cancel) or
//! move a booking to a non-blocking status, and either outcome is safe to
//! interleave with a reservation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::availability::{self, AvailabilitySlot, Recurrence, TimeSlot};
use crate::booking::InterviewBooking;
use crate::conflict;
use crate::error::{BookingError, Result};
use crate::interval;

/// Thread-safe in-memory store for slots and bookings.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Vec<AvailabilitySlot>>>,
    bookings: RwLock<HashMap<Uuid, InterviewBooking>>,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reservation gate for one interviewer, created on first use.
    fn gate(&self, interviewer_id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().expect("lock poisoned");
        gates.entry(interviewer_id.to_string()).or_default().clone()
    }

    // ── Availability slots ──

    /// Insert a slot, or update it in place when the id already exists.
    ///
    /// An update keeps the original `created_at` and reactivates a
    /// soft-deleted slot. Rejected before any write: a timezone that differs
    /// from the interviewer's other active slots, and a recurring slot that
    /// overlaps another active recurring slot on the same day.
    pub fn upsert_slot(&self, slot: AvailabilitySlot) -> Result<AvailabilitySlot> {
        let mut slots = self.slots.write().expect("lock poisoned");
        let entry = slots.entry(slot.interviewer_id.clone()).or_default();

        if let Some(other) = entry
            .iter()
            .find(|s| s.is_active && s.id != slot.id && s.timezone != slot.timezone)
        {
            return Err(BookingError::Validation(format!(
                "slot timezone {} does not match existing slots in {}",
                slot.timezone, other.timezone
            )));
        }

        if let (Recurrence::Weekly { day_of_week }, Some((start, end))) =
            (slot.recurrence, slot.bounds_minutes())
        {
            for other in entry.iter().filter(|s| s.is_active && s.id != slot.id) {
                let Recurrence::Weekly {
                    day_of_week: other_day,
                } = other.recurrence
                else {
                    continue;
                };
                if other_day != day_of_week {
                    continue;
                }
                if let Some((other_start, other_end)) = other.bounds_minutes() {
                    if interval::overlaps(start, end, other_start, other_end) {
                        return Err(BookingError::Validation(format!(
                            "slot {}-{} overlaps existing slot {}-{} on the same day",
                            slot.start_time, slot.end_time, other.start_time, other.end_time
                        )));
                    }
                }
            }
        }

        match entry.iter_mut().find(|s| s.id == slot.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = slot;
                existing.created_at = created_at;
                Ok(existing.clone())
            }
            None => {
                entry.push(slot.clone());
                Ok(slot)
            }
        }
    }

    /// Active slots for an interviewer, in insertion order. Unknown
    /// interviewers simply have none.
    pub fn list_slots(&self, interviewer_id: &str) -> Vec<AvailabilitySlot> {
        let slots = self.slots.read().expect("lock poisoned");
        slots
            .get(interviewer_id)
            .map(|entry| entry.iter().filter(|s| s.is_active).cloned().collect())
            .unwrap_or_default()
    }

    /// Soft-delete a slot by id. Deleting an already-inactive slot is a no-op.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] if no slot has this id.
    pub fn delete_slot(&self, slot_id: &str) -> Result<()> {
        let mut slots = self.slots.write().expect("lock poisoned");
        for entry in slots.values_mut() {
            if let Some(slot) = entry.iter_mut().find(|s| s.id == slot_id) {
                slot.is_active = false;
                return Ok(());
            }
        }
        Err(BookingError::NotFound(format!("slot {slot_id}")))
    }

    /// Replace an interviewer's recurring slots wholesale, leaving one-off
    /// slots untouched. `new_slots` is expected to come from
    /// [`crate::schedule::compile`], which guarantees internal consistency.
    ///
    /// Slots that survive the replacement (same id in the old and new set)
    /// keep their original `created_at`, so re-saving an unchanged schedule
    /// does not churn the records. The swap happens under one write lock;
    /// readers see either the old schedule or the new one, never a mix.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] if the new slots' timezone differs from
    /// the interviewer's active one-off slots.
    pub fn replace_recurring_slots(
        &self,
        interviewer_id: &str,
        new_slots: Vec<AvailabilitySlot>,
    ) -> Result<Vec<AvailabilitySlot>> {
        let mut slots = self.slots.write().expect("lock poisoned");
        let entry = slots.entry(interviewer_id.to_string()).or_default();

        if let Some(new_timezone) = new_slots.first().map(|s| s.timezone.clone()) {
            if let Some(kept) = entry
                .iter()
                .find(|s| s.is_active && !s.recurrence.is_recurring() && s.timezone != new_timezone)
            {
                return Err(BookingError::Validation(format!(
                    "schedule timezone {} does not match existing slots in {}",
                    new_timezone, kept.timezone
                )));
            }
        }

        let previous: HashMap<String, DateTime<Utc>> = entry
            .iter()
            .filter(|s| s.recurrence.is_recurring())
            .map(|s| (s.id.clone(), s.created_at))
            .collect();
        entry.retain(|s| !s.recurrence.is_recurring());

        for mut slot in new_slots {
            if let Some(&created_at) = previous.get(&slot.id) {
                slot.created_at = created_at;
            }
            entry.push(slot);
        }

        Ok(entry
            .iter()
            .filter(|s| s.recurrence.is_recurring())
            .cloned()
            .collect())
    }

    // ── Availability queries ──

    /// Whether a session of `duration_minutes` starting at `instant` falls
    /// entirely inside one of the interviewer's active slots, evaluated in
    /// the interviewer's timezone.
    ///
    /// An interviewer with no active slots is available at no time.
    pub fn is_available_at(
        &self,
        interviewer_id: &str,
        instant: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<bool> {
        let slots = self.slots.read().expect("lock poisoned");
        let entry = slots.get(interviewer_id).map(Vec::as_slice).unwrap_or(&[]);
        let Some(timezone) = active_timezone(entry) else {
            return Ok(false);
        };
        let moment = availability::resolve_in_zone(instant, timezone)?;
        Ok(availability::covering_slot(entry, moment, duration_minutes).is_some())
    }

    /// All fixed-duration sub-slots the interviewer's slots expand to on a
    /// local calendar date, booked or not.
    pub fn available_sub_slots(
        &self,
        interviewer_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Vec<TimeSlot> {
        let slots = self.slots.read().expect("lock poisoned");
        let entry = slots.get(interviewer_id).map(Vec::as_slice).unwrap_or(&[]);
        availability::sub_slots_for_date(entry, date, duration_minutes)
    }

    /// Sub-slots on a local calendar date that no time-holding booking
    /// overlaps. This is what a candidate picks from.
    ///
    /// Each sub-slot is anchored to an absolute instant via the
    /// interviewer's timezone. On a DST fold the earlier instant is used; a
    /// sub-slot erased by a DST gap is dropped entirely.
    pub fn bookable_sub_slots(
        &self,
        interviewer_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Vec<TimeSlot> {
        let candidates;
        let timezone;
        {
            let slots = self.slots.read().expect("lock poisoned");
            let entry = slots.get(interviewer_id).map(Vec::as_slice).unwrap_or(&[]);
            let Some(tz) = active_timezone(entry) else {
                return Vec::new();
            };
            timezone = tz.to_string();
            candidates = availability::sub_slots_for_date(entry, date, duration_minutes);
        }
        let Ok(tz) = timezone.parse::<chrono_tz::Tz>() else {
            return Vec::new();
        };

        let existing = self.bookings_for_interviewer(interviewer_id);
        candidates
            .into_iter()
            .filter(|slot| {
                let Some(start) = instant_on(tz, date, &slot.start) else {
                    return false;
                };
                !conflict::has_conflict(&existing, start, duration_minutes)
            })
            .collect()
    }

    // ── Bookings ──

    /// Atomically check and insert a booking.
    ///
    /// Live bookings are checked under the interviewer's reservation gate:
    /// the requested time must fall inside declared availability, and must
    /// not overlap any booking that still holds time. AI bookings have no
    /// interviewer to contend for and insert directly.
    ///
    /// # Errors
    ///
    /// [`BookingError::Conflict`] when the time is outside declared
    /// availability or overlaps an existing booking.
    pub fn reserve(&self, booking: InterviewBooking) -> Result<InterviewBooking> {
        let Some(interviewer_id) = booking.interviewer_id.clone() else {
            let mut bookings = self.bookings.write().expect("lock poisoned");
            bookings.insert(booking.id, booking.clone());
            return Ok(booking);
        };

        let gate = self.gate(&interviewer_id);
        let _guard = gate.lock().expect("lock poisoned");

        {
            let slots = self.slots.read().expect("lock poisoned");
            let entry = slots.get(&interviewer_id).map(Vec::as_slice).unwrap_or(&[]);
            let covered = match active_timezone(entry) {
                Some(timezone) => {
                    let moment = availability::resolve_in_zone(booking.scheduled_at, timezone)?;
                    availability::covering_slot(entry, moment, booking.duration_minutes).is_some()
                }
                None => false,
            };
            if !covered {
                return Err(BookingError::Conflict(format!(
                    "requested time is outside {interviewer_id}'s declared availability"
                )));
            }
        }

        {
            let bookings = self.bookings.read().expect("lock poisoned");
            let existing: Vec<InterviewBooking> = bookings
                .values()
                .filter(|b| b.interviewer_id.as_deref() == Some(interviewer_id.as_str()))
                .cloned()
                .collect();
            if let Some(taken) =
                conflict::find_overlapping(&existing, booking.scheduled_at, booking.duration_minutes)
                    .first()
            {
                return Err(BookingError::Conflict(format!(
                    "requested time overlaps booking {} ({} to {})",
                    taken.id,
                    taken.scheduled_at,
                    taken.end_at()
                )));
            }
        }

        let mut bookings = self.bookings.write().expect("lock poisoned");
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    /// Fetch a booking by id.
    pub fn booking(&self, id: &Uuid) -> Option<InterviewBooking> {
        let bookings = self.bookings.read().expect("lock poisoned");
        bookings.get(id).cloned()
    }

    /// Apply a closure to a booking under the write lock and return the
    /// updated record. The closure mutates a scratch copy that is committed
    /// only when it returns `Ok`, so a closure that mutates and then refuses
    /// leaves the stored record untouched. Check-and-mutate sequences that
    /// go through here are atomic with respect to each other.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] if no booking has this id, or whatever the
    /// closure returns.
    pub fn update_booking<F>(&self, id: &Uuid, apply: F) -> Result<InterviewBooking>
    where
        F: FnOnce(&mut InterviewBooking) -> Result<()>,
    {
        let mut bookings = self.bookings.write().expect("lock poisoned");
        let entry = bookings
            .get_mut(id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
        let mut updated = entry.clone();
        apply(&mut updated)?;
        *entry = updated.clone();
        Ok(updated)
    }

    /// All bookings held by an interviewer, sorted by start time.
    pub fn bookings_for_interviewer(&self, interviewer_id: &str) -> Vec<InterviewBooking> {
        let bookings = self.bookings.read().expect("lock poisoned");
        let mut found: Vec<InterviewBooking> = bookings
            .values()
            .filter(|b| b.interviewer_id.as_deref() == Some(interviewer_id))
            .cloned()
            .collect();
        found.sort_by_key(|b| b.scheduled_at);
        found
    }

    /// All bookings made by a candidate, sorted by start time.
    pub fn bookings_for_candidate(&self, candidate_id: &str) -> Vec<InterviewBooking> {
        let bookings = self.bookings.read().expect("lock poisoned");
        let mut found: Vec<InterviewBooking> = bookings
            .values()
            .filter(|b| b.candidate_id == candidate_id)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.scheduled_at);
        found
    }
}

/// Timezone shared by an interviewer's active slots, if they have any.
fn active_timezone(slots: &[AvailabilitySlot]) -> Option<&str> {
    slots
        .iter()
        .find(|s| s.is_active)
        .map(|s| s.timezone.as_str())
}

/// Anchor a local `HH:MM` on a date to a UTC instant in `tz`.
///
/// Returns the earlier instant on a DST fold and `None` when the local time
/// does not exist (spring-forward gap).
fn instant_on(tz: chrono_tz::Tz, date: NaiveDate, time: &str) -> Option<DateTime<Utc>> {
    let minutes = interval::time_to_minutes(time).ok()?;
    let naive = date.and_hms_opt(u32::from(minutes) / 60, u32::from(minutes) % 60, 0)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Some(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
