//! High-level booking operations.
//!
//! [`BookingEngine`] is the single entry point callers use: it validates
//! input, drives the store, applies transition guards, and fans out to the
//! notification and meeting-link seams. Both seams are traits injected at
//! construction so hosts can wire real providers and tests can observe or
//! stub them. Notifications are fire-and-forget: a delivery failure is
//! logged and never fails the operation that triggered it, and the same
//! goes for meeting-link provisioning.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::availability::{AvailabilitySlot, TimeSlot};
use crate::booking::{
    BookingRequest, BookingStatus, CancellationRecord, InterviewBooking, MeetingLink, SessionKind,
    MAX_SESSION_MINUTES, MIN_SESSION_MINUTES,
};
use crate::conflict;
use crate::error::{BookingError, Result};
use crate::lifecycle;
use crate::schedule::{self, WeeklySchedule};
use crate::store::MemoryStore;

/// Which lifecycle event a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    BookingRequested,
    BookingAccepted,
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    BookingNoShow,
}

/// Outbound notification seam.
///
/// Implementations deliver however they like (email, push, a test inbox);
/// the engine only cares that the call returns.
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: &str, kind: NotificationKind, booking: &InterviewBooking)
        -> Result<()>;
}

/// Notifier that drops everything. The default when none is injected.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _: &str, _: NotificationKind, _: &InterviewBooking) -> Result<()> {
        Ok(())
    }
}

/// Meeting-room provisioning seam, called when a booking is accepted.
pub trait MeetingProvisioner: Send + Sync {
    fn create_meeting(
        &self,
        booking_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: u32,
        participants: &[&str],
    ) -> Result<MeetingLink>;
}

/// The booking engine. Cheap to share behind an [`Arc`]; all methods take
/// `&self`.
pub struct BookingEngine {
    store: Arc<MemoryStore>,
    notifier: Arc<dyn Notifier>,
    meetings: Option<Arc<dyn MeetingProvisioner>>,
}

impl BookingEngine {
    /// Engine over a store, with notifications dropped and meeting links
    /// disabled until seams are injected.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            notifier: Arc::new(NullNotifier),
            meetings: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_meeting_provisioner(mut self, provisioner: Arc<dyn MeetingProvisioner>) -> Self {
        self.meetings = Some(provisioner);
        self
    }

    // ── Availability ──

    /// Validate a week grid and swap it in as the interviewer's recurring
    /// availability. One-off date slots are untouched. Returns the stored
    /// recurring slots.
    pub fn set_weekly_schedule(
        &self,
        interviewer_id: &str,
        schedule: &WeeklySchedule,
        timezone: &str,
    ) -> Result<Vec<AvailabilitySlot>> {
        let compiled = schedule::compile(interviewer_id, schedule, timezone)?;
        let stored = self.store.replace_recurring_slots(interviewer_id, compiled)?;
        debug!(
            interviewer = interviewer_id,
            slots = stored.len(),
            "weekly schedule replaced"
        );
        Ok(stored)
    }

    /// Add or update a one-off availability window on a single date.
    pub fn upsert_date_slot(
        &self,
        interviewer_id: &str,
        date: NaiveDate,
        start: &str,
        end: &str,
        timezone: &str,
    ) -> Result<AvailabilitySlot> {
        let slot = AvailabilitySlot::on_date(interviewer_id, date, start, end, timezone)?;
        self.store.upsert_slot(slot)
    }

    /// Soft-delete one availability slot by id.
    pub fn remove_slot(&self, slot_id: &str) -> Result<()> {
        self.store.delete_slot(slot_id)
    }

    /// Active slots for an interviewer, in insertion order.
    pub fn list_slots(&self, interviewer_id: &str) -> Vec<AvailabilitySlot> {
        self.store.list_slots(interviewer_id)
    }

    /// Whether a session starting at `instant` fits inside declared
    /// availability, evaluated in the interviewer's timezone.
    pub fn is_available_at(
        &self,
        interviewer_id: &str,
        instant: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<bool> {
        self.store
            .is_available_at(interviewer_id, instant, duration_minutes)
    }

    /// Fixed-duration sub-slots declared for a local date, booked or not.
    pub fn available_sub_slots(
        &self,
        interviewer_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Vec<TimeSlot> {
        self.store
            .available_sub_slots(interviewer_id, date, duration_minutes)
    }

    /// Sub-slots for a local date that are still free to book.
    pub fn bookable_sub_slots(
        &self,
        interviewer_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Vec<TimeSlot> {
        self.store
            .bookable_sub_slots(interviewer_id, date, duration_minutes)
    }

    /// Advisory conflict probe: would a session at this time overlap any
    /// booking the interviewer still holds? Reservation re-checks under the
    /// gate, so a `false` here can still lose the race.
    pub fn check_conflict(
        &self,
        interviewer_id: &str,
        proposed_start: DateTime<Utc>,
        duration_minutes: u32,
    ) -> bool {
        let existing = self.store.bookings_for_interviewer(interviewer_id);
        conflict::has_conflict(&existing, proposed_start, duration_minutes)
    }

    // ── Booking lifecycle ──

    /// Create a booking.
    ///
    /// Live sessions start `pending` and are reserved atomically against the
    /// interviewer's availability and existing bookings. AI sessions have no
    /// interviewer, skip both checks, and are created `confirmed`.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] for a duration outside
    /// [`MIN_SESSION_MINUTES`]..=[`MAX_SESSION_MINUTES`] or a session kind
    /// inconsistent with the interviewer field; [`BookingError::Conflict`]
    /// when the slot is outside availability or already taken.
    pub fn request_booking(&self, request: BookingRequest) -> Result<InterviewBooking> {
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&request.duration_minutes) {
            return Err(BookingError::Validation(format!(
                "duration {} outside {MIN_SESSION_MINUTES}..={MAX_SESSION_MINUTES} minutes",
                request.duration_minutes
            )));
        }
        match (request.session, &request.interviewer_id) {
            (SessionKind::Live, None) => {
                return Err(BookingError::Validation(
                    "live sessions require an interviewer".to_string(),
                ));
            }
            (SessionKind::Ai, Some(_)) => {
                return Err(BookingError::Validation(
                    "ai sessions take no interviewer".to_string(),
                ));
            }
            _ => {}
        }

        let status = match request.session {
            SessionKind::Ai => BookingStatus::Confirmed,
            SessionKind::Live => BookingStatus::Pending,
        };
        let now = Utc::now();
        let booking = InterviewBooking {
            id: Uuid::new_v4(),
            candidate_id: request.candidate_id,
            interviewer_id: request.interviewer_id,
            scheduled_at: request.scheduled_at,
            duration_minutes: request.duration_minutes,
            status,
            session: request.session,
            meeting: None,
            cancellation: None,
            created_at: now,
            updated_at: now,
        };

        let booking = self.store.reserve(booking)?;
        debug!(
            booking = %booking.id,
            session = %booking.session,
            status = %booking.status,
            "booking created"
        );

        match booking.session {
            SessionKind::Live => {
                if let Some(interviewer) = booking.interviewer_id.as_deref() {
                    self.dispatch(interviewer, NotificationKind::BookingRequested, &booking);
                }
            }
            SessionKind::Ai => {
                self.dispatch(
                    &booking.candidate_id,
                    NotificationKind::BookingConfirmed,
                    &booking,
                );
            }
        }
        Ok(booking)
    }

    /// Interviewer accepts a pending booking. Provisions a meeting link when
    /// a provisioner is wired; a provisioning failure is logged and the
    /// booking stays accepted without a link.
    pub fn accept(&self, booking_id: Uuid, actor: &str) -> Result<InterviewBooking> {
        let mut booking = self.apply(booking_id, BookingStatus::Accepted, actor, None)?;

        if let Some(provisioner) = &self.meetings {
            let participants: Vec<&str> = [
                Some(booking.candidate_id.as_str()),
                booking.interviewer_id.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect();
            match provisioner.create_meeting(
                booking.id,
                booking.scheduled_at,
                booking.duration_minutes,
                &participants,
            ) {
                Ok(link) => {
                    booking = self.store.update_booking(&booking_id, |b| {
                        b.meeting = Some(link);
                        b.updated_at = Utc::now();
                        Ok(())
                    })?;
                }
                Err(err) => {
                    warn!(
                        booking = %booking.id,
                        error = %err,
                        "meeting provisioning failed, booking stays accepted without a link"
                    );
                }
            }
        }

        self.dispatch(
            &booking.candidate_id,
            NotificationKind::BookingAccepted,
            &booking,
        );
        Ok(booking)
    }

    /// Interviewer confirms an accepted booking.
    pub fn confirm(&self, booking_id: Uuid, actor: &str) -> Result<InterviewBooking> {
        let booking = self.apply(booking_id, BookingStatus::Confirmed, actor, None)?;
        self.dispatch(
            &booking.candidate_id,
            NotificationKind::BookingConfirmed,
            &booking,
        );
        Ok(booking)
    }

    /// Either party starts a confirmed session.
    pub fn start_session(&self, booking_id: Uuid, actor: &str) -> Result<InterviewBooking> {
        self.apply(booking_id, BookingStatus::InProgress, actor, None)
    }

    /// Either party completes a running session.
    pub fn complete(&self, booking_id: Uuid, actor: &str) -> Result<InterviewBooking> {
        let booking = self.apply(booking_id, BookingStatus::Completed, actor, None)?;
        self.dispatch(
            &booking.candidate_id,
            NotificationKind::BookingCompleted,
            &booking,
        );
        Ok(booking)
    }

    /// Record that the other side never turned up to a confirmed session.
    pub fn mark_no_show(&self, booking_id: Uuid, actor: &str) -> Result<InterviewBooking> {
        let booking = self.apply(booking_id, BookingStatus::NoShow, actor, None)?;
        if let Some(other) = counterpart(&booking, actor) {
            self.dispatch(other, NotificationKind::BookingNoShow, &booking);
        }
        Ok(booking)
    }

    /// Either party cancels. The freed time is immediately bookable again.
    pub fn cancel(
        &self,
        booking_id: Uuid,
        actor: &str,
        reason: Option<String>,
    ) -> Result<InterviewBooking> {
        let booking = self.apply(booking_id, BookingStatus::Cancelled, actor, reason)?;
        if let Some(other) = counterpart(&booking, actor) {
            self.dispatch(other, NotificationKind::BookingCancelled, &booking);
        }
        Ok(booking)
    }

    /// Fetch a booking by id.
    pub fn booking(&self, booking_id: Uuid) -> Result<InterviewBooking> {
        self.store
            .booking(&booking_id)
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))
    }

    /// All bookings held by an interviewer, sorted by start time.
    pub fn bookings_for_interviewer(&self, interviewer_id: &str) -> Vec<InterviewBooking> {
        self.store.bookings_for_interviewer(interviewer_id)
    }

    /// All bookings made by a candidate, sorted by start time.
    pub fn bookings_for_candidate(&self, candidate_id: &str) -> Vec<InterviewBooking> {
        self.store.bookings_for_candidate(candidate_id)
    }

    /// Guard and apply one status transition atomically.
    fn apply(
        &self,
        booking_id: Uuid,
        to: BookingStatus,
        actor: &str,
        cancel_reason: Option<String>,
    ) -> Result<InterviewBooking> {
        let updated = self.store.update_booking(&booking_id, |booking| {
            lifecycle::authorize(booking, to, actor)?;
            booking.status = to;
            booking.updated_at = Utc::now();
            if to == BookingStatus::Cancelled {
                booking.cancellation = Some(CancellationRecord {
                    cancelled_by: actor.to_string(),
                    reason: cancel_reason,
                    cancelled_at: Utc::now(),
                });
            }
            Ok(())
        })?;
        debug!(booking = %updated.id, status = %updated.status, actor, "booking transitioned");
        Ok(updated)
    }

    fn dispatch(&self, user_id: &str, kind: NotificationKind, booking: &InterviewBooking) {
        if let Err(err) = self.notifier.notify(user_id, kind, booking) {
            warn!(
                booking = %booking.id,
                user = user_id,
                kind = ?kind,
                error = %err,
                "notification dispatch failed"
            );
        }
    }
}

/// The other party on a booking, from the actor's point of view.
fn counterpart<'a>(booking: &'a InterviewBooking, actor: &str) -> Option<&'a str> {
    if booking.candidate_id == actor {
        booking.interviewer_id.as_deref()
    } else {
        Some(booking.candidate_id.as_str())
    }
}
