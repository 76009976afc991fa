//! # booking-engine
//!
//! Scheduling core for an interview marketplace: interviewers declare when
//! they are free, candidates book sessions against that availability, and
//! bookings move through a guarded lifecycle from request to completion.
//!
//! The one invariant everything here defends is that an interviewer is never
//! double-booked: at no point do two time-holding bookings for the same
//! interviewer overlap, no matter how requests race.
//!
//! ## Modules
//!
//! - [`interval`] — `HH:MM` parsing and half-open interval math on minutes
//! - [`availability`] — availability slots and timezone-aware evaluation
//! - [`schedule`] — week-grid validation and lowering to recurring slots
//! - [`conflict`] — overlap detection against existing bookings
//! - [`booking`] — booking records and the status machine
//! - [`lifecycle`] — who may drive which status transition
//! - [`store`] — thread-safe in-memory store with atomic reservation
//! - [`engine`] — the high-level operations callers use
//! - [`error`] — error types

pub mod availability;
pub mod booking;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod interval;
pub mod lifecycle;
pub mod schedule;
pub mod store;

pub use availability::{AvailabilitySlot, Recurrence, TimeSlot};
pub use booking::{
    BookingRequest, BookingStatus, CancellationRecord, InterviewBooking, MeetingLink, SessionKind,
    MAX_SESSION_MINUTES, MIN_SESSION_MINUTES,
};
pub use engine::{
    BookingEngine, MeetingProvisioner, NotificationKind, Notifier, NullNotifier,
};
pub use error::{BookingError, Result};
pub use schedule::{TimeRange, WeeklySchedule};
pub use store::MemoryStore;
