//! Transition guards for the booking status machine.
//!
//! Every status change is checked here before it is applied: first that the
//! actor is a party to the booking at all, then that the actor's role may
//! drive this particular transition, and last that the status machine allows
//! the move. Ordering matters: an outsider probing a booking learns nothing
//! about its state, because identity fails before legality is considered.

use crate::booking::{BookingStatus, InterviewBooking};
use crate::error::{BookingError, Result};

/// Check that `actor` may move `booking` to `to`.
///
/// Accept and confirm are interviewer-only; every other transition may be
/// driven by either party. AI bookings have no interviewer, so only the
/// candidate can act on them.
///
/// # Errors
///
/// [`BookingError::Authorization`] when the actor is not a party or lacks the
/// role for this transition, [`BookingError::Conflict`] when the status
/// machine forbids the move (including any move out of a terminal status).
pub fn authorize(booking: &InterviewBooking, to: BookingStatus, actor: &str) -> Result<()> {
    let is_candidate = booking.candidate_id == actor;
    let is_interviewer = booking.interviewer_id.as_deref() == Some(actor);

    if !is_candidate && !is_interviewer {
        return Err(BookingError::Authorization(format!(
            "{actor} is not a party to booking {}",
            booking.id
        )));
    }

    let interviewer_only = matches!(to, BookingStatus::Accepted | BookingStatus::Confirmed);
    if interviewer_only && !is_interviewer {
        return Err(BookingError::Authorization(format!(
            "only the interviewer may move a booking to {to}"
        )));
    }

    if !booking.status.can_transition_to(to) {
        return Err(BookingError::Conflict(format!(
            "cannot move booking {} from {} to {to}",
            booking.id, booking.status
        )));
    }

    Ok(())
}
