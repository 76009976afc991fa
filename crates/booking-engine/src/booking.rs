//! Booking records and the status machine they move through.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest session a candidate may request, in minutes.
pub const MIN_SESSION_MINUTES: u32 = 15;
/// Longest session a candidate may request, in minutes.
pub const MAX_SESSION_MINUTES: u32 = 180;

/// Lifecycle status of a booking.
///
/// Transitions are linear with cancellation branches:
///
/// ```text
/// pending -> accepted -> confirmed -> in-progress -> completed
///    |           |           |
///    |           |           +-> no-show
///    +-----------+-----------+-> cancelled
/// ```
///
/// `completed`, `cancelled`, and `no-show` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Whether a booking in this status holds its time against new requests.
    ///
    /// `in-progress` is deliberately excluded: a running session already
    /// started inside its own window, so it only competes for time that has
    /// passed.
    pub fn blocks_scheduling(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Accepted | BookingStatus::Confirmed
        )
    }

    /// Whether the status machine allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, Confirmed)
                | (Accepted, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (InProgress, Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        };
        f.write_str(name)
    }
}

/// What kind of session a booking is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    /// Automated practice session; no interviewer, no contention.
    Ai,
    /// A session with a human interviewer.
    Live,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionKind::Ai => "ai",
            SessionKind::Live => "live",
        })
    }
}

/// Join details attached once a session room has been provisioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingLink {
    pub url: String,
    pub meeting_id: Option<String>,
    pub password: Option<String>,
}

/// Who cancelled, when, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_by: String,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

/// A scheduled interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewBooking {
    pub id: Uuid,
    pub candidate_id: String,
    /// `None` for AI sessions.
    pub interviewer_id: Option<String>,
    /// Session start as an absolute instant.
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub session: SessionKind,
    pub meeting: Option<MeetingLink>,
    pub cancellation: Option<CancellationRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewBooking {
    /// Exclusive session end; a booking ending here does not collide with one
    /// starting here.
    pub fn end_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Whether `user_id` is the candidate or the interviewer on this booking.
    pub fn involves(&self, user_id: &str) -> bool {
        self.candidate_id == user_id || self.interviewer_id.as_deref() == Some(user_id)
    }
}

/// Input for creating a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub candidate_id: String,
    /// Required for live sessions, absent for AI sessions.
    pub interviewer_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub session: SessionKind,
}
