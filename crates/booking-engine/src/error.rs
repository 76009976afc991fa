//! Error types for booking-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    /// Input that fails structural checks before any state is touched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced booking or availability slot does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is valid in form but loses to current state, such as
    /// an overlapping booking or an illegal status transition.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The acting user is not allowed to perform this operation.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// A downstream dependency (notifications, meeting links) failed.
    #[error("Dependency error: {0}")]
    Dependency(String),
}

pub type Result<T> = std::result::Result<T, BookingError>;
