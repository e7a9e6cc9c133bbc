//! Domain error types.
//!
//! These errors represent validation failures when building booking inputs.
//! They are distinct from driver and I/O errors.

use super::Station;

/// Domain-level errors for validating booking inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Origin and destination are the same station
    #[error("origin and destination are both {0}")]
    SameStation(Station),

    /// Passenger count outside what the form accepts
    #[error("passenger count {0} is outside 1-{max}", max = super::MAX_PASSENGERS)]
    InvalidPassengerCount(u8),

    /// A required text field was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}
