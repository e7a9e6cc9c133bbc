//! Domain types for the booking workflow.
//!
//! This module contains the validated inputs of a booking: stations, search
//! criteria, passenger details and departure-time preferences. All types
//! enforce their invariants at construction time, so code that receives
//! these types can trust their validity.

mod criteria;
mod error;
mod preferences;
mod station;
mod time;

pub use criteria::{MAX_PASSENGERS, PassengerInfo, SearchCriteria};
pub use error::DomainError;
pub use preferences::PreferenceList;
pub use station::{InvalidStation, Station};
pub use time::{TimeError, TimeOfDay, TimeRange};
