//! Terminal results of a booking session.

use std::fmt;
use std::path::PathBuf;

use crate::domain::TimeOfDay;

/// Why a session failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A stop was requested.
    Cancelled { attempts: u32 },
    /// The search never reached the train list.
    AttemptsExhausted { attempts: u32 },
    /// The page could not be driven after the search succeeded.
    Driver(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Cancelled { attempts } => {
                write!(f, "cancelled after {attempts} attempt(s)")
            }
            FailureReason::AttemptsExhausted { attempts } => {
                write!(f, "no train list after {attempts} attempt(s)")
            }
            FailureReason::Driver(message) => write!(f, "browser error: {message}"),
        }
    }
}

/// How a booking session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingResult {
    /// The booking went through, or would have in a dry run.
    Completed { dry_run: bool, departure: TimeOfDay },

    /// The final button was pressed but the site never confirmed the
    /// booking. It may or may not exist; check the snapshot.
    Indeterminate {
        departure: TimeOfDay,
        snapshot: Option<PathBuf>,
    },

    /// None of the listed trains fits the preferred times.
    ///
    /// `requires_restart` is set when preferences were given or trains were
    /// listed, so a fresh search may turn up a different listing. Only an
    /// empty listing with no preferences is final.
    NoMatchingOption {
        requires_restart: bool,
        available: Vec<TimeOfDay>,
    },

    /// The site dropped the session; a new search is needed.
    SessionExpired { snapshot: Option<PathBuf> },

    Failed {
        reason: FailureReason,
        snapshot: Option<PathBuf>,
    },
}

impl BookingResult {
    /// Whether a seat was booked (or would have been).
    pub fn is_completed(&self) -> bool {
        matches!(self, BookingResult::Completed { .. })
    }

    pub fn snapshot(&self) -> Option<&PathBuf> {
        match self {
            BookingResult::Indeterminate { snapshot, .. }
            | BookingResult::SessionExpired { snapshot }
            | BookingResult::Failed { snapshot, .. } => snapshot.as_ref(),
            BookingResult::Completed { .. } | BookingResult::NoMatchingOption { .. } => None,
        }
    }
}

impl fmt::Display for BookingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingResult::Completed {
                dry_run: true,
                departure,
            } => write!(f, "dry run complete: {departure} ready to book"),
            BookingResult::Completed {
                dry_run: false,
                departure,
            } => write!(f, "booked the {departure} departure"),
            BookingResult::Indeterminate { departure, .. } => write!(
                f,
                "submitted the {departure} booking but found no confirmation"
            ),
            BookingResult::NoMatchingOption { available, .. } if available.is_empty() => {
                f.write_str("no trains listed")
            }
            BookingResult::NoMatchingOption { available, .. } => {
                let times: Vec<&str> = available.iter().map(TimeOfDay::as_str).collect();
                write!(f, "no preferred train among {}", times.join(", "))
            }
            BookingResult::SessionExpired { .. } => f.write_str("booking session expired"),
            BookingResult::Failed { reason, .. } => write!(f, "booking failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    #[test]
    fn display() {
        let done = BookingResult::Completed {
            dry_run: true,
            departure: t("09:10"),
        };
        assert_eq!(done.to_string(), "dry run complete: 09:10 ready to book");
        assert!(done.is_completed());

        let none = BookingResult::NoMatchingOption {
            requires_restart: true,
            available: vec![t("06:00"), t("23:00")],
        };
        assert_eq!(none.to_string(), "no preferred train among 06:00, 23:00");

        let failed = BookingResult::Failed {
            reason: FailureReason::AttemptsExhausted { attempts: 1000 },
            snapshot: Some(PathBuf::from("booking_error-1.png")),
        };
        assert_eq!(
            failed.to_string(),
            "booking failed: no train list after 1000 attempt(s)"
        );
        assert_eq!(
            failed.snapshot(),
            Some(&PathBuf::from("booking_error-1.png"))
        );
    }
}
