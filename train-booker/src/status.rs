//! Progress reporting for a booking session.
//!
//! A session can run for thousands of attempts. Each step it takes is
//! reported as a [`Status`] so a front end can show what is happening; the
//! `Display` form of a status is the text meant for the user.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::booking::SearchOutcome;
use crate::domain::TimeOfDay;

/// One observable step of a booking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    SessionOpened { url: String },
    Attempt { attempt: u32, max_attempts: u32 },
    Outcome { attempt: u32, outcome: SearchOutcome },
    Cooldown { attempt: u32, delay: Duration },
    ResultsReached { attempts: u32 },
    TrainsListed { departures: Vec<TimeOfDay> },
    TrainSelected { departure: TimeOfDay, priority: Option<usize> },
    NoMatchingTrain { available: usize },
    ReturnedToSearch { restart: u32 },
    PassengerInfoFilled,
    DryRunStopped,
    Committed,
    SnapshotSaved { path: PathBuf },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::SessionOpened { url } => write!(f, "opened {url}"),
            Status::Attempt {
                attempt,
                max_attempts,
            } => write!(f, "attempt {attempt}/{max_attempts}: submitting search"),
            Status::Outcome { attempt, outcome } => {
                write!(f, "attempt {attempt}: {}", outcome.describe())
            }
            Status::Cooldown { attempt, delay } => write!(
                f,
                "attempt {attempt}: waiting {:.1}s before retrying",
                delay.as_secs_f64()
            ),
            Status::ResultsReached { attempts } => {
                write!(f, "reached train list after {attempts} attempt(s)")
            }
            Status::TrainsListed { departures } => {
                let times: Vec<&str> = departures.iter().map(TimeOfDay::as_str).collect();
                write!(f, "trains on offer: {}", times.join(", "))
            }
            Status::TrainSelected {
                departure,
                priority: Some(p),
            } => write!(f, "selected {departure} (preference {})", p + 1),
            Status::TrainSelected {
                departure,
                priority: None,
            } => write!(f, "selected {departure} (earliest available)"),
            Status::NoMatchingTrain { available } => write!(
                f,
                "none of {available} listed train(s) fits the preferred times"
            ),
            Status::ReturnedToSearch { restart } => {
                write!(f, "back to search (restart {restart})")
            }
            Status::PassengerInfoFilled => f.write_str("passenger details filled in"),
            Status::DryRunStopped => {
                f.write_str("dry run: stopped before the final booking button")
            }
            Status::Committed => f.write_str("final booking submitted"),
            Status::SnapshotSaved { path } => write!(f, "screenshot saved to {}", path.display()),
        }
    }
}

/// Receiver of [`Status`] updates.
pub trait StatusSink {
    fn report(&self, status: Status);
}

/// Discards every update.
impl StatusSink for () {
    fn report(&self, _status: Status) {}
}

/// Forwards updates to a channel; a closed channel is ignored.
impl StatusSink for UnboundedSender<Status> {
    fn report(&self, status: Status) {
        let _ = self.send(status);
    }
}

/// Collects updates in memory.
impl StatusSink for Mutex<Vec<Status>> {
    fn report(&self, status: Status) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(status);
    }
}
