//! Booking workflow.
//!
//! This module holds the three pieces that make the booking robust against
//! an unreliable site: the retry loop that keeps searching until a train
//! list appears, the selector that picks the best listed train under an
//! ordered list of preferred time ranges, and the sequencer that walks the
//! remaining steps, stopping short of the final button in a dry run.

mod classify;
mod config;
mod result;
mod retry;
mod select;
mod sequencer;

#[cfg(test)]
mod fixtures;

pub use classify::{SearchOutcome, classify, classify_error_text, is_meaningful_error};
pub use config::BookingConfig;
pub use result::{BookingResult, FailureReason};
pub use retry::{RetryAction, SearchLoopOutcome, SearchRetryLoop, next_action};
pub use select::{Candidate, Selection, TrainOption, is_chronological, rank_candidates, select_train};
pub use sequencer::BookingSequencer;
