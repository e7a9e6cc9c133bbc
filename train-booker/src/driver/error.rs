//! Driver error types.

use std::time::Duration;

/// Errors from an [`AutomationDriver`](super::AutomationDriver) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// No element matches the selector
    #[error("no element matches {selector:?}")]
    NotFound { selector: String },

    /// A bounded wait expired
    #[error("timed out after {ms}ms waiting for {what}", ms = .after.as_millis())]
    Timeout { what: String, after: Duration },

    /// The handle refers to a page that has since changed
    #[error("stale element handle for {selector:?}")]
    StaleHandle { selector: String },

    /// An interaction was rejected by the page
    #[error("{action} failed: {message}")]
    Action {
        action: &'static str,
        message: String,
    },

    /// The driver could not be set up or has gone away
    #[error("driver unavailable: {0}")]
    Unavailable(String),
}

impl DriverError {
    /// Returns true for [`DriverError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}
