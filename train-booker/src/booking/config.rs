//! Policy values for a booking session.

use std::time::Duration;

/// Timing and retry policy for a booking session.
///
/// All waits are upper bounds handed to the driver; none of them is a
/// promise the site will respond in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfig {
    /// Maximum number of search submissions before giving up.
    pub max_attempts: u32,

    /// How long to wait for the network to go quiet after submitting.
    pub idle_timeout: Duration,

    /// Fixed wait used when no idle signal arrives in time.
    /// The site does not reliably signal completion.
    pub fallback_delay: Duration,

    /// Pause after a sold-out response before searching again.
    pub sold_out_cooldown: Duration,

    /// Pause after a response that could not be classified.
    pub unclassified_delay: Duration,

    /// How long to wait for the captcha image to appear.
    pub captcha_timeout: Duration,

    /// How long to wait for the train list on the results page.
    pub results_timeout: Duration,

    /// How long to wait for a page to load after a step is submitted.
    pub page_load_timeout: Duration,

    /// How long to wait for the passenger form fields.
    pub field_timeout: Duration,

    /// Pause after picking a train so the site's own radio handler can run.
    pub selection_settle: Duration,

    /// How long to look for the cookie banner when opening the site.
    pub cookie_timeout: Duration,

    /// Pause after following the "search again" link.
    pub restart_settle: Duration,

    /// How many times [`run_until_booked`](super::BookingSequencer::run_until_booked)
    /// goes back to the search page when no preferred train is listed.
    pub max_restarts: u32,
}

impl BookingConfig {
    /// Default policy with a custom attempt ceiling.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn with_max_restarts(mut self, n: u32) -> Self {
        self.max_restarts = n;
        self
    }

    /// Set the backoff delays for sold-out and unclassified responses.
    pub fn with_backoff(mut self, sold_out: Duration, unclassified: Duration) -> Self {
        self.sold_out_cooldown = sold_out;
        self.unclassified_delay = unclassified;
        self
    }

    /// Set the idle wait and its fixed fallback.
    pub fn with_idle_wait(mut self, timeout: Duration, fallback: Duration) -> Self {
        self.idle_timeout = timeout;
        self.fallback_delay = fallback;
        self
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            idle_timeout: Duration::from_secs(10),
            fallback_delay: Duration::from_secs(5),
            sold_out_cooldown: Duration::from_secs(5),
            unclassified_delay: Duration::from_secs(2),
            captcha_timeout: Duration::from_secs(10),
            results_timeout: Duration::from_secs(10),
            page_load_timeout: Duration::from_secs(15),
            field_timeout: Duration::from_secs(10),
            selection_settle: Duration::from_millis(500),
            cookie_timeout: Duration::from_secs(2),
            restart_settle: Duration::from_secs(2),
            max_restarts: 20,
        }
    }
}
