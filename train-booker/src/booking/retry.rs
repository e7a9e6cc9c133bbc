//! The search retry loop.
//!
//! Seats are released unpredictably and the captcha is often wrong, so the
//! first booking step is repeated until the train list appears. Each attempt
//! rewrites the whole search form, solves a fresh captcha, submits, and
//! classifies the response. What happens next depends only on the attempt
//! count and the outcome, see [`next_action`]:
//!
//! - captcha rejected: retry at once, a new code is cheap
//! - sold out: wait out a cooldown before asking again
//! - anything unrecognised: wait a shorter delay
//!
//! A driver error inside an attempt never ends the loop. It is logged and the
//! attempt counts as unclassified.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::captcha::CaptchaSolver;
use crate::domain::SearchCriteria;
use crate::driver::{AutomationDriver, ClickOptions, DriverError, ScreenshotTarget, locate_required};
use crate::site::SiteProfile;
use crate::status::{Status, StatusSink};
use crate::stop::StopSignal;

use super::classify::{SearchOutcome, classify};
use super::config::BookingConfig;

/// How the retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLoopOutcome {
    /// The train list is showing.
    Success { attempts: u32 },
    /// A stop was requested.
    Aborted { attempts: u32 },
    /// The attempt ceiling was reached.
    Exhausted { attempts: u32 },
}

impl SearchLoopOutcome {
    /// Number of submissions made.
    pub fn attempts(self) -> u32 {
        match self {
            SearchLoopOutcome::Success { attempts }
            | SearchLoopOutcome::Aborted { attempts }
            | SearchLoopOutcome::Exhausted { attempts } => attempts,
        }
    }
}

/// What the loop does after classifying an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Finish(SearchLoopOutcome),
    RetryNow,
    RetryAfter(Duration),
}

/// Decide the next step after `attempts_made` submissions, the last of which
/// produced `outcome`.
pub fn next_action(
    attempts_made: u32,
    outcome: SearchOutcome,
    config: &BookingConfig,
) -> RetryAction {
    match outcome {
        SearchOutcome::Success => RetryAction::Finish(SearchLoopOutcome::Success {
            attempts: attempts_made,
        }),
        SearchOutcome::Aborted => RetryAction::Finish(SearchLoopOutcome::Aborted {
            attempts: attempts_made,
        }),
        _ if attempts_made >= config.max_attempts => {
            RetryAction::Finish(SearchLoopOutcome::Exhausted {
                attempts: attempts_made,
            })
        }
        SearchOutcome::CaptchaError => RetryAction::RetryNow,
        SearchOutcome::SoldOut => RetryAction::RetryAfter(config.sold_out_cooldown),
        SearchOutcome::Unclassified => RetryAction::RetryAfter(config.unclassified_delay),
    }
}

/// Repeats the search step until the train list appears.
pub struct SearchRetryLoop<'a, D, S, R> {
    driver: &'a D,
    solver: &'a S,
    site: &'a SiteProfile,
    config: &'a BookingConfig,
    status: &'a R,
}

impl<'a, D, S, R> SearchRetryLoop<'a, D, S, R>
where
    D: AutomationDriver,
    S: CaptchaSolver,
    R: StatusSink,
{
    pub fn new(
        driver: &'a D,
        solver: &'a S,
        site: &'a SiteProfile,
        config: &'a BookingConfig,
        status: &'a R,
    ) -> Self {
        Self {
            driver,
            solver,
            site,
            config,
            status,
        }
    }

    /// Run the loop. The stop signal is checked before each attempt fills
    /// the form and again after its response has been waited for.
    pub async fn run(&self, criteria: &SearchCriteria, stop: &StopSignal) -> SearchLoopOutcome {
        let mut attempt = 0;

        loop {
            if stop.is_stopped() {
                info!(attempts = attempt, "Stop requested, aborting search");
                return SearchLoopOutcome::Aborted { attempts: attempt };
            }
            if attempt >= self.config.max_attempts {
                return SearchLoopOutcome::Exhausted { attempts: attempt };
            }
            attempt += 1;

            self.status.report(Status::Attempt {
                attempt,
                max_attempts: self.config.max_attempts,
            });
            debug!(attempt, "Refilling search form");
            self.apply_criteria(criteria).await;

            match self.enter_captcha().await {
                Ok(Some(_)) => {}
                Ok(None) => debug!(attempt, "No captcha code, submitting with the field empty"),
                Err(e) => warn!(attempt, error = %e, "Failed to handle captcha"),
            }

            self.submit().await;

            let outcome = if stop.is_stopped() {
                SearchOutcome::Aborted
            } else {
                classify(self.driver, self.site)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(attempt, error = %e, "Failed to inspect search response");
                        SearchOutcome::Unclassified
                    })
            };
            info!(attempt, ?outcome, "Search attempt finished");
            self.status.report(Status::Outcome { attempt, outcome });

            match next_action(attempt, outcome, self.config) {
                RetryAction::Finish(result) => {
                    if let SearchLoopOutcome::Exhausted { attempts } = result {
                        warn!(attempts, "Giving up: attempt limit reached");
                    }
                    return result;
                }
                RetryAction::RetryNow => {}
                RetryAction::RetryAfter(delay) => {
                    self.status.report(Status::Cooldown { attempt, delay });
                    if let Err(e) = self.driver.wait_for_timeout(delay).await {
                        warn!(attempt, error = %e, "Retry delay failed");
                    }
                }
            }
        }
    }

    /// Write every search field. Each field is attempted even if an earlier
    /// one fails; returns how many failed.
    pub async fn apply_criteria(&self, criteria: &SearchCriteria) -> usize {
        let site = self.site;
        let date = criteria.date_value();
        let passengers = criteria.passenger_label();

        let fields = [
            ("origin", &site.origin_select, Input::Select(criteria.origin().label())),
            (
                "destination",
                &site.destination_select,
                Input::Select(criteria.destination().label()),
            ),
            ("date", &site.date_input, Input::Value(&date)),
            (
                "departure time",
                &site.time_select,
                Input::Select(criteria.departure_label()),
            ),
            ("passengers", &site.quantity_select, Input::Select(&passengers)),
        ];

        let mut failed = 0;
        for (field, selector, input) in fields {
            if let Err(e) = self.write_field(selector, input).await {
                warn!(field, error = %e, "Failed to set search field");
                failed += 1;
            }
        }
        failed
    }

    async fn write_field(&self, selector: &str, input: Input<'_>) -> Result<(), DriverError> {
        let handle = locate_required(self.driver, selector).await?;
        match input {
            Input::Select(label) => self.driver.select_option(&handle, label).await,
            Input::Value(value) => self.driver.set_value(&handle, value).await,
        }
    }

    /// Screenshot the captcha, ask the solver, and type whatever it returns.
    /// Returns the code the field holds afterwards, `None` when it is empty.
    async fn enter_captcha(&self) -> Result<Option<String>, DriverError> {
        let image = self
            .driver
            .wait_for_selector(&self.site.captcha_image, self.config.captcha_timeout)
            .await?;
        let png = self
            .driver
            .screenshot(ScreenshotTarget::Element(&image))
            .await?;
        debug!(bytes = png.len(), "Captured captcha image");

        let code = self.solver.solve(&png).await;
        let input = locate_required(self.driver, &self.site.captcha_input).await?;
        self.driver
            .fill(&input, code.as_deref().unwrap_or(""))
            .await?;

        let entered = self.driver.input_value(&input).await?;
        debug!(code = %entered, "Captcha field before submit");
        if entered != code.as_deref().unwrap_or("") {
            warn!(expected = ?code, %entered, "Captcha field does not hold the solved code");
        }
        Ok(Some(entered).filter(|c| !c.is_empty()))
    }

    /// Click submit and wait for the response, falling back to a fixed delay
    /// when the page never signals that it is idle.
    async fn submit(&self) {
        match locate_required(self.driver, &self.site.search_submit).await {
            Ok(button) => {
                if let Err(e) = self.driver.click(&button, ClickOptions::forced()).await {
                    warn!(error = %e, "Submit click failed");
                }
            }
            Err(e) => warn!(error = %e, "Submit button not found"),
        }

        if let Err(e) = self.driver.wait_for_idle(self.config.idle_timeout).await {
            debug!(error = %e, "No idle signal, using fixed wait");
            if let Err(e) = self.driver.wait_for_timeout(self.config.fallback_delay).await {
                warn!(error = %e, "Fallback wait failed");
            }
        }
    }
}

/// How a search field takes its value.
#[derive(Clone, Copy)]
enum Input<'a> {
    /// Choose a dropdown option by label.
    Select(&'a str),
    /// Set a (possibly hidden) input's value directly.
    Value(&'a str),
}
