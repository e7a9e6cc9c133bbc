//! The four-step booking workflow.
//!
//! ```text
//! Search ──► Select ──► PassengerInfo ──► Confirm
//!   │          │             │               │
//!   ▼          ▼             ▼               ▼
//! Failed   NoMatching    SessionExpired   Completed / Indeterminate
//!          Option
//! ```
//!
//! Search is the retry loop. Every later step is attempted once: once the
//! train list has been reached, a failure is reported rather than retried,
//! since the site's session state is no longer known.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::captcha::CaptchaSolver;
use crate::domain::{PassengerInfo, PreferenceList, SearchCriteria, TimeOfDay};
use crate::driver::{AutomationDriver, ClickOptions, DriverError, ScreenshotTarget, locate_required};
use crate::request::BookingRequest;
use crate::site::SiteProfile;
use crate::snapshot::{SnapshotKind, SnapshotWriter};
use crate::status::{Status, StatusSink};
use crate::stop::StopSignal;

use super::config::BookingConfig;
use super::result::{BookingResult, FailureReason};
use super::retry::{SearchLoopOutcome, SearchRetryLoop};
use super::select::{Selection, TrainOption, is_chronological, select_train};

/// Workflow position between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Search,
    Select,
    PassengerInfo { departure: TimeOfDay },
    Confirm { departure: TimeOfDay },
}

enum Step {
    Next(Stage),
    Done(BookingResult),
}

/// Drives one booking session through the site's steps.
pub struct BookingSequencer<D, S, R = ()> {
    driver: D,
    solver: S,
    site: SiteProfile,
    config: BookingConfig,
    snapshots: SnapshotWriter,
    status: R,
}

impl<D, S> BookingSequencer<D, S> {
    /// Snapshots go to the working directory and status updates are
    /// discarded until configured otherwise.
    pub fn new(driver: D, solver: S, site: SiteProfile, config: BookingConfig) -> Self {
        Self {
            driver,
            solver,
            site,
            config,
            snapshots: SnapshotWriter::new("."),
            status: (),
        }
    }
}

impl<D, S, R> BookingSequencer<D, S, R> {
    pub fn with_status<T>(self, status: T) -> BookingSequencer<D, S, T> {
        BookingSequencer {
            driver: self.driver,
            solver: self.solver,
            site: self.site,
            config: self.config,
            snapshots: self.snapshots,
            status,
        }
    }

    pub fn with_snapshots(mut self, snapshots: SnapshotWriter) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn status(&self) -> &R {
        &self.status
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }
}

impl<D, S, R> BookingSequencer<D, S, R>
where
    D: AutomationDriver,
    S: CaptchaSolver,
    R: StatusSink,
{
    /// Load the entry page and accept the cookie banner if one shows up.
    pub async fn open_session(&self) -> Result<(), DriverError> {
        info!(url = %self.site.home_url, "Opening booking site");
        self.driver.navigate(&self.site.home_url).await?;
        self.settle_load().await?;

        match self
            .driver
            .wait_for_selector(&self.site.cookie_accept, self.config.cookie_timeout)
            .await
        {
            Ok(button) => {
                if let Err(e) = self.driver.click(&button, ClickOptions::default()).await {
                    debug!(error = %e, "Failed to accept cookies");
                }
            }
            Err(e) if e.is_timeout() => debug!("No cookie banner"),
            Err(e) => return Err(e),
        }

        self.status.report(Status::SessionOpened {
            url: self.site.home_url.clone(),
        });
        Ok(())
    }

    /// Leave the train list for a fresh search form.
    ///
    /// Follows the site's own "search again" link when there is one, and
    /// reloads the entry page otherwise.
    pub async fn return_to_search(&self) -> Result<(), DriverError> {
        match self.driver.locate(&self.site.search_again_link).await? {
            Some(link) => {
                debug!("Following search-again link");
                self.driver.click(&link, ClickOptions::default()).await?;
            }
            None => {
                debug!("No search-again link, reloading entry page");
                self.driver.navigate(&self.site.home_url).await?;
            }
        }
        self.settle_load().await?;
        self.driver.wait_for_timeout(self.config.restart_settle).await
    }

    /// Run the whole workflow once, starting from the search form.
    ///
    /// Never fails: every way the session can end is a [`BookingResult`].
    pub async fn run(&self, request: &BookingRequest, stop: &StopSignal) -> BookingResult {
        let mut stage = Stage::Search;

        loop {
            debug!(?stage, "Entering booking step");
            let step = match stage {
                Stage::Search => Ok(self.search(&request.criteria, stop).await),
                Stage::Select => self.select(&request.preferences).await,
                Stage::PassengerInfo { departure } => {
                    self.fill_passenger(&request.passenger, departure).await
                }
                Stage::Confirm { departure } => self.confirm(request.dry_run, departure).await,
            };

            let step = match step {
                Ok(step) => step,
                Err(e) => {
                    warn!(?stage, error = %e, "Booking step failed");
                    let snapshot = self.snapshot(SnapshotKind::Error).await;
                    Step::Done(BookingResult::Failed {
                        reason: FailureReason::Driver(e.to_string()),
                        snapshot,
                    })
                }
            };

            match step {
                Step::Next(next) => stage = next,
                Step::Done(result) => {
                    info!(%result, "Booking session finished");
                    return result;
                }
            }
        }
    }

    /// Run the workflow, going back to the search form whenever no listed
    /// train fit the preferences, up to `max_restarts` times.
    pub async fn run_until_booked(
        &self,
        request: &BookingRequest,
        stop: &StopSignal,
    ) -> BookingResult {
        let mut restarts = 0;

        loop {
            let result = self.run(request, stop).await;
            if !matches!(
                result,
                BookingResult::NoMatchingOption {
                    requires_restart: true,
                    ..
                }
            ) {
                return result;
            }
            if stop.is_stopped() {
                info!(restarts, "Stop requested, not searching again");
                return result;
            }
            if restarts >= self.config.max_restarts {
                warn!(restarts, "Restart limit reached");
                return result;
            }

            restarts += 1;
            if let Err(e) = self.return_to_search().await {
                warn!(error = %e, "Failed to get back to the search form");
                let snapshot = self.snapshot(SnapshotKind::Error).await;
                return BookingResult::Failed {
                    reason: FailureReason::Driver(e.to_string()),
                    snapshot,
                };
            }
            info!(restart = restarts, "Searching again");
            self.status.report(Status::ReturnedToSearch { restart: restarts });
        }
    }

    async fn search(&self, criteria: &SearchCriteria, stop: &StopSignal) -> Step {
        let search = SearchRetryLoop::new(
            &self.driver,
            &self.solver,
            &self.site,
            &self.config,
            &self.status,
        );

        match search.run(criteria, stop).await {
            SearchLoopOutcome::Success { attempts } => {
                info!(attempts, "Reached train list");
                self.status.report(Status::ResultsReached { attempts });
                Step::Next(Stage::Select)
            }
            SearchLoopOutcome::Aborted { attempts } => Step::Done(BookingResult::Failed {
                reason: FailureReason::Cancelled { attempts },
                snapshot: None,
            }),
            SearchLoopOutcome::Exhausted { attempts } => {
                let snapshot = self.snapshot(SnapshotKind::Error).await;
                Step::Done(BookingResult::Failed {
                    reason: FailureReason::AttemptsExhausted { attempts },
                    snapshot,
                })
            }
        }
    }

    async fn select(&self, preferences: &PreferenceList) -> Result<Step, DriverError> {
        if let Err(e) = self
            .driver
            .wait_for_selector(&self.site.results_listing, self.config.results_timeout)
            .await
        {
            debug!(error = %e, "Train list not visible, reading options anyway");
        }

        let options = self.read_options().await?;
        let departures: Vec<TimeOfDay> = options.iter().map(|o| o.departure).collect();
        info!(count = options.len(), "Read train options");
        self.status.report(Status::TrainsListed {
            departures: departures.clone(),
        });
        if !is_chronological(&options) {
            warn!("Train list is not in departure order");
        }

        let (handle, departure) = match select_train(&options, preferences) {
            Selection::Selected { option, priority } => {
                info!(departure = %option.departure, ?priority, "Selected train");
                self.status.report(Status::TrainSelected {
                    departure: option.departure,
                    priority,
                });
                (option.handle.clone(), option.departure)
            }
            Selection::NoMatch => {
                warn!(available = options.len(), "No listed train fits the preferred times");
                self.status.report(Status::NoMatchingTrain {
                    available: options.len(),
                });
                return Ok(Step::Done(BookingResult::NoMatchingOption {
                    requires_restart: !preferences.is_empty() || !options.is_empty(),
                    available: departures,
                }));
            }
        };

        self.driver.click(&handle, ClickOptions::default()).await?;
        self.driver
            .wait_for_timeout(self.config.selection_settle)
            .await?;
        let submit = locate_required(&self.driver, &self.site.select_submit).await?;
        self.driver.click(&submit, ClickOptions::default()).await?;
        self.settle_load().await?;

        Ok(Step::Next(Stage::PassengerInfo { departure }))
    }

    /// Every train radio with a readable departure time, in listing order.
    async fn read_options(&self) -> Result<Vec<TrainOption<D::Handle>>, DriverError> {
        let radios = self.driver.locate_all(&self.site.train_radio).await?;
        let mut options = Vec::with_capacity(radios.len());

        for radio in radios {
            let Some(departure) = self
                .read_time(&radio, &self.site.departure_attributes)
                .await?
            else {
                debug!(?radio, "Skipping train without a departure time");
                continue;
            };
            let arrival = self.read_time(&radio, &self.site.arrival_attributes).await?;

            let option = TrainOption::new(departure, radio);
            options.push(match arrival {
                Some(arrival) => option.with_arrival(arrival),
                None => option,
            });
        }
        Ok(options)
    }

    /// First attribute in `names` holding a valid time.
    async fn read_time(
        &self,
        handle: &D::Handle,
        names: &[String],
    ) -> Result<Option<TimeOfDay>, DriverError> {
        for name in names {
            let Some(value) = self.driver.read_attribute(handle, name).await? else {
                continue;
            };
            match TimeOfDay::parse(&value) {
                Ok(time) => return Ok(Some(time)),
                Err(e) => debug!(attribute = %name, %value, error = %e, "Unreadable time"),
            }
        }
        Ok(None)
    }

    async fn fill_passenger(
        &self,
        passenger: &PassengerInfo,
        departure: TimeOfDay,
    ) -> Result<Step, DriverError> {
        let content = self.driver.page_content().await?;
        if self.site.is_session_expired(&content) {
            warn!("Site ended the booking session");
            let snapshot = self.snapshot(SnapshotKind::Error).await;
            return Ok(Step::Done(BookingResult::SessionExpired { snapshot }));
        }

        let id = self
            .driver
            .wait_for_selector(&self.site.id_input, self.config.field_timeout)
            .await?;
        self.driver.fill(&id, passenger.person_id()).await?;

        let phone = locate_required(&self.driver, &self.site.phone_input).await?;
        self.driver.fill(&phone, passenger.phone()).await?;

        let terms = locate_required(&self.driver, &self.site.terms_checkbox).await?;
        self.driver.check(&terms).await?;

        if let Some(email) = passenger.email() {
            let field = locate_required(&self.driver, &self.site.email_input).await?;
            self.driver.fill(&field, email).await?;
        }

        debug!("Passenger details filled");
        self.status.report(Status::PassengerInfoFilled);
        Ok(Step::Next(Stage::Confirm { departure }))
    }

    async fn confirm(&self, dry_run: bool, departure: TimeOfDay) -> Result<Step, DriverError> {
        if dry_run {
            info!(%departure, "Dry run, leaving the booking unsubmitted");
            self.status.report(Status::DryRunStopped);
            return Ok(Step::Done(BookingResult::Completed {
                dry_run: true,
                departure,
            }));
        }

        let commit = locate_required(&self.driver, &self.site.commit_button).await?;
        self.driver.click(&commit, ClickOptions::default()).await?;
        self.settle_load().await?;
        self.status.report(Status::Committed);

        let content = self.driver.page_content().await?;
        if self.site.is_booking_confirmed(&content) {
            info!(%departure, "Booking confirmed");
            return Ok(Step::Done(BookingResult::Completed {
                dry_run: false,
                departure,
            }));
        }

        warn!(%departure, "No confirmation after final submit");
        let snapshot = self.snapshot(SnapshotKind::Result).await;
        Ok(Step::Done(BookingResult::Indeterminate {
            departure,
            snapshot,
        }))
    }

    /// Wait for the current navigation to load. A timeout is tolerated;
    /// the page is inspected either way.
    async fn settle_load(&self) -> Result<(), DriverError> {
        match self
            .driver
            .wait_for_load(self.config.page_load_timeout)
            .await
        {
            Err(e) if e.is_timeout() => {
                debug!(error = %e, "Page load not signalled");
                Ok(())
            }
            other => other,
        }
    }

    /// Capture the page. Failure to capture is logged, never fatal.
    async fn snapshot(&self, kind: SnapshotKind) -> Option<PathBuf> {
        let png = match self.driver.screenshot(ScreenshotTarget::Page).await {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "Failed to capture page");
                return None;
            }
        };

        match self.snapshots.save(kind, &png).await {
            Ok(path) => {
                info!(snapshot = %path.display(), "Saved snapshot");
                self.status.report(Status::SnapshotSaved { path: path.clone() });
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save snapshot");
                None
            }
        }
    }
}
