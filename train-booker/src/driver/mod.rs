//! Browser automation capability consumed by the booking workflow.
//!
//! The workflow never talks to a concrete browser. Everything it needs from
//! the page (navigation, element lookup, form input, waiting, screenshots)
//! goes through [`AutomationDriver`], so it can be driven by a real browser
//! binding or by [`ScriptedDriver`] in tests and replays.
//!
//! Key characteristics the workflow relies on:
//! - Element handles are **ephemeral**: a handle obtained on one page must not
//!   be used after the page changes
//! - Every call may fail with a [`DriverError`]; the caller decides whether the
//!   failure is transient
//! - Calls are issued strictly one at a time; a driver instance belongs to a
//!   single session

mod error;
mod scripted;

use std::fmt;
use std::time::Duration;

pub use error::DriverError;
pub use scripted::{Action, ElementSpec, PageState, Script, ScriptedDriver, ScriptedHandle};

/// Options for [`AutomationDriver::click`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOptions {
    /// Click even if the element is covered or not yet actionable.
    pub force: bool,
}

impl ClickOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// What to capture in [`AutomationDriver::screenshot`].
#[derive(Debug, Clone, Copy)]
pub enum ScreenshotTarget<'a, H> {
    /// The whole visible page.
    Page,
    /// A single element.
    Element(&'a H),
}

/// Capabilities the booking workflow needs from a browser page.
///
/// This abstraction allows the workflow to be tested with scripted pages.
///
/// Calls are awaited in order on the session's own task and never spawned,
/// so the returned futures carry no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait AutomationDriver {
    /// Opaque reference to an element on the current page.
    type Handle: Clone + fmt::Debug;

    /// Navigate the page to `url`.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// First element matching `selector`, if any.
    async fn locate(&self, selector: &str) -> Result<Option<Self::Handle>, DriverError>;

    /// All elements matching `selector`, in document order.
    async fn locate_all(&self, selector: &str) -> Result<Vec<Self::Handle>, DriverError>;

    /// Value of an attribute, or `None` if the element lacks it.
    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Whether the element is rendered and visible.
    async fn is_visible(&self, handle: &Self::Handle) -> Result<bool, DriverError>;

    /// Rendered text of the element.
    async fn inner_text(&self, handle: &Self::Handle) -> Result<String, DriverError>;

    async fn click(&self, handle: &Self::Handle, options: ClickOptions)
    -> Result<(), DriverError>;

    /// Type `text` into an input, replacing its value.
    async fn fill(&self, handle: &Self::Handle, text: &str) -> Result<(), DriverError>;

    /// Set an input's value directly and fire its change event.
    ///
    /// Used for hidden inputs that cannot be typed into.
    async fn set_value(&self, handle: &Self::Handle, value: &str) -> Result<(), DriverError>;

    /// Choose the option with the given label in a `<select>`.
    async fn select_option(&self, handle: &Self::Handle, label: &str) -> Result<(), DriverError>;

    /// Tick a checkbox.
    async fn check(&self, handle: &Self::Handle) -> Result<(), DriverError>;

    /// Current value of an input.
    async fn input_value(&self, handle: &Self::Handle) -> Result<String, DriverError>;

    /// Wait until an element matching `selector` is visible.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, DriverError>;

    /// Wait until the network has been quiet. Fails with
    /// [`DriverError::Timeout`] if that does not happen within `timeout`.
    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), DriverError>;

    /// Wait until the DOM of the current navigation has loaded.
    async fn wait_for_load(&self, timeout: Duration) -> Result<(), DriverError>;

    /// Unconditional delay, measured by the page.
    async fn wait_for_timeout(&self, duration: Duration) -> Result<(), DriverError>;

    /// PNG screenshot of the page or of one element.
    async fn screenshot(
        &self,
        target: ScreenshotTarget<'_, Self::Handle>,
    ) -> Result<Vec<u8>, DriverError>;

    /// Full HTML of the current page.
    async fn page_content(&self) -> Result<String, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;
}

/// Locate an element that must exist.
pub async fn locate_required<D: AutomationDriver>(
    driver: &D,
    selector: &str,
) -> Result<D::Handle, DriverError> {
    driver
        .locate(selector)
        .await?
        .ok_or_else(|| DriverError::NotFound {
            selector: selector.to_string(),
        })
}
