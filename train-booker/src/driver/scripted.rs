//! Scripted page driver for testing and replay without a browser.
//!
//! A [`Script`] describes the page the session starts on and the pages that
//! appear, in turn, each time a given element is clicked or a URL is
//! visited. Scripts can be built in code or loaded from JSON files, so a
//! recorded site interaction can be replayed end to end.
//!
//! Selectors are matched by exact string equality against
//! [`ElementSpec::selector`]; no CSS engine is involved.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{AutomationDriver, ClickOptions, DriverError, ScreenshotTarget};

/// Bytes returned for screenshots when a script supplies no image.
const PLACEHOLDER_PNG: &[u8] = b"\x89PNG\r\n\x1a\nscripted";

fn visible_by_default() -> bool {
    true
}

/// One element on a scripted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub selector: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub text: String,
    /// Base64-encoded PNG returned when the element is screenshotted.
    #[serde(default)]
    pub image: Option<String>,
}

impl ElementSpec {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attributes: BTreeMap::new(),
            visible: true,
            text: String::new(),
            image: None,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn image(mut self, png: &[u8]) -> Self {
        self.image = Some(STANDARD.encode(png));
        self
    }
}

/// A complete scripted page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

impl PageState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: String::new(),
            elements: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_element(mut self, element: ElementSpec) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.elements.extend(elements);
        self
    }

    fn find(&self, selector: &str, index: usize) -> Option<&ElementSpec> {
        self.elements
            .iter()
            .filter(|e| e.selector == selector)
            .nth(index)
    }

    fn count(&self, selector: &str) -> usize {
        self.elements
            .iter()
            .filter(|e| e.selector == selector)
            .count()
    }
}

/// Page transitions for a [`ScriptedDriver`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Page shown before anything happens.
    pub initial: PageState,

    /// Pages shown in turn each time an element with the given selector is
    /// clicked. Once a queue is used up, clicks leave the page unchanged.
    #[serde(default)]
    pub on_click: BTreeMap<String, Vec<PageState>>,

    /// Page shown whenever the given URL is visited.
    #[serde(default)]
    pub on_navigate: BTreeMap<String, PageState>,
}

impl Script {
    pub fn new(initial: PageState) -> Self {
        Self {
            initial,
            on_click: BTreeMap::new(),
            on_navigate: BTreeMap::new(),
        }
    }

    /// Queue the pages that successive clicks on `selector` lead to.
    pub fn on_click(
        mut self,
        selector: impl Into<String>,
        pages: impl IntoIterator<Item = PageState>,
    ) -> Self {
        self.on_click
            .entry(selector.into())
            .or_default()
            .extend(pages);
        self
    }

    pub fn on_navigate(mut self, url: impl Into<String>, page: PageState) -> Self {
        self.on_navigate.insert(url.into(), page);
        self
    }
}

/// A driver action, as recorded by [`ScriptedDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Click { selector: String, force: bool },
    Fill { selector: String, text: String },
    SetValue { selector: String, value: String },
    Select { selector: String, label: String },
    Check(String),
    WaitForIdle,
    WaitForLoad,
    Wait(Duration),
    Screenshot(Option<String>),
}

/// Element handle issued by [`ScriptedDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptedHandle {
    selector: String,
    index: usize,
    generation: u64,
}

impl ScriptedHandle {
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

struct Inner {
    page: PageState,
    /// Bumped on every page change; older handles become stale.
    generation: u64,
    on_click: HashMap<String, VecDeque<PageState>>,
    on_navigate: BTreeMap<String, PageState>,
    values: HashMap<(String, usize), String>,
    checked: HashSet<(String, usize)>,
    actions: Vec<Action>,
    /// Remaining injected failures per selector.
    failures: HashMap<String, usize>,
    idle_timeouts: usize,
}

impl Inner {
    fn load(&mut self, page: PageState) {
        self.page = page;
        self.generation += 1;
        self.values.clear();
        self.checked.clear();
    }

    fn resolve(&self, handle: &ScriptedHandle) -> Result<&ElementSpec, DriverError> {
        if handle.generation != self.generation {
            return Err(DriverError::StaleHandle {
                selector: handle.selector.clone(),
            });
        }
        self.page
            .find(&handle.selector, handle.index)
            .ok_or_else(|| DriverError::NotFound {
                selector: handle.selector.clone(),
            })
    }

    /// Resolve a handle for an interaction, consuming an injected failure if one is pending.
    fn interact(
        &mut self,
        handle: &ScriptedHandle,
        action: &'static str,
    ) -> Result<(), DriverError> {
        self.resolve(handle)?;
        match self.failures.get_mut(&handle.selector) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(DriverError::Action {
                    action,
                    message: format!("injected failure on {}", handle.selector),
                })
            }
            _ => Ok(()),
        }
    }

    fn handle(&self, selector: &str, index: usize) -> ScriptedHandle {
        ScriptedHandle {
            selector: selector.to_string(),
            index,
            generation: self.generation,
        }
    }
}

/// Driver that plays back a [`Script`] and records every action.
///
/// Loading a new page clears all typed values and checkboxes, the same
/// way a real page reload loses form input.
pub struct ScriptedDriver {
    inner: Mutex<Inner>,
}

impl ScriptedDriver {
    pub fn new(script: Script) -> Self {
        Self {
            inner: Mutex::new(Inner {
                page: script.initial,
                generation: 0,
                on_click: script
                    .on_click
                    .into_iter()
                    .map(|(selector, pages)| (selector, pages.into()))
                    .collect(),
                on_navigate: script.on_navigate,
                values: HashMap::new(),
                checked: HashSet::new(),
                actions: Vec::new(),
                failures: HashMap::new(),
                idle_timeouts: 0,
            }),
        }
    }

    /// Load a script from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path).map_err(|e| {
            DriverError::Unavailable(format!("failed to read script {}: {e}", path.display()))
        })?;
        let script: Script = serde_json::from_str(&body).map_err(|e| {
            DriverError::Unavailable(format!("failed to parse script {}: {e}", path.display()))
        })?;
        Ok(Self::new(script))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `times` interactions with `selector` fail.
    pub fn fail_next(&self, selector: impl Into<String>, times: usize) {
        self.lock().failures.insert(selector.into(), times);
    }

    /// Make the next `times` idle waits time out.
    pub fn time_out_idle(&self, times: usize) {
        self.lock().idle_timeouts = times;
    }

    /// Every action performed so far.
    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    /// Number of clicks on elements with `selector`.
    pub fn clicks_on(&self, selector: &str) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Click { selector: s, .. } if s == selector))
            .count()
    }

    /// Durations of every unconditional wait, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Wait(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    /// Current value typed, set or selected into the first element with `selector`.
    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.lock().values.get(&(selector.to_string(), 0)).cloned()
    }

    pub fn is_checked(&self, selector: &str) -> bool {
        self.lock().checked.contains(&(selector.to_string(), 0))
    }

    pub fn url(&self) -> String {
        self.lock().page.url.clone()
    }

    fn record(&self, action: Action) {
        self.lock().actions.push(action);
    }

    fn store_value(
        &self,
        handle: &ScriptedHandle,
        action: &'static str,
        value: &str,
        record: Action,
    ) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.interact(handle, action)?;
        inner
            .values
            .insert((handle.selector.clone(), handle.index), value.to_string());
        inner.actions.push(record);
        Ok(())
    }
}

impl AutomationDriver for ScriptedDriver {
    type Handle = ScriptedHandle;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.actions.push(Action::Navigate(url.to_string()));
        let page = inner
            .on_navigate
            .get(url)
            .cloned()
            .unwrap_or_else(|| PageState::new(url));
        inner.load(page);
        Ok(())
    }

    async fn locate(&self, selector: &str) -> Result<Option<ScriptedHandle>, DriverError> {
        let inner = self.lock();
        Ok(inner
            .page
            .find(selector, 0)
            .map(|_| inner.handle(selector, 0)))
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<ScriptedHandle>, DriverError> {
        let inner = self.lock();
        Ok((0..inner.page.count(selector))
            .map(|i| inner.handle(selector, i))
            .collect())
    }

    async fn read_attribute(
        &self,
        handle: &ScriptedHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let inner = self.lock();
        Ok(inner.resolve(handle)?.attributes.get(name).cloned())
    }

    async fn is_visible(&self, handle: &ScriptedHandle) -> Result<bool, DriverError> {
        let inner = self.lock();
        Ok(inner.resolve(handle)?.visible)
    }

    async fn inner_text(&self, handle: &ScriptedHandle) -> Result<String, DriverError> {
        let inner = self.lock();
        Ok(inner.resolve(handle)?.text.clone())
    }

    async fn click(&self, handle: &ScriptedHandle, options: ClickOptions) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.interact(handle, "click")?;
        inner.actions.push(Action::Click {
            selector: handle.selector.clone(),
            force: options.force,
        });
        let next = inner
            .on_click
            .get_mut(&handle.selector)
            .and_then(VecDeque::pop_front);
        if let Some(page) = next {
            inner.load(page);
        }
        Ok(())
    }

    async fn fill(&self, handle: &ScriptedHandle, text: &str) -> Result<(), DriverError> {
        self.store_value(
            handle,
            "fill",
            text,
            Action::Fill {
                selector: handle.selector.clone(),
                text: text.to_string(),
            },
        )
    }

    async fn set_value(&self, handle: &ScriptedHandle, value: &str) -> Result<(), DriverError> {
        self.store_value(
            handle,
            "set value",
            value,
            Action::SetValue {
                selector: handle.selector.clone(),
                value: value.to_string(),
            },
        )
    }

    async fn select_option(&self, handle: &ScriptedHandle, label: &str) -> Result<(), DriverError> {
        self.store_value(
            handle,
            "select option",
            label,
            Action::Select {
                selector: handle.selector.clone(),
                label: label.to_string(),
            },
        )
    }

    async fn check(&self, handle: &ScriptedHandle) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.interact(handle, "check")?;
        inner
            .checked
            .insert((handle.selector.clone(), handle.index));
        inner.actions.push(Action::Check(handle.selector.clone()));
        Ok(())
    }

    async fn input_value(&self, handle: &ScriptedHandle) -> Result<String, DriverError> {
        let inner = self.lock();
        let element = inner.resolve(handle)?;
        Ok(inner
            .values
            .get(&(handle.selector.clone(), handle.index))
            .or_else(|| element.attributes.get("value"))
            .cloned()
            .unwrap_or_default())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ScriptedHandle, DriverError> {
        let inner = self.lock();
        let index = inner
            .page
            .elements
            .iter()
            .filter(|e| e.selector == selector)
            .position(|e| e.visible);
        match index {
            Some(i) => Ok(inner.handle(selector, i)),
            None => Err(DriverError::Timeout {
                what: format!("selector {selector:?}"),
                after: timeout,
            }),
        }
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.actions.push(Action::WaitForIdle);
        if inner.idle_timeouts > 0 {
            inner.idle_timeouts -= 1;
            return Err(DriverError::Timeout {
                what: "network idle".to_string(),
                after: timeout,
            });
        }
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<(), DriverError> {
        self.record(Action::WaitForLoad);
        Ok(())
    }

    async fn wait_for_timeout(&self, duration: Duration) -> Result<(), DriverError> {
        self.record(Action::Wait(duration));
        Ok(())
    }

    async fn screenshot(
        &self,
        target: ScreenshotTarget<'_, ScriptedHandle>,
    ) -> Result<Vec<u8>, DriverError> {
        let mut inner = self.lock();
        let (selector, image) = match target {
            ScreenshotTarget::Page => (None, None),
            ScreenshotTarget::Element(handle) => {
                let element = inner.resolve(handle)?;
                (Some(handle.selector.clone()), element.image.clone())
            }
        };
        inner.actions.push(Action::Screenshot(selector));
        match image {
            Some(encoded) => STANDARD.decode(encoded).map_err(|e| DriverError::Action {
                action: "screenshot",
                message: format!("invalid scripted image: {e}"),
            }),
            None => Ok(PLACEHOLDER_PNG.to_vec()),
        }
    }

    async fn page_content(&self) -> Result<String, DriverError> {
        Ok(self.lock().page.content.clone())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> PageState {
        PageState::new("https://example.test/form")
            .with_element(ElementSpec::new("#name"))
            .with_element(ElementSpec::new("#go"))
    }

    #[tokio::test]
    async fn click_advances_through_queued_pages() {
        let script = Script::new(form()).on_click(
            "#go",
            [
                form().with_content("first"),
                PageState::new("https://example.test/done"),
            ],
        );
        let driver = ScriptedDriver::new(script);

        let go = driver.locate("#go").await.unwrap().unwrap();
        driver.click(&go, ClickOptions::default()).await.unwrap();
        assert_eq!(driver.page_content().await.unwrap(), "first");

        let go = driver.locate("#go").await.unwrap().unwrap();
        driver.click(&go, ClickOptions::forced()).await.unwrap();
        assert_eq!(driver.url(), "https://example.test/done");
        assert_eq!(driver.clicks_on("#go"), 2);
    }

    #[tokio::test]
    async fn page_change_clears_values_and_stales_handles() {
        let script = Script::new(form()).on_click("#go", [form()]);
        let driver = ScriptedDriver::new(script);

        let name = driver.locate("#name").await.unwrap().unwrap();
        driver.fill(&name, "alice").await.unwrap();
        assert_eq!(driver.input_value(&name).await.unwrap(), "alice");

        let go = driver.locate("#go").await.unwrap().unwrap();
        driver.click(&go, ClickOptions::default()).await.unwrap();

        assert_eq!(driver.value_of("#name"), None);
        let err = driver.fill(&name, "bob").await.unwrap_err();
        assert!(matches!(err, DriverError::StaleHandle { .. }));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let driver = ScriptedDriver::new(Script::new(form()));
        driver.fail_next("#name", 1);

        let name = driver.locate("#name").await.unwrap().unwrap();
        assert!(driver.fill(&name, "x").await.is_err());
        assert!(driver.fill(&name, "x").await.is_ok());
    }

    #[tokio::test]
    async fn wait_for_selector_ignores_hidden_elements() {
        let page = PageState::new("u").with_element(ElementSpec::new(".err").hidden());
        let driver = ScriptedDriver::new(Script::new(page));

        let err = driver
            .wait_for_selector(".err", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(driver.locate(".err").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn element_screenshot_decodes_image() {
        let page = PageState::new("u").with_element(ElementSpec::new("#img").image(b"abc"));
        let driver = ScriptedDriver::new(Script::new(page));

        let img = driver.locate("#img").await.unwrap().unwrap();
        let bytes = driver
            .screenshot(ScreenshotTarget::Element(&img))
            .await
            .unwrap();
        assert_eq!(bytes, b"abc");
        assert_eq!(
            driver.screenshot(ScreenshotTarget::Page).await.unwrap(),
            PLACEHOLDER_PNG
        );
    }

    #[tokio::test]
    async fn navigate_uses_scripted_page() {
        let script = Script::new(PageState::new("start")).on_navigate("home", form());
        let driver = ScriptedDriver::new(script);

        driver.navigate("home").await.unwrap();
        assert!(driver.locate("#go").await.unwrap().is_some());

        driver.navigate("elsewhere").await.unwrap();
        assert!(driver.locate("#go").await.unwrap().is_none());
        assert_eq!(driver.url(), "elsewhere");
    }

    #[test]
    fn load_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        let json = r##"{
            "initial": {
                "url": "https://example.test/",
                "elements": [{ "selector": "#go", "attributes": { "value": "Go" } }]
            },
            "on_click": { "#go": [{ "url": "https://example.test/next" }] }
        }"##;
        std::fs::write(&path, json).unwrap();

        let driver = ScriptedDriver::from_file(&path).unwrap();
        assert_eq!(driver.url(), "https://example.test/");

        assert!(ScriptedDriver::from_file(dir.path().join("missing.json")).is_err());
    }
}
