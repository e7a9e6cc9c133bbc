//! Classifying what a search submission produced.
//!
//! The site gives no single reliable answer. A successful search may show up
//! as a new URL, as the train list appearing, or both; a failure shows up as
//! text in one of several error regions, some of which stay in the DOM while
//! hidden. Signals are checked in a fixed order and the first match wins:
//!
//! 1. URL of the train-list step
//! 2. a visible train list
//! 3. a visible, non-trivial error message (captcha, then sold out, then other)
//! 4. nothing recognisable

use tracing::debug;

use crate::driver::{AutomationDriver, DriverError};
use crate::site::{SiteProfile, contains_any};

/// Result of one search submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOutcome {
    /// The train list is showing.
    Success,
    /// The captcha code was rejected.
    CaptchaError,
    /// No seats for the requested search.
    SoldOut,
    /// Nothing recognisable; assumed transient.
    Unclassified,
    /// A stop was requested.
    Aborted,
}

impl SearchOutcome {
    /// Short user-facing description.
    pub fn describe(self) -> &'static str {
        match self {
            SearchOutcome::Success => "train list reached",
            SearchOutcome::CaptchaError => "captcha rejected",
            SearchOutcome::SoldOut => "sold out",
            SearchOutcome::Unclassified => "no recognisable response",
            SearchOutcome::Aborted => "stopped",
        }
    }
}

/// Whether an error region's text is worth classifying.
///
/// Blank text, the bare word "error" and very short strings come from empty
/// error templates and are ignored.
pub fn is_meaningful_error(text: &str, site: &SiteProfile) -> bool {
    let text = text.trim();
    !text.is_empty()
        && !text.eq_ignore_ascii_case("error")
        && text.chars().count() >= site.min_error_text_len
}

/// Classify the text of a visible error region.
///
/// Captcha patterns take precedence over sold-out patterns.
pub fn classify_error_text(text: &str, site: &SiteProfile) -> SearchOutcome {
    if !is_meaningful_error(text, site) {
        SearchOutcome::Unclassified
    } else if contains_any(text, &site.captcha_error_patterns) {
        SearchOutcome::CaptchaError
    } else if contains_any(text, &site.sold_out_patterns) {
        SearchOutcome::SoldOut
    } else {
        SearchOutcome::Unclassified
    }
}

/// Inspect the page after a submission.
///
/// Never returns [`SearchOutcome::Aborted`]; that is decided by the caller.
pub async fn classify<D: AutomationDriver>(
    driver: &D,
    site: &SiteProfile,
) -> Result<SearchOutcome, DriverError> {
    let url = driver.current_url().await?;
    if site.is_results_url(&url) {
        debug!(url = %url, "URL indicates train list");
        return Ok(SearchOutcome::Success);
    }

    if let Some(listing) = driver.locate(&site.results_listing).await? {
        if driver.is_visible(&listing).await? {
            debug!("Train list element visible");
            return Ok(SearchOutcome::Success);
        }
    }

    let Some(region) = driver.locate(&site.error_region).await? else {
        return Ok(SearchOutcome::Unclassified);
    };
    if !driver.is_visible(&region).await? {
        debug!("Error region present but hidden");
        return Ok(SearchOutcome::Unclassified);
    }

    let text = driver.inner_text(&region).await?;
    let outcome = classify_error_text(&text, site);
    if is_meaningful_error(&text, site) {
        debug!(text = %text.trim(), ?outcome, "Error message found");
    } else {
        debug!("Error region visible but empty, likely a false positive");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ElementSpec, PageState, Script, ScriptedDriver};

    const FORM_URL: &str = "https://irs.thsrc.com.tw/IMINT/";

    fn site() -> SiteProfile {
        SiteProfile::default()
    }

    fn driver(page: PageState) -> ScriptedDriver {
        ScriptedDriver::new(Script::new(page))
    }

    fn error(text: &str) -> ElementSpec {
        ElementSpec::new(site().error_region).text(text)
    }

    #[test]
    fn error_text_precedence() {
        let site = site();
        assert_eq!(
            classify_error_text("檢測碼輸入錯誤，請確認後重新輸入", &site),
            SearchOutcome::CaptchaError
        );
        assert_eq!(
            classify_error_text("去程查無可售車次或選購的車票已售完", &site),
            SearchOutcome::SoldOut
        );
        // Both patterns: captcha wins
        assert_eq!(
            classify_error_text("Security Code wrong; No tickets", &site),
            SearchOutcome::CaptchaError
        );
        assert_eq!(
            classify_error_text("系統忙碌中，請稍後再試", &site),
            SearchOutcome::Unclassified
        );
    }

    #[test]
    fn trivial_error_text_is_ignored() {
        let site = site();
        assert!(!is_meaningful_error("", &site));
        assert!(!is_meaningful_error("  error ", &site));
        assert!(!is_meaningful_error("ERROR", &site));
        // Pattern present but shorter than the threshold
        assert!(!is_meaningful_error("查無", &site));
        assert_eq!(classify_error_text("查無", &site), SearchOutcome::Unclassified);
        assert!(is_meaningful_error("查無可售車次", &site));
    }

    #[tokio::test]
    async fn results_url_is_success() {
        let page = PageState::new("https://irs.thsrc.com.tw/IMINT/?wicket:interface=:2:BookingS2Form")
            .with_element(error("檢測碼輸入錯誤，請確認"));
        let outcome = classify(&driver(page), &site()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Success);
    }

    #[tokio::test]
    async fn visible_listing_is_success() {
        let page = PageState::new(FORM_URL).with_element(ElementSpec::new(".result-listing"));
        let outcome = classify(&driver(page), &site()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Success);
    }

    #[tokio::test]
    async fn visible_listing_beats_visible_error() {
        for text in ["檢測碼輸入錯誤，請確認", "去程查無可售車次"] {
            let page = PageState::new(FORM_URL)
                .with_element(error(text))
                .with_element(ElementSpec::new(".result-listing"));
            let outcome = classify(&driver(page), &site()).await.unwrap();
            assert_eq!(outcome, SearchOutcome::Success);
        }
    }

    #[tokio::test]
    async fn hidden_listing_is_not_success() {
        let page = PageState::new(FORM_URL)
            .with_element(ElementSpec::new(".result-listing").hidden())
            .with_element(error("去程查無可售車次"));
        let outcome = classify(&driver(page), &site()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::SoldOut);
    }

    #[tokio::test]
    async fn hidden_error_is_unclassified() {
        let page = PageState::new(FORM_URL).with_element(error("檢測碼輸入錯誤，請確認").hidden());
        let outcome = classify(&driver(page), &site()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Unclassified);
    }

    #[tokio::test]
    async fn visible_captcha_error() {
        let page = PageState::new(FORM_URL).with_element(error("檢測碼輸入錯誤，請確認"));
        let outcome = classify(&driver(page), &site()).await.unwrap();
        assert_eq!(outcome, SearchOutcome::CaptchaError);
    }

    #[tokio::test]
    async fn plain_form_is_unclassified() {
        let outcome = classify(&driver(PageState::new(FORM_URL)), &site())
            .await
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Unclassified);
    }
}
