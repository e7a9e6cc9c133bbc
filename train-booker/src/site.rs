//! Where things are on the booking site.
//!
//! The workflow refers to page elements only through a [`SiteProfile`].
//! When the site's markup or wording changes, this is the one place to
//! update. The default profile targets the production site; a JSON file
//! naming only the fields that differ can be loaded over it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error loading a [`SiteProfile`] file.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read site profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid site profile {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Selectors, URL markers and text patterns for the booking site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Entry page of the booking flow.
    pub home_url: String,
    pub cookie_accept: String,

    // Step 1: search form
    pub origin_select: String,
    pub destination_select: String,
    /// Hidden input holding the travel date as YYYY/MM/DD.
    pub date_input: String,
    pub time_select: String,
    pub quantity_select: String,
    pub captcha_image: String,
    pub captcha_input: String,
    pub search_submit: String,

    // Step 1 outcome signals
    /// Substrings of the URL that mean the train list is showing.
    pub results_url_markers: Vec<String>,
    pub results_listing: String,
    pub error_region: String,
    /// Error texts shorter than this are treated as empty.
    pub min_error_text_len: usize,
    pub captcha_error_patterns: Vec<String>,
    pub sold_out_patterns: Vec<String>,

    // Step 2: train list
    pub train_radio: String,
    /// Departure attribute names on a train radio, tried in order.
    pub departure_attributes: Vec<String>,
    pub arrival_attributes: Vec<String>,
    pub select_submit: String,
    pub search_again_link: String,

    // Step 3: passenger details
    pub session_expired_markers: Vec<String>,
    pub id_input: String,
    pub phone_input: String,
    pub terms_checkbox: String,
    pub email_input: String,

    // Step 4: commit
    pub commit_button: String,
    pub success_markers: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            home_url: "https://irs.thsrc.com.tw/IMINT/".to_string(),
            cookie_accept: "#cookieAccpetBtn".to_string(),

            origin_select: "#BookingS1Form_selectStartStation".to_string(),
            destination_select: "#BookingS1Form_selectDestinationStation".to_string(),
            date_input: "#toTimeInputField".to_string(),
            time_select: "select[name='toTimeTable']".to_string(),
            quantity_select: "select[name='ticketPanel:rows:0:ticketAmount']".to_string(),
            captcha_image: "#BookingS1Form_homeCaptcha_passCode".to_string(),
            captcha_input: "#securityCode".to_string(),
            search_submit: "#SubmitButton".to_string(),

            results_url_markers: strings(&["BookingS2Form", "BookingS2"]),
            results_listing: ".result-listing".to_string(),
            error_region: ".feedbackPanelERROR, #divErrMSG:not([style*='display: none']) .uk-alert-danger, #feedMSG span.error".to_string(),
            min_error_text_len: 5,
            captcha_error_patterns: strings(&["檢測碼", "Security Code"]),
            sold_out_patterns: strings(&["查無", "售完", "No tickets"]),

            train_radio: "input[name='TrainQueryDataViewPanel:TrainGroup']".to_string(),
            departure_attributes: strings(&["QueryDeparture", "querydeparture"]),
            arrival_attributes: strings(&["QueryArrival", "queryarrival"]),
            select_submit: "input[name='SubmitButton']".to_string(),
            search_again_link: "a.btn-reselectTrain, a[href*='BookingS1'], .btn-back".to_string(),

            session_expired_markers: strings(&["無法繼續提供您訂票的服務", "抱歉"]),
            id_input: "#idNumber".to_string(),
            phone_input: "#mobilePhone".to_string(),
            terms_checkbox: "input[name='agree']".to_string(),
            email_input: "#email".to_string(),

            commit_button: "#isSubmit".to_string(),
            success_markers: strings(&["訂位成功", "訂位代號"]),
        }
    }
}

impl SiteProfile {
    /// Read a profile file. Fields it omits keep their default values.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ProfileError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| ProfileError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether `url` belongs to the train-list step.
    pub fn is_results_url(&self, url: &str) -> bool {
        self.results_url_markers
            .iter()
            .any(|marker| url.contains(marker.as_str()))
    }

    pub fn is_session_expired(&self, content: &str) -> bool {
        contains_any(content, &self.session_expired_markers)
    }

    pub fn is_booking_confirmed(&self, content: &str) -> bool {
        contains_any(content, &self.success_markers)
    }
}

pub(crate) fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_url_detection() {
        let site = SiteProfile::default();
        assert!(site.is_results_url(
            "https://irs.thsrc.com.tw/IMINT/?wicket:interface=:1:BookingS2Form::IFormSubmitListener"
        ));
        assert!(!site.is_results_url("https://irs.thsrc.com.tw/IMINT/"));
    }

    #[test]
    fn page_markers() {
        let site = SiteProfile::default();
        assert!(site.is_session_expired("<p>抱歉，無法繼續提供您訂票的服務</p>"));
        assert!(!site.is_session_expired("<p>乘客資訊</p>"));
        assert!(site.is_booking_confirmed("<h2>訂位成功</h2>"));
        // The commit button's own label must not count as confirmation
        assert!(!site.is_booking_confirmed("<input id='isSubmit' value='完成訂位'>"));
    }

    #[test]
    fn partial_profile_from_json() {
        let site: SiteProfile =
            serde_json::from_str(r#"{ "home_url": "http://localhost:8080/" }"#).unwrap();
        assert_eq!(site.home_url, "http://localhost:8080/");
        assert_eq!(site.captcha_input, "#securityCode");
    }

    #[tokio::test]
    async fn load_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(
            &path,
            r#"{ "home_url": "http://localhost:8080/", "sold_out_patterns": ["Sold out"] }"#,
        )
        .unwrap();

        let site = SiteProfile::load(&path).await.unwrap();
        assert_eq!(site.home_url, "http://localhost:8080/");
        assert_eq!(site.sold_out_patterns, vec!["Sold out".to_string()]);
        assert_eq!(site.commit_button, "#isSubmit");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SiteProfile::load(&path).await,
            Err(ProfileError::Json { .. })
        ));
        assert!(matches!(
            SiteProfile::load(dir.path().join("absent.json")).await,
            Err(ProfileError::Io { .. })
        ));
    }
}
