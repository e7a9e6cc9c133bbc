//! Scripted pages shaped like the booking site, for tests.

use chrono::NaiveDate;

use crate::captcha::{FnSolver, solver_fn};
use crate::domain::{PassengerInfo, PreferenceList, SearchCriteria, Station, TimeRange};
use crate::driver::{ElementSpec, PageState};
use crate::request::BookingRequest;
use crate::site::SiteProfile;

pub const HOME_URL: &str = "https://irs.thsrc.com.tw/IMINT/";
pub const RESULTS_URL: &str =
    "https://irs.thsrc.com.tw/IMINT/?wicket:interface=:1:BookingS2Form::IFormSubmitListener";
pub const PASSENGER_URL: &str =
    "https://irs.thsrc.com.tw/IMINT/?wicket:interface=:2:BookingS3Form::IFormSubmitListener";
pub const FINAL_URL: &str = "https://irs.thsrc.com.tw/IMINT/?wicket:interface=:3:BookingS4";

pub const CAPTCHA_ERROR_TEXT: &str = "檢測碼輸入錯誤，請確認後重新輸入";
pub const SOLD_OUT_TEXT: &str = "去程查無可售車次或選購的車票已售完，請重新輸入訂票條件";

pub fn site() -> SiteProfile {
    SiteProfile::default()
}

pub fn search_page() -> PageState {
    let s = site();
    PageState::new(HOME_URL).with_elements([
        ElementSpec::new(s.origin_select),
        ElementSpec::new(s.destination_select),
        ElementSpec::new(s.date_input).hidden(),
        ElementSpec::new(s.time_select),
        ElementSpec::new(s.quantity_select),
        ElementSpec::new(s.captcha_image).image(b"captcha-png"),
        ElementSpec::new(s.captcha_input),
        ElementSpec::new(s.search_submit),
    ])
}

pub fn error_page(text: &str) -> PageState {
    search_page().with_element(ElementSpec::new(site().error_region).text(text))
}

pub fn captcha_error_page() -> PageState {
    error_page(CAPTCHA_ERROR_TEXT)
}

pub fn sold_out_page() -> PageState {
    error_page(SOLD_OUT_TEXT)
}

pub fn results_page(departures: &[&str]) -> PageState {
    let s = site();
    PageState::new(RESULTS_URL)
        .with_element(ElementSpec::new(s.results_listing.clone()))
        .with_elements(
            departures
                .iter()
                .map(|d| ElementSpec::new(s.train_radio.clone()).attr("QueryDeparture", *d)),
        )
        .with_element(ElementSpec::new(s.select_submit))
        .with_element(ElementSpec::new(s.search_again_link))
}

pub fn passenger_page() -> PageState {
    let s = site();
    PageState::new(PASSENGER_URL)
        .with_content("<h3>取票人資訊</h3><input id='isSubmit' value='完成訂位'>")
        .with_elements([
            ElementSpec::new(s.id_input),
            ElementSpec::new(s.phone_input),
            ElementSpec::new(s.terms_checkbox),
            ElementSpec::new(s.email_input),
            ElementSpec::new(s.commit_button),
        ])
}

pub fn expired_page() -> PageState {
    PageState::new(PASSENGER_URL)
        .with_content("<p>抱歉，無法繼續提供您訂票的服務，請重新訂票。</p>")
        .with_element(ElementSpec::new(site().id_input))
}

pub fn confirmed_page() -> PageState {
    PageState::new(FINAL_URL).with_content("<h2>訂位成功</h2><p>訂位代號 05212345</p>")
}

pub fn criteria() -> SearchCriteria {
    SearchCriteria::new(
        Station::Taipei,
        Station::Zuoying,
        NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
        "10:00",
        1,
    )
    .unwrap()
}

pub fn preferences(ranges: &[&str]) -> PreferenceList {
    ranges.iter().map(|r| TimeRange::parse(r).unwrap()).collect()
}

pub fn request(ranges: &[&str], dry_run: bool) -> BookingRequest {
    BookingRequest {
        criteria: criteria(),
        preferences: preferences(ranges),
        passenger: PassengerInfo::new(
            "A123456789",
            "0912345678",
            Some("rider@example.com".to_string()),
        )
        .unwrap(),
        dry_run,
    }
}

pub fn fixed_solver() -> FnSolver<impl Fn(&[u8]) -> Option<String>> {
    solver_fn(|_: &[u8]| Some("AB12".to_string()))
}
