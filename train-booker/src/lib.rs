//! High-speed rail seat booking automation.
//!
//! Drives the site's four booking steps through a browser automation
//! driver: search until a train list appears, pick the best train for the
//! rider's preferred departure windows, fill in the passenger details, and
//! (unless it is a dry run) submit the booking.

pub mod booking;
pub mod captcha;
pub mod domain;
pub mod driver;
pub mod request;
pub mod site;
pub mod snapshot;
pub mod status;
pub mod stop;
