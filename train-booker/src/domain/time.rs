//! Departure time handling.
//!
//! The booking site publishes departure times as zero-padded 24-hour
//! "HH:MM" strings, all on the travel date. Because the format is fixed-width
//! and never crosses midnight, comparing the raw bytes gives the same order as
//! comparing the times themselves. [`TimeOfDay`] stores exactly those bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time or range string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A same-day departure time in zero-padded "HH:MM" form.
///
/// Ordering is lexicographic on the five bytes of the string.
///
/// # Examples
///
/// ```
/// use train_booker::domain::TimeOfDay;
///
/// let early = TimeOfDay::parse("06:34").unwrap();
/// let late = TimeOfDay::parse("14:05").unwrap();
/// assert!(early < late);
///
/// assert!(TimeOfDay::parse("6:34").is_err());
/// assert!(TimeOfDay::parse("24:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay([u8; 5]);

impl TimeOfDay {
    /// Parse a time from "HH:MM" format.
    ///
    /// Leading and trailing whitespace is ignored, since attribute values on
    /// the results page are not always trimmed.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();

        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self([bytes[0], bytes[1], b':', bytes[3], bytes[4]]))
    }

    /// Build a time from hour and minute components.
    pub fn from_hm(hour: u8, minute: u8) -> Result<Self, TimeError> {
        Self::parse(&format!("{hour:02}:{minute:02}"))
    }

    /// Returns the time as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII digits and ':' are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("00:00")
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u8 {
        (self.0[0] - b'0') * 10 + (self.0[1] - b'0')
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u8 {
        (self.0[3] - b'0') * 10 + (self.0[4] - b'0')
    }
}

fn parse_two_digits(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => Some((a - b'0') * 10 + (b - b'0')),
        _ => None,
    }
}

impl fmt::Debug for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeOfDay({})", self.as_str())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.as_str().to_string()
    }
}

/// An inclusive window of acceptable departure times.
///
/// `start <= end` is guaranteed by construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TimeRange {
    /// Create a range. Fails if `start` is after `end`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, TimeError> {
        if start > end {
            return Err(TimeError::new("range start must not be after its end"));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from "HH:MM-HH:MM".
    ///
    /// # Examples
    ///
    /// ```
    /// use train_booker::domain::{TimeOfDay, TimeRange};
    ///
    /// let range = TimeRange::parse("09:00-10:00").unwrap();
    /// assert!(range.contains(TimeOfDay::parse("10:00").unwrap()));
    /// assert!(TimeRange::parse("10:00-09:00").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| TimeError::new("expected HH:MM-HH:MM"))?;
        Self::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?)
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Whether `time` falls inside the range, both ends included.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start <= time && time <= self.end
    }
}

impl fmt::Debug for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeRange({}-{})", self.start, self.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeRange {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeRange> for String {
    fn from(value: TimeRange) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(t("00:00").as_str(), "00:00");
        assert_eq!(t("23:59").as_str(), "23:59");
        assert_eq!(t(" 06:34 ").as_str(), "06:34");
    }

    #[test]
    fn reject_invalid_times() {
        assert!(TimeOfDay::parse("").is_err());
        assert!(TimeOfDay::parse("1430").is_err());
        assert!(TimeOfDay::parse("14:3").is_err());
        assert!(TimeOfDay::parse("6:34").is_err());
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
        assert!(TimeOfDay::parse("1a:00").is_err());
        assert!(TimeOfDay::parse("12-00").is_err());
    }

    #[test]
    fn components() {
        let time = t("14:05");
        assert_eq!(time.hour(), 14);
        assert_eq!(time.minute(), 5);
        assert_eq!(TimeOfDay::from_hm(9, 7).unwrap(), t("09:07"));
        assert!(TimeOfDay::from_hm(24, 0).is_err());
    }

    #[test]
    fn ordering_matches_clock_order() {
        assert!(t("09:59") < t("10:00"));
        assert!(t("00:01") > t("00:00"));
        assert!(t("19:00") > t("09:00"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = TimeRange::parse("09:00-10:00").unwrap();
        assert!(range.contains(t("09:00")));
        assert!(range.contains(t("09:30")));
        assert!(range.contains(t("10:00")));
        assert!(!range.contains(t("08:59")));
        assert!(!range.contains(t("10:01")));
    }

    #[test]
    fn single_minute_range() {
        let range = TimeRange::parse("12:00-12:00").unwrap();
        assert!(range.contains(t("12:00")));
        assert!(!range.contains(t("12:01")));
    }

    #[test]
    fn reject_inverted_range() {
        assert!(TimeRange::parse("10:00-09:00").is_err());
        assert!(TimeRange::parse("09:00").is_err());
        assert!(TimeRange::new(t("11:00"), t("10:59")).is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let range: TimeRange = serde_json::from_str("\"09:00-10:30\"").unwrap();
        assert_eq!(range.start(), t("09:00"));
        assert_eq!(range.end(), t("10:30"));
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"09:00-10:30\"");

        let bad: Result<TimeOfDay, _> = serde_json::from_str("\"25:00\"");
        assert!(bad.is_err());
    }

    #[test]
    fn error_display() {
        let err = TimeOfDay::parse("25:00").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: hour must be 0-23");
    }
}
