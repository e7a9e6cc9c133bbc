//! Search and passenger inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DomainError, Station};

/// Largest party the search form accepts in one booking.
pub const MAX_PASSENGERS: u8 = 10;

/// What to search for on the first booking step.
///
/// A `SearchCriteria` is immutable and is written to the form in full on
/// every attempt, because the page may have been reset since the last one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCriteria", into = "RawCriteria")]
pub struct SearchCriteria {
    origin: Station,
    destination: Station,
    travel_date: NaiveDate,
    departure_label: String,
    passengers: u8,
}

impl SearchCriteria {
    /// Create validated criteria.
    ///
    /// `departure_label` is the label of the time-of-day option in the
    /// search form (for example `"10:00"`).
    pub fn new(
        origin: Station,
        destination: Station,
        travel_date: NaiveDate,
        departure_label: impl Into<String>,
        passengers: u8,
    ) -> Result<Self, DomainError> {
        if origin == destination {
            return Err(DomainError::SameStation(origin));
        }
        if passengers == 0 || passengers > MAX_PASSENGERS {
            return Err(DomainError::InvalidPassengerCount(passengers));
        }
        let departure_label = departure_label.into();
        if departure_label.trim().is_empty() {
            return Err(DomainError::EmptyField("departure label"));
        }

        Ok(Self {
            origin,
            destination,
            travel_date,
            departure_label,
            passengers,
        })
    }

    pub fn origin(&self) -> Station {
        self.origin
    }

    pub fn destination(&self) -> Station {
        self.destination
    }

    pub fn travel_date(&self) -> NaiveDate {
        self.travel_date
    }

    pub fn departure_label(&self) -> &str {
        &self.departure_label
    }

    pub fn passengers(&self) -> u8 {
        self.passengers
    }

    /// The travel date as the form's hidden date field expects it.
    pub fn date_value(&self) -> String {
        self.travel_date.format("%Y/%m/%d").to_string()
    }

    /// The passenger count as the quantity dropdown labels it.
    pub fn passenger_label(&self) -> String {
        self.passengers.to_string()
    }
}

#[derive(Serialize, Deserialize)]
struct RawCriteria {
    origin: Station,
    destination: Station,
    travel_date: NaiveDate,
    departure_label: String,
    passengers: u8,
}

impl TryFrom<RawCriteria> for SearchCriteria {
    type Error = DomainError;

    fn try_from(raw: RawCriteria) -> Result<Self, Self::Error> {
        Self::new(
            raw.origin,
            raw.destination,
            raw.travel_date,
            raw.departure_label,
            raw.passengers,
        )
    }
}

impl From<SearchCriteria> for RawCriteria {
    fn from(c: SearchCriteria) -> Self {
        Self {
            origin: c.origin,
            destination: c.destination,
            travel_date: c.travel_date,
            departure_label: c.departure_label,
            passengers: c.passengers,
        }
    }
}

/// Identity and contact details for the passenger step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPassenger", into = "RawPassenger")]
pub struct PassengerInfo {
    person_id: String,
    phone: String,
    email: Option<String>,
}

impl PassengerInfo {
    /// Create passenger details. An empty email is treated as absent.
    pub fn new(
        person_id: impl Into<String>,
        phone: impl Into<String>,
        email: Option<String>,
    ) -> Result<Self, DomainError> {
        let person_id = person_id.into().trim().to_string();
        let phone = phone.into().trim().to_string();
        if person_id.is_empty() {
            return Err(DomainError::EmptyField("person id"));
        }
        if phone.is_empty() {
            return Err(DomainError::EmptyField("phone"));
        }
        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        Ok(Self {
            person_id,
            phone,
            email,
        })
    }

    pub fn person_id(&self) -> &str {
        &self.person_id
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[derive(Serialize, Deserialize)]
struct RawPassenger {
    person_id: String,
    phone: String,
    #[serde(default)]
    email: Option<String>,
}

impl TryFrom<RawPassenger> for PassengerInfo {
    type Error = DomainError;

    fn try_from(raw: RawPassenger) -> Result<Self, Self::Error> {
        Self::new(raw.person_id, raw.phone, raw.email)
    }
}

impl From<PassengerInfo> for RawPassenger {
    fn from(p: PassengerInfo) -> Self {
        Self {
            person_id: p.person_id,
            phone: p.phone,
            email: p.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
    }

    #[test]
    fn valid_criteria() {
        let c = SearchCriteria::new(Station::Taipei, Station::Zuoying, date(), "10:00", 2).unwrap();
        assert_eq!(c.origin(), Station::Taipei);
        assert_eq!(c.destination(), Station::Zuoying);
        assert_eq!(c.date_value(), "2026/02/14");
        assert_eq!(c.passenger_label(), "2");
        assert_eq!(c.departure_label(), "10:00");
    }

    #[test]
    fn reject_same_station() {
        let err =
            SearchCriteria::new(Station::Taipei, Station::Taipei, date(), "10:00", 1).unwrap_err();
        assert_eq!(err, DomainError::SameStation(Station::Taipei));
    }

    #[test]
    fn reject_passenger_count() {
        assert!(SearchCriteria::new(Station::Taipei, Station::Tainan, date(), "10:00", 0).is_err());
        assert!(
            SearchCriteria::new(Station::Taipei, Station::Tainan, date(), "10:00", 11).is_err()
        );
        assert!(
            SearchCriteria::new(Station::Taipei, Station::Tainan, date(), "10:00", 10).is_ok()
        );
    }

    #[test]
    fn reject_blank_departure_label() {
        assert!(SearchCriteria::new(Station::Taipei, Station::Tainan, date(), "  ", 1).is_err());
    }

    #[test]
    fn criteria_from_json() {
        let json = r#"{
            "origin": "Nangang",
            "destination": "台中",
            "travel_date": "2026-02-14",
            "departure_label": "08:30",
            "passengers": 1
        }"#;
        let c: SearchCriteria = serde_json::from_str(json).unwrap();
        assert_eq!(c.destination(), Station::Taichung);

        let bad = json.replace("\"passengers\": 1", "\"passengers\": 0");
        assert!(serde_json::from_str::<SearchCriteria>(&bad).is_err());
    }

    #[test]
    fn passenger_email_is_optional() {
        let p = PassengerInfo::new("A123456789", "0912345678", None).unwrap();
        assert_eq!(p.email(), None);

        let p = PassengerInfo::new("A123456789", "0912345678", Some("  ".into())).unwrap();
        assert_eq!(p.email(), None);

        let p =
            PassengerInfo::new("A123456789", "0912345678", Some("a@example.com".into())).unwrap();
        assert_eq!(p.email(), Some("a@example.com"));
    }

    #[test]
    fn passenger_requires_id_and_phone() {
        assert_eq!(
            PassengerInfo::new("", "0912345678", None).unwrap_err(),
            DomainError::EmptyField("person id")
        );
        assert_eq!(
            PassengerInfo::new("A123456789", " ", None).unwrap_err(),
            DomainError::EmptyField("phone")
        );
    }
}
