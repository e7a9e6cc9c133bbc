//! Station types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a station name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown station: {0:?}")]
pub struct InvalidStation(String);

/// A station on the high-speed line, north to south.
///
/// The search form selects stations by their option label, so every station
/// knows the exact label the form displays.
///
/// # Examples
///
/// ```
/// use train_booker::domain::Station;
///
/// let taipei = Station::parse("Taipei").unwrap();
/// assert_eq!(taipei.label(), "台北");
/// assert_eq!(Station::parse("左營").unwrap(), Station::Zuoying);
/// assert!(Station::parse("Kaohsiung").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Station {
    Nangang,
    Taipei,
    Banqiao,
    Taoyuan,
    Hsinchu,
    Miaoli,
    Taichung,
    Changhua,
    Yunlin,
    Chiayi,
    Tainan,
    Zuoying,
}

impl Station {
    /// All stations in line order.
    pub const ALL: [Station; 12] = [
        Station::Nangang,
        Station::Taipei,
        Station::Banqiao,
        Station::Taoyuan,
        Station::Hsinchu,
        Station::Miaoli,
        Station::Taichung,
        Station::Changhua,
        Station::Yunlin,
        Station::Chiayi,
        Station::Tainan,
        Station::Zuoying,
    ];

    /// English name.
    pub fn name(self) -> &'static str {
        match self {
            Station::Nangang => "Nangang",
            Station::Taipei => "Taipei",
            Station::Banqiao => "Banqiao",
            Station::Taoyuan => "Taoyuan",
            Station::Hsinchu => "Hsinchu",
            Station::Miaoli => "Miaoli",
            Station::Taichung => "Taichung",
            Station::Changhua => "Changhua",
            Station::Yunlin => "Yunlin",
            Station::Chiayi => "Chiayi",
            Station::Tainan => "Tainan",
            Station::Zuoying => "Zuoying",
        }
    }

    /// Option label shown in the search form's station dropdowns.
    pub fn label(self) -> &'static str {
        match self {
            Station::Nangang => "南港",
            Station::Taipei => "台北",
            Station::Banqiao => "板橋",
            Station::Taoyuan => "桃園",
            Station::Hsinchu => "新竹",
            Station::Miaoli => "苗栗",
            Station::Taichung => "台中",
            Station::Changhua => "彰化",
            Station::Yunlin => "雲林",
            Station::Chiayi => "嘉義",
            Station::Tainan => "台南",
            Station::Zuoying => "左營",
        }
    }

    /// Parse a station from its English name (case-insensitive) or its form label.
    pub fn parse(s: &str) -> Result<Self, InvalidStation> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|station| station.name().eq_ignore_ascii_case(s) || station.label() == s)
            .ok_or_else(|| InvalidStation(s.to_string()))
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Station {
    type Err = InvalidStation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Station {
    type Error = InvalidStation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Station> for String {
    fn from(value: Station) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_english_names() {
        assert_eq!(Station::parse("Nangang").unwrap(), Station::Nangang);
        assert_eq!(Station::parse("taichung").unwrap(), Station::Taichung);
        assert_eq!(Station::parse(" ZUOYING ").unwrap(), Station::Zuoying);
    }

    #[test]
    fn parse_labels() {
        for station in Station::ALL {
            assert_eq!(Station::parse(station.label()).unwrap(), station);
        }
    }

    #[test]
    fn reject_unknown() {
        assert!(Station::parse("").is_err());
        assert!(Station::parse("Taipei Main").is_err());
        let err = Station::parse("Kaohsiung").unwrap_err();
        assert_eq!(err.to_string(), "unknown station: \"Kaohsiung\"");
    }

    #[test]
    fn line_order() {
        assert!(Station::Nangang < Station::Zuoying);
        assert_eq!(Station::ALL.len(), 12);
    }
}
