//! Ordered departure-time preferences.

use serde::{Deserialize, Serialize};

use super::{TimeOfDay, TimeRange};

/// User-ranked departure windows.
///
/// The position of a range is its priority: index 0 is the most preferred.
/// An empty list means "take the earliest train on offer".
///
/// There is no mutating API; a list is fixed once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceList(Vec<TimeRange>);

impl PreferenceList {
    pub fn new(ranges: Vec<TimeRange>) -> Self {
        Self(ranges)
    }

    /// The "earliest available" list.
    pub fn any() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.0
    }

    /// Priority of a departure time: the index of the first range containing it.
    pub fn priority_of(&self, departure: TimeOfDay) -> Option<usize> {
        self.0.iter().position(|range| range.contains(departure))
    }
}

impl From<Vec<TimeRange>> for PreferenceList {
    fn from(ranges: Vec<TimeRange>) -> Self {
        Self(ranges)
    }
}

impl FromIterator<TimeRange> for PreferenceList {
    fn from_iter<I: IntoIterator<Item = TimeRange>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
