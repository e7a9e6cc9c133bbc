//! Choosing a train from the results page.
//!
//! Each listed train gets a priority: the index of the first preferred time
//! range its departure falls in. Trains outside every range are dropped. The
//! best candidate has the lowest priority, then the earliest departure, then
//! the earliest position in the listing.

use crate::domain::{PreferenceList, TimeOfDay};

/// A train offered on the results page.
///
/// `handle` refers to the element that selects this train; it is only valid
/// while the results page it came from is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOption<H> {
    pub departure: TimeOfDay,
    pub arrival: Option<TimeOfDay>,
    pub handle: H,
}

impl<H> TrainOption<H> {
    pub fn new(departure: TimeOfDay, handle: H) -> Self {
        Self {
            departure,
            arrival: None,
            handle,
        }
    }

    pub fn with_arrival(mut self, arrival: TimeOfDay) -> Self {
        self.arrival = Some(arrival);
        self
    }
}

/// A listed train that fits one of the preferred ranges.
///
/// Field order is the ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub priority: usize,
    pub departure: TimeOfDay,
    /// Position in the listing.
    pub index: usize,
}

/// Outcome of [`select_train`].
#[derive(Debug, PartialEq, Eq)]
pub enum Selection<'a, H> {
    Selected {
        option: &'a TrainOption<H>,
        /// Index of the matched range; `None` when no preferences were given.
        priority: Option<usize>,
    },
    /// Nothing listed fits any preferred range (or nothing is listed).
    NoMatch,
}

/// Rank the listed trains that fit a preferred range, best first.
pub fn rank_candidates<H>(
    options: &[TrainOption<H>],
    preferences: &PreferenceList,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = options
        .iter()
        .enumerate()
        .filter_map(|(index, option)| {
            preferences
                .priority_of(option.departure)
                .map(|priority| Candidate {
                    priority,
                    departure: option.departure,
                    index,
                })
        })
        .collect();
    candidates.sort();
    candidates
}

/// Pick the train to book.
///
/// With no preferences the first listed train is taken; the site lists
/// trains in departure order, which callers can check with
/// [`is_chronological`].
pub fn select_train<'a, H>(
    options: &'a [TrainOption<H>],
    preferences: &PreferenceList,
) -> Selection<'a, H> {
    if preferences.is_empty() {
        return match options.first() {
            Some(option) => Selection::Selected {
                option,
                priority: None,
            },
            None => Selection::NoMatch,
        };
    }

    match rank_candidates(options, preferences).first() {
        Some(best) => Selection::Selected {
            option: &options[best.index],
            priority: Some(best.priority),
        },
        None => Selection::NoMatch,
    }
}

/// Whether trains are listed in non-decreasing departure order.
pub fn is_chronological<H>(options: &[TrainOption<H>]) -> bool {
    options
        .windows(2)
        .all(|pair| pair[0].departure <= pair[1].departure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeRange;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn options(times: &[&str]) -> Vec<TrainOption<usize>> {
        times
            .iter()
            .enumerate()
            .map(|(i, s)| TrainOption::new(t(s), i))
            .collect()
    }

    fn prefs(ranges: &[&str]) -> PreferenceList {
        ranges.iter().map(|r| TimeRange::parse(r).unwrap()).collect()
    }

    fn selected(selection: Selection<'_, usize>) -> Option<(TimeOfDay, Option<usize>)> {
        match selection {
            Selection::Selected { option, priority } => Some((option.departure, priority)),
            Selection::NoMatch => None,
        }
    }

    #[test]
    fn earliest_in_best_band() {
        let opts = options(&["09:10", "09:40", "14:05"]);
        let p = prefs(&["09:00-10:00", "14:00-15:00"]);
        assert_eq!(selected(select_train(&opts, &p)), Some((t("09:10"), Some(0))));
    }

    #[test]
    fn priority_beats_departure_time() {
        // 08:00 matches the second preference, 14:05 the first
        let opts = options(&["08:00", "14:05"]);
        let p = prefs(&["14:00-15:00", "07:00-09:00"]);
        assert_eq!(selected(select_train(&opts, &p)), Some((t("14:05"), Some(0))));
    }

    #[test]
    fn unordered_listing_still_picks_earliest_in_band() {
        let opts = options(&["09:40", "14:05", "09:10"]);
        let p = prefs(&["09:00-10:00"]);
        assert_eq!(selected(select_train(&opts, &p)), Some((t("09:10"), Some(0))));
    }

    #[test]
    fn no_match_outside_all_ranges() {
        let opts = options(&["06:00", "23:00"]);
        let p = prefs(&["09:00-10:00"]);
        assert_eq!(select_train(&opts, &p), Selection::NoMatch);
    }

    #[test]
    fn range_ends_are_inclusive() {
        let opts = options(&["10:00"]);
        let p = prefs(&["09:00-10:00"]);
        assert_eq!(selected(select_train(&opts, &p)), Some((t("10:00"), Some(0))));
    }

    #[test]
    fn empty_preferences_take_first_listed() {
        let opts = options(&["11:00", "07:00"]);
        assert_eq!(
            selected(select_train(&opts, &PreferenceList::any())),
            Some((t("11:00"), None))
        );
        assert!(!is_chronological(&opts));
    }

    #[test]
    fn empty_listing_is_no_match() {
        let opts: Vec<TrainOption<usize>> = Vec::new();
        assert_eq!(select_train(&opts, &PreferenceList::any()), Selection::NoMatch);
        assert_eq!(select_train(&opts, &prefs(&["09:00-10:00"])), Selection::NoMatch);
        assert!(is_chronological(&opts));
    }

    #[test]
    fn duplicate_departures_keep_listing_order() {
        let opts = options(&["09:30", "09:30"]);
        let p = prefs(&["09:00-10:00"]);
        match select_train(&opts, &p) {
            Selection::Selected { option, .. } => assert_eq!(option.handle, 0),
            Selection::NoMatch => panic!("expected a selection"),
        }
    }

    #[test]
    fn rank_orders_by_priority_then_departure() {
        let opts = options(&["14:30", "09:50", "14:05", "09:10", "12:00"]);
        let p = prefs(&["14:00-15:00", "09:00-10:00"]);
        let ranked: Vec<(usize, TimeOfDay)> = rank_candidates(&opts, &p)
            .iter()
            .map(|c| (c.priority, c.departure))
            .collect();
        assert_eq!(
            ranked,
            vec![
                (0, t("14:05")),
                (0, t("14:30")),
                (1, t("09:10")),
                (1, t("09:50")),
            ]
        );
    }
}
