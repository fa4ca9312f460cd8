//! The static timetable network.
//!
//! A `Network` is built once by [`NetworkBuilder`](super::NetworkBuilder) and
//! is read-only afterwards; any number of engines may borrow it at once.
//! Cross references between tables are typed indices. Indexing with an index
//! that did not come from this network is a caller bug and panics.

use chrono::{NaiveDate, NaiveDateTime};
use fixedbitset::FixedBitSet;

use crate::connections::ConnectionIndex;

use super::{
    DateTime, Label, LineIdx, ModeIdx, PatternIdx, PatternPointIdx, StopAreaIdx, StopPointIdx,
    TripIdx, ValidityPatternIdx,
};

/// A cluster of stop points, used to expand area-level queries.
#[derive(Debug, Clone)]
pub struct StopArea {
    pub uri: String,
    pub name: String,
    pub stop_points: Vec<StopPointIdx>,
}

/// A physical stop.
#[derive(Debug, Clone)]
pub struct StopPoint {
    pub uri: String,
    pub name: String,
    pub stop_area: Option<StopAreaIdx>,
    /// Every pattern point serving this stop, across all patterns.
    pub pattern_points: Vec<PatternPointIdx>,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Mode {
    pub uri: String,
    pub name: String,
}

/// A route variant: a fixed sequence of stops and the trips running it.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub uri: String,
    pub line: LineIdx,
    pub mode: ModeIdx,
    /// Pattern points in travel order.
    pub points: Vec<PatternPointIdx>,
    /// Trips sorted by departure from the first stop.
    pub trips: Vec<TripIdx>,
}

impl Pattern {
    /// Number of stops served.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the pattern serves no stop.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One stop occurrence within a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternPoint {
    pub pattern: PatternIdx,
    pub stop_point: StopPointIdx,
    /// 0-based position in the pattern.
    pub order: usize,
}

/// A trip's timing at one pattern point.
///
/// Offsets are seconds from midnight of the trip's service day. For a
/// frequency trip they describe the first run; later runs add the resolved
/// `gap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime {
    pub arrival: u32,
    pub departure: u32,
    pub pick_up: bool,
    pub drop_off: bool,
    /// Local traffic zone; riding within one zone does not count as a stop.
    pub local_zone: Option<u32>,
}

impl StopTime {
    /// A stop time where boarding and alighting are both allowed.
    pub fn new(arrival: u32, departure: u32) -> Self {
        Self {
            arrival,
            departure,
            pick_up: true,
            drop_off: true,
            local_zone: None,
        }
    }

    /// Forbids boarding here.
    pub fn no_pick_up(mut self) -> Self {
        self.pick_up = false;
        self
    }

    /// Forbids alighting here.
    pub fn no_drop_off(mut self) -> Self {
        self.drop_off = false;
        self
    }

    /// Places the stop in a local traffic zone.
    pub fn in_zone(mut self, zone: u32) -> Self {
        self.local_zone = Some(zone);
        self
    }

    /// Arrival offset for the run shifted by `gap`.
    pub fn arrival_at(&self, gap: u32) -> u32 {
        self.arrival.saturating_add(gap)
    }

    /// Departure offset for the run shifted by `gap`.
    pub fn departure_at(&self, gap: u32) -> u32 {
        self.departure.saturating_add(gap)
    }
}

/// Headway-based service: runs start every `headway_secs` from the first
/// departure until `end_secs` (inclusive) on the service day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub headway_secs: u32,
    pub end_secs: u32,
}

/// One scheduled run of a pattern.
#[derive(Debug, Clone)]
pub struct Trip {
    pub uri: String,
    pub pattern: PatternIdx,
    pub validity: ValidityPatternIdx,
    pub wheelchair_accessible: bool,
    /// One stop time per pattern point, in pattern order.
    pub stop_times: Vec<StopTime>,
    pub frequency: Option<Frequency>,
}

impl Trip {
    /// Departure offset of the first run from the first stop.
    pub fn first_departure(&self) -> u32 {
        self.stop_times.first().map_or(0, |st| st.departure)
    }
}

/// A per-day service calendar.
///
/// # Examples
///
/// ```
/// use transit_planner::domain::ValidityPattern;
///
/// let vp = ValidityPattern::from_days(&[3]);
/// assert!(vp.check(3));
/// assert!(!vp.check(4));
///
/// // Tolerates the neighbouring days for services crossing midnight
/// assert!(vp.check2(2));
/// assert!(vp.check2(4));
/// assert!(!vp.check2(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityPattern {
    days: FixedBitSet,
}

impl ValidityPattern {
    /// Creates a calendar active on the given day numbers.
    pub fn from_days(days: &[u32]) -> Self {
        let len = days.iter().max().map_or(0, |d| *d as usize + 1);
        let mut bits = FixedBitSet::with_capacity(len);
        for day in days {
            bits.insert(*day as usize);
        }
        Self { days: bits }
    }

    /// Creates a calendar active on every day in `0..count`.
    pub fn every_day(count: u32) -> Self {
        let mut bits = FixedBitSet::with_capacity(count as usize);
        bits.insert_range(..);
        Self { days: bits }
    }

    /// Is the service running on `day`?
    pub fn check(&self, day: u32) -> bool {
        self.days.contains(day as usize)
    }

    /// Is the service running on `day` or either neighbouring day?
    pub fn check2(&self, day: u32) -> bool {
        day.checked_sub(1).is_some_and(|d| self.check(d))
            || self.check(day)
            || day.checked_add(1).is_some_and(|d| self.check(d))
    }
}

/// The read-only timetable graph.
#[derive(Debug, Clone)]
pub struct Network {
    pub(super) start_date: NaiveDate,
    pub(super) stop_areas: Vec<StopArea>,
    pub(super) stop_points: Vec<StopPoint>,
    pub(super) lines: Vec<Line>,
    pub(super) modes: Vec<Mode>,
    pub(super) patterns: Vec<Pattern>,
    pub(super) pattern_points: Vec<PatternPoint>,
    pub(super) trips: Vec<Trip>,
    pub(super) validity_patterns: Vec<ValidityPattern>,
    pub(super) connections: ConnectionIndex,
    pub(super) forward_template: Vec<Label>,
    pub(super) backward_template: Vec<Label>,
}

impl Network {
    /// First calendar day (day 0 of the network clock).
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Converts a calendar datetime to the network clock.
    pub fn datetime(&self, value: NaiveDateTime) -> Option<DateTime> {
        DateTime::from_naive(value, self.start_date)
    }

    pub fn stop_areas(&self) -> &[StopArea] {
        &self.stop_areas
    }

    pub fn stop_points(&self) -> &[StopPoint] {
        &self.stop_points
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern_points(&self) -> &[PatternPoint] {
        &self.pattern_points
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn stop_area(&self, idx: StopAreaIdx) -> &StopArea {
        &self.stop_areas[idx.index()]
    }

    pub fn stop_point(&self, idx: StopPointIdx) -> &StopPoint {
        &self.stop_points[idx.index()]
    }

    pub fn line(&self, idx: LineIdx) -> &Line {
        &self.lines[idx.index()]
    }

    pub fn mode(&self, idx: ModeIdx) -> &Mode {
        &self.modes[idx.index()]
    }

    pub fn pattern(&self, idx: PatternIdx) -> &Pattern {
        &self.patterns[idx.index()]
    }

    pub fn pattern_point(&self, idx: PatternPointIdx) -> &PatternPoint {
        &self.pattern_points[idx.index()]
    }

    pub fn trip(&self, idx: TripIdx) -> &Trip {
        &self.trips[idx.index()]
    }

    pub fn validity_pattern(&self, idx: ValidityPatternIdx) -> &ValidityPattern {
        &self.validity_patterns[idx.index()]
    }

    /// The stop time of `trip` at position `order` of its pattern.
    pub fn stop_time(&self, trip: TripIdx, order: usize) -> &StopTime {
        &self.trips[trip.index()].stop_times[order]
    }

    /// Grouped footpaths and continuations.
    pub fn connections(&self) -> &ConnectionIndex {
        &self.connections
    }

    /// All-uninitialized labels for one direction.
    pub fn label_template(&self, clockwise: bool) -> &[Label] {
        if clockwise {
            &self.forward_template
        } else {
            &self.backward_template
        }
    }

    /// Looks up a stop point by URI.
    pub fn find_stop_point(&self, uri: &str) -> Option<StopPointIdx> {
        self.stop_points
            .iter()
            .position(|sp| sp.uri == uri)
            .map(StopPointIdx::from)
    }

    /// Looks up a stop area by URI.
    pub fn find_stop_area(&self, uri: &str) -> Option<StopAreaIdx> {
        self.stop_areas
            .iter()
            .position(|sa| sa.uri == uri)
            .map(StopAreaIdx::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_check_out_of_range() {
        let vp = ValidityPattern::from_days(&[0]);
        assert!(vp.check(0));
        assert!(!vp.check(100));
        assert!(vp.check2(1));
        assert!(!vp.check2(2));
    }

    #[test]
    fn validity_every_day() {
        let vp = ValidityPattern::every_day(3);
        assert!(vp.check(0));
        assert!(vp.check(2));
        assert!(!vp.check(3));
        assert!(vp.check2(3));
    }

    #[test]
    fn stop_time_gap_and_flags() {
        let st = StopTime::new(100, 160).no_pick_up().in_zone(4);
        assert!(!st.pick_up);
        assert!(st.drop_off);
        assert_eq!(st.local_zone, Some(4));
        assert_eq!(st.arrival_at(600), 700);
        assert_eq!(st.departure_at(600), 760);
    }
}
