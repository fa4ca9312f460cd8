//! Network construction.
//!
//! Loading timetables from source data is the job of an importer; this
//! builder is the interface it targets. References are checked as they are
//! added so that a built [`Network`] never contains a dangling index.

use chrono::NaiveDate;

use crate::connections::{Continuation, ContinuationKind, ConnectionIndex, FootpathSet};

use super::{
    DateTime, DomainError, Frequency, Label, Line, LineIdx, Mode, ModeIdx, Network, Pattern,
    PatternIdx, PatternPoint, PatternPointIdx, StopArea, StopAreaIdx, StopPoint, StopPointIdx,
    StopTime, Trip, TripIdx, ValidityPattern, ValidityPatternIdx,
};

/// Incremental builder for a [`Network`].
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    start_date: NaiveDate,
    stop_areas: Vec<StopArea>,
    stop_points: Vec<StopPoint>,
    lines: Vec<Line>,
    modes: Vec<Mode>,
    patterns: Vec<Pattern>,
    pattern_points: Vec<PatternPoint>,
    trips: Vec<Trip>,
    validity_patterns: Vec<ValidityPattern>,
    footpaths: FootpathSet,
    continuations: Vec<Continuation>,
}

fn check(kind: &'static str, index: usize, len: usize) -> Result<(), DomainError> {
    if index < len {
        Ok(())
    } else {
        Err(DomainError::UnknownIndex { kind, index })
    }
}

impl NetworkBuilder {
    /// Create an empty builder whose day 0 is `start_date`.
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            stop_areas: Vec::new(),
            stop_points: Vec::new(),
            lines: Vec::new(),
            modes: Vec::new(),
            patterns: Vec::new(),
            pattern_points: Vec::new(),
            trips: Vec::new(),
            validity_patterns: Vec::new(),
            footpaths: FootpathSet::new(),
            continuations: Vec::new(),
        }
    }

    pub fn add_stop_area(&mut self, uri: impl Into<String>, name: impl Into<String>) -> StopAreaIdx {
        self.stop_areas.push(StopArea {
            uri: uri.into(),
            name: name.into(),
            stop_points: Vec::new(),
        });
        StopAreaIdx::from(self.stop_areas.len() - 1)
    }

    /// Adds a stop point, optionally inside a stop area.
    pub fn add_stop_point(
        &mut self,
        uri: impl Into<String>,
        name: impl Into<String>,
        area: Option<StopAreaIdx>,
    ) -> Result<StopPointIdx, DomainError> {
        let idx = StopPointIdx::from(self.stop_points.len());
        if let Some(area) = area {
            check("stop area", area.index(), self.stop_areas.len())?;
            self.stop_areas[area.index()].stop_points.push(idx);
        }
        self.stop_points.push(StopPoint {
            uri: uri.into(),
            name: name.into(),
            stop_area: area,
            pattern_points: Vec::new(),
        });
        Ok(idx)
    }

    pub fn add_line(&mut self, uri: impl Into<String>, name: impl Into<String>) -> LineIdx {
        self.lines.push(Line {
            uri: uri.into(),
            name: name.into(),
        });
        LineIdx::from(self.lines.len() - 1)
    }

    pub fn add_mode(&mut self, uri: impl Into<String>, name: impl Into<String>) -> ModeIdx {
        self.modes.push(Mode {
            uri: uri.into(),
            name: name.into(),
        });
        ModeIdx::from(self.modes.len() - 1)
    }

    pub fn add_validity_pattern(&mut self, validity: ValidityPattern) -> ValidityPatternIdx {
        self.validity_patterns.push(validity);
        ValidityPatternIdx::from(self.validity_patterns.len() - 1)
    }

    /// Adds a pattern serving `stops` in order, creating its pattern points.
    pub fn add_pattern(
        &mut self,
        uri: impl Into<String>,
        line: LineIdx,
        mode: ModeIdx,
        stops: &[StopPointIdx],
    ) -> Result<PatternIdx, DomainError> {
        if stops.is_empty() {
            return Err(DomainError::EmptyPattern);
        }
        check("line", line.index(), self.lines.len())?;
        check("mode", mode.index(), self.modes.len())?;
        for stop in stops {
            check("stop point", stop.index(), self.stop_points.len())?;
        }

        let pattern = PatternIdx::from(self.patterns.len());
        let mut points = Vec::with_capacity(stops.len());
        for (order, stop) in stops.iter().enumerate() {
            let pp = PatternPointIdx::from(self.pattern_points.len());
            self.pattern_points.push(PatternPoint {
                pattern,
                stop_point: *stop,
                order,
            });
            self.stop_points[stop.index()].pattern_points.push(pp);
            points.push(pp);
        }

        self.patterns.push(Pattern {
            uri: uri.into(),
            line,
            mode,
            points,
            trips: Vec::new(),
        });
        Ok(pattern)
    }

    /// The pattern point at position `order` of `pattern`.
    pub fn pattern_point(&self, pattern: PatternIdx, order: usize) -> Option<PatternPointIdx> {
        self.patterns
            .get(pattern.index())
            .and_then(|p| p.points.get(order))
            .copied()
    }

    /// Adds a fixed-schedule, wheelchair-accessible trip.
    pub fn add_trip(
        &mut self,
        uri: impl Into<String>,
        pattern: PatternIdx,
        validity: ValidityPatternIdx,
        stop_times: Vec<StopTime>,
    ) -> Result<TripIdx, DomainError> {
        self.push_trip(uri.into(), pattern, validity, stop_times, None)
    }

    /// Adds a headway-based trip whose `stop_times` describe the first run.
    pub fn add_frequency_trip(
        &mut self,
        uri: impl Into<String>,
        pattern: PatternIdx,
        validity: ValidityPatternIdx,
        stop_times: Vec<StopTime>,
        frequency: Frequency,
    ) -> Result<TripIdx, DomainError> {
        self.push_trip(uri.into(), pattern, validity, stop_times, Some(frequency))
    }

    pub fn set_wheelchair_accessible(
        &mut self,
        trip: TripIdx,
        accessible: bool,
    ) -> Result<(), DomainError> {
        check("trip", trip.index(), self.trips.len())?;
        self.trips[trip.index()].wheelchair_accessible = accessible;
        Ok(())
    }

    fn push_trip(
        &mut self,
        uri: String,
        pattern: PatternIdx,
        validity: ValidityPatternIdx,
        stop_times: Vec<StopTime>,
        frequency: Option<Frequency>,
    ) -> Result<TripIdx, DomainError> {
        check("pattern", pattern.index(), self.patterns.len())?;
        check(
            "validity pattern",
            validity.index(),
            self.validity_patterns.len(),
        )?;
        let expected = self.patterns[pattern.index()].len();
        if stop_times.len() != expected {
            return Err(DomainError::StopTimeCount {
                pattern,
                expected,
                actual: stop_times.len(),
            });
        }

        let trip = TripIdx::from(self.trips.len());
        let ordered = stop_times.iter().all(|st| st.arrival <= st.departure)
            && stop_times
                .windows(2)
                .all(|w| w[0].departure <= w[1].arrival);
        if !ordered {
            return Err(DomainError::UnorderedStopTimes(trip));
        }

        self.trips.push(Trip {
            uri,
            pattern,
            validity,
            wheelchair_accessible: true,
            stop_times,
            frequency,
        });
        self.patterns[pattern.index()].trips.push(trip);
        Ok(trip)
    }

    /// Adds a symmetric footpath between two stop points.
    pub fn add_footpath(
        &mut self,
        a: StopPointIdx,
        b: StopPointIdx,
        duration: u32,
    ) -> Result<(), DomainError> {
        check("stop point", a.index(), self.stop_points.len())?;
        check("stop point", b.index(), self.stop_points.len())?;
        self.footpaths.add(a, b, duration);
        Ok(())
    }

    /// Adds a directed extension or guarantee between two pattern points.
    pub fn add_continuation(
        &mut self,
        from: PatternPointIdx,
        to: PatternPointIdx,
        duration: u32,
        kind: ContinuationKind,
    ) -> Result<(), DomainError> {
        check("pattern point", from.index(), self.pattern_points.len())?;
        check("pattern point", to.index(), self.pattern_points.len())?;
        self.continuations.push(Continuation {
            from,
            to,
            duration,
            kind,
        });
        Ok(())
    }

    /// Freezes the network, grouping connections and sorting trips.
    pub fn build(mut self) -> Network {
        for pattern in &mut self.patterns {
            pattern
                .trips
                .sort_by_key(|t| (self.trips[t.index()].first_departure(), *t));
        }

        let connections = ConnectionIndex::new(
            self.stop_points.len(),
            self.pattern_points.len(),
            &self.footpaths,
            &self.continuations,
        );
        let n = self.pattern_points.len();

        Network {
            start_date: self.start_date,
            stop_areas: self.stop_areas,
            stop_points: self.stop_points,
            lines: self.lines,
            modes: self.modes,
            patterns: self.patterns,
            pattern_points: self.pattern_points,
            trips: self.trips,
            validity_patterns: self.validity_patterns,
            connections,
            forward_template: vec![Label::uninitialized(DateTime::INF); n],
            backward_template: vec![Label::uninitialized(DateTime::MIN); n],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> NetworkBuilder {
        NetworkBuilder::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn pattern_points_link_back() {
        let mut b = builder();
        let area = b.add_stop_area("sa:1", "Central");
        let a = b.add_stop_point("sp:a", "A", Some(area)).unwrap();
        let c = b.add_stop_point("sp:c", "C", Some(area)).unwrap();
        let line = b.add_line("line:1", "1");
        let mode = b.add_mode("mode:bus", "Bus");
        let p = b.add_pattern("jp:1", line, mode, &[a, c]).unwrap();
        let net = b.build();

        assert_eq!(net.stop_area(area).stop_points, vec![a, c]);
        let pattern = net.pattern(p);
        assert_eq!(pattern.len(), 2);
        let second = net.pattern_point(pattern.points[1]);
        assert_eq!(second.order, 1);
        assert_eq!(second.stop_point, c);
        assert_eq!(net.stop_point(c).pattern_points, vec![pattern.points[1]]);
        assert_eq!(net.find_stop_point("sp:c"), Some(c));
        assert_eq!(net.find_stop_area("sa:1"), Some(area));
    }

    #[test]
    fn trips_sorted_by_first_departure() {
        let mut b = builder();
        let a = b.add_stop_point("a", "A", None).unwrap();
        let c = b.add_stop_point("c", "C", None).unwrap();
        let line = b.add_line("l", "L");
        let mode = b.add_mode("m", "M");
        let p = b.add_pattern("p", line, mode, &[a, c]).unwrap();
        let vp = b.add_validity_pattern(ValidityPattern::every_day(1));
        let late = b
            .add_trip("late", p, vp, vec![StopTime::new(900, 900), StopTime::new(1000, 1000)])
            .unwrap();
        let early = b
            .add_trip("early", p, vp, vec![StopTime::new(100, 100), StopTime::new(200, 200)])
            .unwrap();
        let net = b.build();

        assert_eq!(net.pattern(p).trips, vec![early, late]);
    }

    #[test]
    fn rejects_stop_time_count_mismatch() {
        let mut b = builder();
        let a = b.add_stop_point("a", "A", None).unwrap();
        let c = b.add_stop_point("c", "C", None).unwrap();
        let line = b.add_line("l", "L");
        let mode = b.add_mode("m", "M");
        let p = b.add_pattern("p", line, mode, &[a, c]).unwrap();
        let vp = b.add_validity_pattern(ValidityPattern::every_day(1));

        let err = b
            .add_trip("t", p, vp, vec![StopTime::new(100, 100)])
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::StopTimeCount {
                pattern: p,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn rejects_decreasing_stop_times() {
        let mut b = builder();
        let a = b.add_stop_point("a", "A", None).unwrap();
        let c = b.add_stop_point("c", "C", None).unwrap();
        let line = b.add_line("l", "L");
        let mode = b.add_mode("m", "M");
        let p = b.add_pattern("p", line, mode, &[a, c]).unwrap();
        let vp = b.add_validity_pattern(ValidityPattern::every_day(1));

        let err = b
            .add_trip("t", p, vp, vec![StopTime::new(500, 500), StopTime::new(400, 400)])
            .unwrap_err();
        assert_eq!(err, DomainError::UnorderedStopTimes(TripIdx(0)));
    }

    #[test]
    fn rejects_unknown_references() {
        let mut b = builder();
        let line = b.add_line("l", "L");
        let mode = b.add_mode("m", "M");

        assert_eq!(
            b.add_pattern("p", line, mode, &[StopPointIdx(3)]),
            Err(DomainError::UnknownIndex {
                kind: "stop point",
                index: 3
            })
        );
        assert_eq!(
            b.add_pattern("p", line, mode, &[]),
            Err(DomainError::EmptyPattern)
        );
        assert!(b.add_stop_point("x", "X", Some(StopAreaIdx(0))).is_err());
        assert!(b.add_footpath(StopPointIdx(0), StopPointIdx(1), 10).is_err());
    }

    #[test]
    fn templates_hold_direction_sentinels() {
        let mut b = builder();
        let a = b.add_stop_point("a", "A", None).unwrap();
        let line = b.add_line("l", "L");
        let mode = b.add_mode("m", "M");
        b.add_pattern("p", line, mode, &[a, a]).unwrap();
        let net = b.build();

        assert_eq!(net.label_template(true).len(), 2);
        assert!(net
            .label_template(true)
            .iter()
            .all(|l| l.arrival == DateTime::INF && !l.is_initialized()));
        assert!(net
            .label_template(false)
            .iter()
            .all(|l| l.departure == DateTime::MIN));
    }
}
