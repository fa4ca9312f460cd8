//! Trip selection.
//!
//! Given a pattern, a position on it and a time, find the best trip to board
//! there. The engine consumes this as a pure function through
//! [`TripSelector`], so tests and alternative timetable layouts can plug in
//! their own lookup.

use crate::domain::{DateTime, Network, PatternIdx, SECONDS_PER_DAY, StopTime, Trip, TripIdx};

/// A boardable trip and the headway offset resolved for frequency trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boarding {
    pub trip: TripIdx,
    pub gap: u32,
}

/// Timetable lookup used by the scanning engine.
pub trait TripSelector {
    /// Earliest trip departing the pattern's `order`-th stop at or after `ready`.
    fn earliest_trip(
        &self,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        ready: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding>;

    /// Latest trip arriving at the pattern's `order`-th stop at or before `deadline`.
    fn tardiest_trip(
        &self,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        deadline: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding>;
}

/// Scans a pattern's trips against their service calendars.
///
/// Each trip is tried on the service days around the query instant, so
/// services running past midnight are found from either calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimetableSelector;

fn service_days(instant: DateTime) -> impl Iterator<Item = u32> {
    let day = instant.day();
    day.saturating_sub(1)..=day.saturating_add(1)
}

fn usable(trip: &Trip, wheelchair: bool) -> bool {
    !wheelchair || trip.wheelchair_accessible
}

/// First run of `trip` leaving `st` at or after `ready` on `service_day`.
fn departure_on(
    trip: &Trip,
    st: &StopTime,
    service_day: u32,
    ready: DateTime,
) -> Option<(DateTime, u32)> {
    let base = DateTime::new(service_day, st.departure);
    let Some(freq) = trip.frequency else {
        return Some((base, 0));
    };
    let gap = if base >= ready || freq.headway_secs == 0 {
        0
    } else {
        ready.seconds_since(base).div_ceil(freq.headway_secs) * freq.headway_secs
    };
    if trip.first_departure().saturating_add(gap) > freq.end_secs {
        return None;
    }
    Some((base.saturating_add(gap), gap))
}

/// Last run of `trip` reaching `st` at or before `deadline` on `service_day`.
fn arrival_on(
    trip: &Trip,
    st: &StopTime,
    service_day: u32,
    deadline: DateTime,
) -> Option<(DateTime, u32)> {
    let base = DateTime::new(service_day, st.arrival);
    let Some(freq) = trip.frequency else {
        return Some((base, 0));
    };
    if base > deadline {
        return None;
    }
    let span = freq.end_secs.checked_sub(trip.first_departure())?;
    let last_gap = if freq.headway_secs == 0 {
        0
    } else {
        span / freq.headway_secs * freq.headway_secs
    };
    let gap = if base.saturating_add(last_gap) <= deadline {
        last_gap
    } else {
        deadline.seconds_since(base) / freq.headway_secs * freq.headway_secs
    };
    Some((base.saturating_add(gap), gap))
}

impl TripSelector for TimetableSelector {
    fn earliest_trip(
        &self,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        ready: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding> {
        let horizon = ready.saturating_add(SECONDS_PER_DAY);
        let mut best: Option<(DateTime, Boarding)> = None;

        for &idx in &network.pattern(pattern).trips {
            let trip = network.trip(idx);
            let st = &trip.stop_times[order];
            if !st.pick_up || !usable(trip, wheelchair) {
                continue;
            }
            let calendar = network.validity_pattern(trip.validity);
            for day in service_days(ready).filter(|d| calendar.check(*d)) {
                let Some((instant, gap)) = departure_on(trip, st, day, ready) else {
                    continue;
                };
                if instant < ready || instant >= horizon {
                    continue;
                }
                if best.is_none_or(|(b, _)| instant < b) {
                    best = Some((instant, Boarding { trip: idx, gap }));
                }
            }
        }

        best.map(|(_, boarding)| boarding)
    }

    fn tardiest_trip(
        &self,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        deadline: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding> {
        let horizon = deadline.seconds().checked_sub(SECONDS_PER_DAY);
        let mut best: Option<(DateTime, Boarding)> = None;

        for &idx in &network.pattern(pattern).trips {
            let trip = network.trip(idx);
            let st = &trip.stop_times[order];
            if !st.drop_off || !usable(trip, wheelchair) {
                continue;
            }
            let calendar = network.validity_pattern(trip.validity);
            for day in service_days(deadline).filter(|d| calendar.check(*d)) {
                let Some((instant, gap)) = arrival_on(trip, st, day, deadline) else {
                    continue;
                };
                if instant > deadline || horizon.is_some_and(|h| instant.seconds() <= h) {
                    continue;
                }
                if best.is_none_or(|(b, _)| instant > b) {
                    best = Some((instant, Boarding { trip: idx, gap }));
                }
            }
        }

        best.map(|(_, boarding)| boarding)
    }
}
