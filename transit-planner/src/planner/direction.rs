//! Search direction.
//!
//! The engine runs the same scan forward in time (earliest arrival) and
//! backward in time (latest departure). Everything that differs between the
//! two lives behind [`Direction`], implemented by the zero-sized [`Forward`]
//! and [`Backward`] markers. The engine is generic over it, so each direction
//! gets its own monomorphized copy of the hot loop.

use crate::connections::{ConnectionIndex, Continuation, Footpath, GroupedEdges};
use crate::domain::{
    DateTime, Label, LabelKind, Network, PatternIdx, PatternPointIdx, StopTime, TripIdx,
};

use super::trip_select::{Boarding, TripSelector};

/// Comparison and update policy for one search direction.
pub trait Direction: Copy + Default + std::fmt::Debug + 'static {
    /// True for the forward (earliest arrival) search.
    const CLOCKWISE: bool;

    /// The opposite direction, used for the tightening pass.
    type Reverse: Direction;

    /// The unreachable sentinel.
    fn worst() -> DateTime;

    /// Is `a` strictly better than `b`?
    fn better(a: DateTime, b: DateTime) -> bool;

    /// Moves `time` by `secs` in travel direction.
    fn combine(time: DateTime, secs: u32) -> DateTime;

    /// The time this direction optimises: arrival forward, departure backward.
    fn primary(label: &Label) -> DateTime;

    fn set_primary(label: &mut Label, time: DateTime);

    /// Best trip to board at `order` given the label time `ready`.
    fn select_trip<S: TripSelector>(
        selector: &S,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        ready: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding>;

    /// Instant the held trip reaches the next node in travel order.
    fn update_working_time(time: DateTime, st: &StopTime, gap: u32) -> DateTime;

    /// Instant the held trip can be boarded at a node reached at `time`.
    fn boarding_time(time: DateTime, st: &StopTime, gap: u32) -> DateTime;

    /// Pattern positions from `from` onwards in travel order.
    fn traverse(from: usize, len: usize) -> impl Iterator<Item = usize>;

    /// Can the traveller get off (forward) or on (backward) here?
    fn can_alight(st: &StopTime) -> bool;

    /// Label for a node reached by the held trip at `time`.
    fn trip_label(
        time: DateTime,
        st: &StopTime,
        gap: u32,
        boarding: PatternPointIdx,
        trip: TripIdx,
    ) -> Label;

    /// Should the scan start at `order` rather than at `cursor`?
    fn scans_before(order: usize, cursor: usize) -> bool;

    fn footpaths(index: &ConnectionIndex) -> &GroupedEdges<Footpath>;

    fn continuations(index: &ConnectionIndex) -> &GroupedEdges<Continuation>;
}

/// Earliest-arrival search, forward in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forward;

/// Latest-departure search, backward in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backward;

impl Direction for Forward {
    const CLOCKWISE: bool = true;
    type Reverse = Backward;

    fn worst() -> DateTime {
        DateTime::INF
    }

    fn better(a: DateTime, b: DateTime) -> bool {
        a < b
    }

    fn combine(time: DateTime, secs: u32) -> DateTime {
        time.saturating_add(secs)
    }

    fn primary(label: &Label) -> DateTime {
        label.arrival
    }

    fn set_primary(label: &mut Label, time: DateTime) {
        label.arrival = time;
    }

    fn select_trip<S: TripSelector>(
        selector: &S,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        ready: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding> {
        selector.earliest_trip(network, pattern, order, ready, wheelchair)
    }

    fn update_working_time(time: DateTime, st: &StopTime, gap: u32) -> DateTime {
        time.update(st.arrival_at(gap))
    }

    fn boarding_time(time: DateTime, st: &StopTime, gap: u32) -> DateTime {
        time.update(st.departure_at(gap))
    }

    fn traverse(from: usize, len: usize) -> impl Iterator<Item = usize> {
        from..len
    }

    fn can_alight(st: &StopTime) -> bool {
        st.drop_off
    }

    fn trip_label(
        time: DateTime,
        st: &StopTime,
        gap: u32,
        boarding: PatternPointIdx,
        trip: TripIdx,
    ) -> Label {
        Label {
            arrival: time,
            departure: time.update(st.departure_at(gap)),
            boarding: Some(boarding),
            trip: Some(trip),
            kind: LabelKind::Trip,
            gap,
        }
    }

    fn scans_before(order: usize, cursor: usize) -> bool {
        order < cursor
    }

    fn footpaths(index: &ConnectionIndex) -> &GroupedEdges<Footpath> {
        &index.footpaths_forward
    }

    fn continuations(index: &ConnectionIndex) -> &GroupedEdges<Continuation> {
        &index.continuations_forward
    }
}

impl Direction for Backward {
    const CLOCKWISE: bool = false;
    type Reverse = Forward;

    fn worst() -> DateTime {
        DateTime::MIN
    }

    fn better(a: DateTime, b: DateTime) -> bool {
        a > b
    }

    fn combine(time: DateTime, secs: u32) -> DateTime {
        time.saturating_sub(secs)
    }

    fn primary(label: &Label) -> DateTime {
        label.departure
    }

    fn set_primary(label: &mut Label, time: DateTime) {
        label.departure = time;
    }

    fn select_trip<S: TripSelector>(
        selector: &S,
        network: &Network,
        pattern: PatternIdx,
        order: usize,
        ready: DateTime,
        wheelchair: bool,
    ) -> Option<Boarding> {
        selector.tardiest_trip(network, pattern, order, ready, wheelchair)
    }

    fn update_working_time(time: DateTime, st: &StopTime, gap: u32) -> DateTime {
        time.update_reverse(st.departure_at(gap))
    }

    fn boarding_time(time: DateTime, st: &StopTime, gap: u32) -> DateTime {
        time.update_reverse(st.arrival_at(gap))
    }

    fn traverse(from: usize, len: usize) -> impl Iterator<Item = usize> {
        (0..=from.min(len.saturating_sub(1))).rev()
    }

    fn can_alight(st: &StopTime) -> bool {
        st.pick_up
    }

    fn trip_label(
        time: DateTime,
        st: &StopTime,
        gap: u32,
        boarding: PatternPointIdx,
        trip: TripIdx,
    ) -> Label {
        Label {
            arrival: time.update_reverse(st.arrival_at(gap)),
            departure: time,
            boarding: Some(boarding),
            trip: Some(trip),
            kind: LabelKind::Trip,
            gap,
        }
    }

    fn scans_before(order: usize, cursor: usize) -> bool {
        order > cursor
    }

    fn footpaths(index: &ConnectionIndex) -> &GroupedEdges<Footpath> {
        &index.footpaths_backward
    }

    fn continuations(index: &ConnectionIndex) -> &GroupedEdges<Continuation> {
        &index.continuations_backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: u32) -> DateTime {
        DateTime::new(0, secs)
    }

    #[test]
    fn comparators_are_mirrored() {
        assert!(Forward::better(t(10), t(20)));
        assert!(!Forward::better(t(20), t(20)));
        assert!(Backward::better(t(20), t(10)));
        assert!(!Backward::better(t(10), t(10)));

        // Every real time beats the sentinel
        assert!(Forward::better(t(80_000), Forward::worst()));
        assert!(Backward::better(t(1), Backward::worst()));
    }

    #[test]
    fn combine_moves_in_travel_direction() {
        assert_eq!(Forward::combine(t(8100), 200), t(8300));
        assert_eq!(Backward::combine(t(8300), 200), t(8100));
        assert_eq!(Forward::combine(DateTime::INF, 5), DateTime::INF);
        assert_eq!(Backward::combine(t(3), 5), DateTime::MIN);
    }

    #[test]
    fn primary_field_selection() {
        let mut label = Label::origin(t(100));
        label.departure = t(50);
        assert_eq!(Forward::primary(&label), t(100));
        assert_eq!(Backward::primary(&label), t(50));

        Forward::set_primary(&mut label, t(7));
        Backward::set_primary(&mut label, t(3));
        assert_eq!(label.arrival, t(7));
        assert_eq!(label.departure, t(3));
    }

    #[test]
    fn traverse_orders() {
        assert_eq!(Forward::traverse(1, 4).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(Backward::traverse(2, 4).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(Backward::traverse(0, 4).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn working_time_updates() {
        let st = StopTime::new(8100, 8160);
        assert_eq!(Forward::update_working_time(t(8000), &st, 0), t(8100));
        assert_eq!(Forward::boarding_time(t(8100), &st, 0), t(8160));
        assert_eq!(Backward::update_working_time(t(9000), &st, 0), t(8160));
        assert_eq!(Backward::boarding_time(t(8160), &st, 0), t(8100));

        // Gap shifts a frequency run
        assert_eq!(Forward::update_working_time(t(8000), &st, 600), t(8700));
    }

    #[test]
    fn trip_labels_fill_both_times() {
        let st = StopTime::new(8100, 8160);
        let fwd = Forward::trip_label(t(8100), &st, 0, PatternPointIdx(0), TripIdx(3));
        assert_eq!(fwd.arrival, t(8100));
        assert_eq!(fwd.departure, t(8160));
        assert_eq!(fwd.kind, LabelKind::Trip);

        let bwd = Backward::trip_label(t(8160), &st, 0, PatternPointIdx(2), TripIdx(3));
        assert_eq!(bwd.departure, t(8160));
        assert_eq!(bwd.arrival, t(8100));
        assert_eq!(bwd.trip, Some(TripIdx(3)));
    }

    #[test]
    fn queue_cursor_ordering() {
        assert!(Forward::scans_before(1, 3));
        assert!(!Forward::scans_before(3, 3));
        assert!(Backward::scans_before(3, 1));
        assert!(!Backward::scans_before(1, 1));
    }
}
