//! Journey types.
//!
//! A `Journey` is the output of a point-to-point search: an ordered list of
//! rides and transfers from an origin pattern point to a destination one.

use serde::Serialize;

use super::{DateTime, DomainError, PatternPointIdx, TripIdx};

/// Time spent on board one trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ride {
    pub trip: TripIdx,
    /// Pattern point where the trip is boarded.
    pub board: PatternPointIdx,
    /// Pattern point where the trip is left.
    pub alight: PatternPointIdx,
    pub departure: DateTime,
    pub arrival: DateTime,
}

/// How a transfer between two pattern points is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransferKind {
    /// Platform change within one stop point
    SameStop,
    /// Walk between two stop points
    Walking,
    /// Stay on board while the vehicle continues as another pattern
    StaySeated,
    /// Held connection
    Guaranteed,
}

/// A change between rides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub from: PatternPointIdx,
    pub to: PatternPointIdx,
    pub departure: DateTime,
    pub arrival: DateTime,
    pub kind: TransferKind,
}

impl Transfer {
    /// Transfer duration in seconds.
    pub fn duration(&self) -> u32 {
        self.arrival.seconds_since(self.departure)
    }
}

/// A segment of a journey: either a ride or a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Segment {
    Ride(Ride),
    Transfer(Transfer),
}

impl Segment {
    /// Returns the pattern point this segment starts from.
    pub fn start(&self) -> PatternPointIdx {
        match self {
            Segment::Ride(ride) => ride.board,
            Segment::Transfer(transfer) => transfer.from,
        }
    }

    /// Returns the pattern point this segment ends at.
    pub fn end(&self) -> PatternPointIdx {
        match self {
            Segment::Ride(ride) => ride.alight,
            Segment::Transfer(transfer) => transfer.to,
        }
    }

    pub fn departure(&self) -> DateTime {
        match self {
            Segment::Ride(ride) => ride.departure,
            Segment::Transfer(transfer) => transfer.departure,
        }
    }

    pub fn arrival(&self) -> DateTime {
        match self {
            Segment::Ride(ride) => ride.arrival,
            Segment::Transfer(transfer) => transfer.arrival,
        }
    }

    /// Returns the ride if this is a ride segment.
    pub fn as_ride(&self) -> Option<&Ride> {
        match self {
            Segment::Ride(ride) => Some(ride),
            Segment::Transfer(_) => None,
        }
    }

    /// Returns the transfer if this is a transfer segment.
    pub fn as_transfer(&self) -> Option<&Transfer> {
        match self {
            Segment::Ride(_) => None,
            Segment::Transfer(transfer) => Some(transfer),
        }
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one segment
/// - Consecutive segments connect (end of one = start of next)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Journey {
    segments: Vec<Segment>,
    /// Departure datetime of the query this journey answers, for
    /// multi-departure searches.
    request_time: Option<DateTime>,
}

impl Journey {
    /// Constructs a journey from segments in travel order.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - Segments list is empty
    /// - Segments don't connect
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::{DateTime, Journey, PatternPointIdx, Ride, Segment, TripIdx};
    ///
    /// let ride = Ride {
    ///     trip: TripIdx(0),
    ///     board: PatternPointIdx(0),
    ///     alight: PatternPointIdx(1),
    ///     departure: DateTime::new(0, 8000),
    ///     arrival: DateTime::new(0, 8100),
    /// };
    /// let journey = Journey::new(vec![Segment::Ride(ride)]).unwrap();
    ///
    /// assert_eq!(journey.arrival_time(), DateTime::new(0, 8100));
    /// assert_eq!(journey.change_count(), 0);
    /// ```
    pub fn new(segments: Vec<Segment>) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::EmptyJourney);
        }

        for window in segments.windows(2) {
            let prev_end = window[0].end();
            let next_start = window[1].start();
            if prev_end != next_start {
                return Err(DomainError::SegmentsNotConnected(prev_end, next_start));
            }
        }

        Ok(Journey {
            segments,
            request_time: None,
        })
    }

    /// Tags the journey with the departure datetime it was computed for.
    pub fn with_request_time(mut self, request_time: DateTime) -> Self {
        self.request_time = Some(request_time);
        self
    }

    pub fn request_time(&self) -> Option<DateTime> {
        self.request_time
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns all rides in order.
    pub fn rides(&self) -> impl Iterator<Item = &Ride> {
        self.segments.iter().filter_map(|s| s.as_ride())
    }

    /// Returns all transfers in order.
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.segments.iter().filter_map(|s| s.as_transfer())
    }

    pub fn ride_count(&self) -> usize {
        self.rides().count()
    }

    /// Number of vehicle changes; staying seated through an extension is not one.
    pub fn change_count(&self) -> usize {
        let seated = self
            .transfers()
            .filter(|t| t.kind == TransferKind::StaySeated)
            .count();
        self.ride_count().saturating_sub(1).saturating_sub(seated)
    }

    pub fn origin(&self) -> PatternPointIdx {
        self.segments[0].start()
    }

    pub fn destination(&self) -> PatternPointIdx {
        self.segments[self.segments.len() - 1].end()
    }

    pub fn departure_time(&self) -> DateTime {
        self.segments[0].departure()
    }

    pub fn arrival_time(&self) -> DateTime {
        self.segments[self.segments.len() - 1].arrival()
    }

    /// Total journey duration in seconds.
    pub fn total_duration(&self) -> u32 {
        self.arrival_time().seconds_since(self.departure_time())
    }

    /// Total time spent walking, in seconds.
    pub fn total_walk_duration(&self) -> u32 {
        self.transfers()
            .filter(|t| t.kind == TransferKind::Walking)
            .map(Transfer::duration)
            .sum()
    }

    /// Returns true if this is a direct journey (no changes).
    pub fn is_direct(&self) -> bool {
        self.change_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pp(i: u32) -> PatternPointIdx {
        PatternPointIdx(i)
    }

    fn t(secs: u32) -> DateTime {
        DateTime::new(0, secs)
    }

    fn ride(trip: u32, board: u32, alight: u32, dep: u32, arr: u32) -> Segment {
        Segment::Ride(Ride {
            trip: TripIdx(trip),
            board: pp(board),
            alight: pp(alight),
            departure: t(dep),
            arrival: t(arr),
        })
    }

    fn transfer(from: u32, to: u32, dep: u32, arr: u32, kind: TransferKind) -> Segment {
        Segment::Transfer(Transfer {
            from: pp(from),
            to: pp(to),
            departure: t(dep),
            arrival: t(arr),
            kind,
        })
    }

    #[test]
    fn journey_single_ride() {
        let journey = Journey::new(vec![ride(0, 0, 1, 8000, 8100)]).unwrap();

        assert_eq!(journey.segments().len(), 1);
        assert_eq!(journey.ride_count(), 1);
        assert_eq!(journey.change_count(), 0);
        assert!(journey.is_direct());
        assert_eq!(journey.origin(), pp(0));
        assert_eq!(journey.destination(), pp(1));
        assert_eq!(journey.departure_time(), t(8000));
        assert_eq!(journey.arrival_time(), t(8100));
        assert_eq!(journey.total_duration(), 100);
        assert_eq!(journey.request_time(), None);
    }

    #[test]
    fn journey_with_walk() {
        let journey = Journey::new(vec![
            ride(0, 0, 1, 8000, 8100),
            transfer(1, 2, 8100, 8300, TransferKind::Walking),
            ride(1, 2, 3, 8400, 9000),
        ])
        .unwrap();

        assert_eq!(journey.ride_count(), 2);
        assert_eq!(journey.change_count(), 1);
        assert_eq!(journey.total_walk_duration(), 200);
        assert_eq!(journey.total_duration(), 1000);
    }

    #[test]
    fn stay_seated_is_not_a_change() {
        let journey = Journey::new(vec![
            ride(0, 0, 1, 8000, 8100),
            transfer(1, 2, 8100, 8100, TransferKind::StaySeated),
            ride(1, 2, 3, 8100, 8200),
        ])
        .unwrap();

        assert_eq!(journey.change_count(), 0);
        assert!(journey.is_direct());
    }

    #[test]
    fn empty_journey_rejected() {
        assert_eq!(Journey::new(vec![]), Err(DomainError::EmptyJourney));
    }

    #[test]
    fn disconnected_segments_rejected() {
        let result = Journey::new(vec![ride(0, 0, 1, 8000, 8100), ride(1, 2, 3, 8200, 8300)]);
        assert_eq!(result, Err(DomainError::SegmentsNotConnected(pp(1), pp(2))));
    }

    #[test]
    fn request_time_tag() {
        let journey = Journey::new(vec![ride(0, 0, 1, 8000, 8100)])
            .unwrap()
            .with_request_time(t(7000));
        assert_eq!(journey.request_time(), Some(t(7000)));
    }

    #[test]
    fn serializes_to_json() {
        let journey = Journey::new(vec![ride(0, 0, 1, 8000, 8100)]).unwrap();
        let json = serde_json::to_value(&journey).unwrap();

        assert_eq!(json["segments"][0]["Ride"]["departure"], 8000);
        assert_eq!(json["segments"][0]["Ride"]["alight"], 1);
    }
}
