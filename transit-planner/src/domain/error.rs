//! Domain error types.
//!
//! These errors represent validation failures while building the network
//! and inconsistencies found while assembling journeys. Unreachable queries
//! are not errors; they produce empty results.

use super::{PatternIdx, PatternPointIdx, TripIdx};

/// Domain-level errors for network building and journey validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A referenced entity does not exist in the network under construction
    #[error("unknown {kind} index {index}")]
    UnknownIndex { kind: &'static str, index: usize },

    /// A trip must provide one stop time per pattern point
    #[error("trip on pattern {pattern} has {actual} stop times, expected {expected}")]
    StopTimeCount {
        pattern: PatternIdx,
        expected: usize,
        actual: usize,
    },

    /// A trip's stop times go backwards in time
    #[error("trip {0} has stop times that decrease")]
    UnorderedStopTimes(TripIdx),

    /// A pattern must serve at least one stop
    #[error("pattern must have at least one stop")]
    EmptyPattern,

    /// Consecutive segments don't share a pattern point
    #[error("segments end at {0} but continue from {1}")]
    SegmentsNotConnected(PatternPointIdx, PatternPointIdx),

    /// Walking the label chain reached an uninitialized label
    #[error("label chain broken at pattern point {0}")]
    BrokenLabelChain(PatternPointIdx),

    /// Walking the label chain never reached an origin
    #[error("label chain does not reach an origin within {0} steps")]
    UnterminatedLabelChain(usize),

    /// Journey has no segments
    #[error("journey must have at least one segment")]
    EmptyJourney,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::UnknownIndex {
            kind: "stop point",
            index: 4,
        };
        assert_eq!(err.to_string(), "unknown stop point index 4");

        let err = DomainError::StopTimeCount {
            pattern: PatternIdx(2),
            expected: 3,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "trip on pattern 2 has 1 stop times, expected 3"
        );

        let err = DomainError::SegmentsNotConnected(PatternPointIdx(1), PatternPointIdx(5));
        assert_eq!(err.to_string(), "segments end at 1 but continue from 5");

        let err = DomainError::BrokenLabelChain(PatternPointIdx(9));
        assert_eq!(err.to_string(), "label chain broken at pattern point 9");

        let err = DomainError::EmptyJourney;
        assert_eq!(err.to_string(), "journey must have at least one segment");
    }
}
