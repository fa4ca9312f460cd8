//! Scan labels.
//!
//! A `Label` is the engine's knowledge about one pattern point in one round:
//! when it can be reached, and how. Labels are plain `Copy` values so that
//! per-round vectors can be cloned from a template in one allocation.

use super::{DateTime, PatternPointIdx, TripIdx};

/// How a label was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LabelKind {
    /// Never reached
    #[default]
    Uninitialized,
    /// Seeded from a query origin
    Origin,
    /// Reached on board a trip
    Trip,
    /// Reached by a platform change or a footpath
    Connection,
    /// Reached by staying on a vehicle that continues as another pattern
    Extension,
    /// Reached by a held, guaranteed connection
    Guarantee,
}

/// Per-round state of a pattern point.
///
/// `boarding` points at the pattern point the label came from: the node the
/// trip was boarded at for [`LabelKind::Trip`], or the source node for the
/// connection kinds. `gap` is the resolved headway offset of a frequency trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub arrival: DateTime,
    pub departure: DateTime,
    pub boarding: Option<PatternPointIdx>,
    pub trip: Option<TripIdx>,
    pub kind: LabelKind,
    pub gap: u32,
}

impl Label {
    /// An unreached label holding `worst` in both time fields.
    pub fn uninitialized(worst: DateTime) -> Self {
        Self {
            arrival: worst,
            departure: worst,
            boarding: None,
            trip: None,
            kind: LabelKind::Uninitialized,
            gap: 0,
        }
    }

    /// A label seeded at a query origin.
    pub fn origin(time: DateTime) -> Self {
        Self {
            arrival: time,
            departure: time,
            boarding: None,
            trip: None,
            kind: LabelKind::Origin,
            gap: 0,
        }
    }

    /// A label reached from `source` by a transfer of the given kind.
    pub fn transfer(time: DateTime, source: PatternPointIdx, kind: LabelKind) -> Self {
        Self {
            arrival: time,
            departure: time,
            boarding: Some(source),
            trip: None,
            kind,
            gap: 0,
        }
    }

    /// Returns true unless the label is still uninitialized.
    pub fn is_initialized(&self) -> bool {
        self.kind != LabelKind::Uninitialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_holds_worst() {
        let label = Label::uninitialized(DateTime::INF);
        assert!(!label.is_initialized());
        assert_eq!(label.arrival, DateTime::INF);
        assert_eq!(label.departure, DateTime::INF);
        assert_eq!(label.boarding, None);
    }

    #[test]
    fn transfer_records_source() {
        let label = Label::transfer(
            DateTime::new(0, 8300),
            PatternPointIdx(1),
            LabelKind::Connection,
        );
        assert!(label.is_initialized());
        assert_eq!(label.boarding, Some(PatternPointIdx(1)));
        assert_eq!(label.kind, LabelKind::Connection);
    }
}
