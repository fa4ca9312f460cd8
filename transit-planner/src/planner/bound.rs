//! Destination bound.
//!
//! The best value found so far over all requested destination pattern
//! points. It prunes partial labels that cannot beat it and tells the engine
//! when a destination no longer needs exploring.

use crate::domain::{DateTime, Label, PatternPointIdx};

use super::direction::Direction;

/// The destination node that currently holds the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reached {
    pub node: PatternPointIdx,
    pub label: Label,
    pub round: usize,
}

/// Evolving best answer over the destination set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationBound {
    /// Egress seconds per pattern point; `None` for non-destinations.
    egress: Vec<Option<u32>>,
    time: DateTime,
    round: usize,
    reached: Option<Reached>,
}

impl Default for DestinationBound {
    fn default() -> Self {
        Self {
            egress: Vec::new(),
            time: DateTime::INF,
            round: usize::MAX,
            reached: None,
        }
    }
}

impl DestinationBound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all destinations and restarts from `bound`.
    pub fn reinit(&mut self, pattern_points: usize, bound: DateTime) {
        self.egress.clear();
        self.egress.resize(pattern_points, None);
        self.time = bound;
        self.round = usize::MAX;
        self.reached = None;
    }

    /// Registers `pp` as a destination reached with `egress` extra seconds.
    ///
    /// A pattern point registered twice keeps the cheaper egress.
    pub fn add_destination(&mut self, pp: PatternPointIdx, egress: u32) {
        let slot = &mut self.egress[pp.index()];
        *slot = Some(slot.map_or(egress, |e| e.min(egress)));
    }

    pub fn is_destination(&self, pp: PatternPointIdx) -> bool {
        self.egress.get(pp.index()).is_some_and(Option::is_some)
    }

    pub fn egress(&self, pp: PatternPointIdx) -> Option<u32> {
        self.egress.get(pp.index()).copied().flatten()
    }

    /// Offers a candidate label found in `round`.
    ///
    /// Accepted if `pp` is a destination and its time, egress included,
    /// beats the bound, or equals it in fewer rounds. Returns whether the
    /// candidate became the new bound.
    pub fn consider<D: Direction>(&mut self, pp: PatternPointIdx, label: &Label, round: usize) -> bool {
        let Some(egress) = self.egress(pp) else {
            return false;
        };
        let time = D::primary(label);
        if time == D::worst() {
            return false;
        }
        let candidate = D::combine(time, egress);
        if D::better(candidate, self.time) || (candidate == self.time && round < self.round) {
            self.time = candidate;
            self.round = round;
            self.reached = Some(Reached {
                node: pp,
                label: *label,
                round,
            });
            true
        } else {
            false
        }
    }

    /// Current bound value, egress included.
    pub fn time(&self) -> DateTime {
        self.time
    }

    /// Round in which the bound was last improved.
    pub fn round(&self) -> Option<usize> {
        self.reached.map(|r| r.round)
    }

    /// The destination holding the bound, if any destination was reached.
    pub fn reached(&self) -> Option<&Reached> {
        self.reached.as_ref()
    }

    pub fn is_reached(&self) -> bool {
        self.reached.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LabelKind;
    use crate::planner::direction::{Backward, Forward};

    fn t(secs: u32) -> DateTime {
        DateTime::new(0, secs)
    }

    fn at(secs: u32) -> Label {
        Label::transfer(t(secs), PatternPointIdx(0), LabelKind::Connection)
    }

    #[test]
    fn ignores_non_destinations() {
        let mut bound = DestinationBound::new();
        bound.reinit(3, DateTime::INF);
        bound.add_destination(PatternPointIdx(2), 0);

        assert!(!bound.consider::<Forward>(PatternPointIdx(1), &at(100), 1));
        assert!(!bound.is_reached());
        assert!(bound.consider::<Forward>(PatternPointIdx(2), &at(100), 1));
        assert_eq!(bound.reached().map(|r| r.node), Some(PatternPointIdx(2)));
        assert_eq!(bound.time(), t(100));
    }

    #[test]
    fn egress_is_added() {
        let mut bound = DestinationBound::new();
        bound.reinit(2, DateTime::INF);
        bound.add_destination(PatternPointIdx(0), 300);
        bound.add_destination(PatternPointIdx(1), 0);

        assert!(bound.consider::<Forward>(PatternPointIdx(0), &at(100), 1));
        assert_eq!(bound.time(), t(400));

        // 350 with no egress beats 100 + 300
        assert!(bound.consider::<Forward>(PatternPointIdx(1), &at(350), 2));
        assert_eq!(bound.time(), t(350));
    }

    #[test]
    fn ties_need_fewer_rounds() {
        let mut bound = DestinationBound::new();
        bound.reinit(1, DateTime::INF);
        bound.add_destination(PatternPointIdx(0), 0);

        assert!(bound.consider::<Forward>(PatternPointIdx(0), &at(500), 2));
        assert!(!bound.consider::<Forward>(PatternPointIdx(0), &at(500), 3));
        assert!(!bound.consider::<Forward>(PatternPointIdx(0), &at(500), 2));
        assert!(bound.consider::<Forward>(PatternPointIdx(0), &at(500), 1));
        assert_eq!(bound.round(), Some(1));
    }

    #[test]
    fn initial_bound_limits_candidates() {
        let mut bound = DestinationBound::new();
        bound.reinit(1, t(1000));
        bound.add_destination(PatternPointIdx(0), 0);

        assert!(!bound.consider::<Forward>(PatternPointIdx(0), &at(1001), 1));
        // A tie with the initial bound is accepted
        assert!(bound.consider::<Forward>(PatternPointIdx(0), &at(1000), 1));
    }

    #[test]
    fn backward_prefers_later() {
        let mut bound = DestinationBound::new();
        bound.reinit(1, DateTime::MIN);
        bound.add_destination(PatternPointIdx(0), 60);

        assert!(bound.consider::<Backward>(PatternPointIdx(0), &at(1000), 1));
        assert_eq!(bound.time(), t(940));
        assert!(!bound.consider::<Backward>(PatternPointIdx(0), &at(900), 2));
        assert!(bound.consider::<Backward>(PatternPointIdx(0), &at(1200), 2));
    }

    #[test]
    fn duplicate_destination_keeps_cheaper_egress() {
        let mut bound = DestinationBound::new();
        bound.reinit(1, DateTime::INF);
        bound.add_destination(PatternPointIdx(0), 120);
        bound.add_destination(PatternPointIdx(0), 30);

        assert_eq!(bound.egress(PatternPointIdx(0)), Some(30));
        assert!(bound.is_destination(PatternPointIdx(0)));
    }
}
