//! Transfer and extension propagation.
//!
//! After each pattern scan, arrivals spread over two kinds of secondary
//! edges. Continuations fire only off a vehicle arrival and reach one
//! pattern point. Footpaths start from the best vehicle arrival at a stop and
//! reach every pattern point of the co-located and neighbouring stops.

use crate::connections::ContinuationKind;
use crate::domain::{DateTime, Label, LabelKind, PatternPointIdx, StopPointIdx};

use super::direction::Direction;
use super::engine::Raptor;
use super::trip_select::TripSelector;

/// Rescales stored footpath durations to the requested walking speed.
///
/// Speeds are compared at millimetre-per-second resolution so that equal
/// speeds give back the stored duration exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkScale {
    reference_mm: u64,
    walking_mm: u64,
    max_distance_mm: u64,
}

impl WalkScale {
    pub fn new(reference_speed: f64, walking_speed: f64, max_walking_distance: u32) -> Self {
        let to_mm = |speed: f64| ((speed * 1000.0).round() as u64).max(1);
        Self {
            reference_mm: to_mm(reference_speed),
            walking_mm: to_mm(walking_speed),
            max_distance_mm: u64::from(max_walking_distance) * 1000,
        }
    }

    /// Walking time for a footpath stored as `duration` seconds, or `None`
    /// if it is longer than the maximum walking distance.
    pub fn secs(&self, duration: u32) -> Option<u32> {
        let distance = u64::from(duration) * self.reference_mm;
        if distance > self.max_distance_mm {
            return None;
        }
        u32::try_from(distance.div_ceil(self.walking_mm)).ok()
    }
}

impl<S: TripSelector> Raptor<'_, S> {
    /// Relaxes footpaths from every stop touched in the current round.
    pub(super) fn propagate_footpaths<D: Direction>(&mut self) {
        let network = self.network;
        let min_transfer = self.config.min_transfer_secs;
        let walk = WalkScale::new(
            self.config.footpath_reference_speed,
            self.params.walking_speed,
            self.params.max_walking_distance,
        );
        let stops: Vec<StopPointIdx> = self
            .touched
            .stop_points
            .ones()
            .map(StopPointIdx::from)
            .collect();

        for stop in stops {
            let served = &network.stop_point(stop).pattern_points;
            let Some((source, time)) = self.best_arrival::<D>(served) else {
                continue;
            };

            let changed = D::combine(time, min_transfer);
            for &pp in served {
                if pp != source && self.improves::<D>(pp, changed) {
                    self.relax::<D>(pp, Label::transfer(changed, source, LabelKind::Connection));
                }
            }

            // Edges are sorted by duration, so equal durations are adjacent
            let mut last: Option<(u32, DateTime)> = None;
            for footpath in D::footpaths(network.connections()).from_node(stop.index()) {
                let reached = match last {
                    Some((duration, reached)) if duration == footpath.duration => reached,
                    _ => {
                        let Some(secs) = walk.secs(footpath.duration) else {
                            break;
                        };
                        let reached = D::combine(time, secs);
                        last = Some((footpath.duration, reached));
                        reached
                    }
                };
                for &pp in &network.stop_point(footpath.to).pattern_points {
                    if self.accepts::<D>(pp, reached) {
                        self.relax::<D>(pp, Label::transfer(reached, source, LabelKind::Connection));
                    }
                }
            }
        }
    }

    /// Relaxes extensions and guarantees from vehicle arrivals of the
    /// current round.
    pub(super) fn propagate_continuations<D: Direction>(&mut self) {
        let network = self.network;
        let k = self.round;
        let arrived: Vec<PatternPointIdx> = self
            .touched
            .pattern_points
            .ones()
            .map(PatternPointIdx::from)
            .collect();

        for from in arrived {
            let label = *self.labels.get(k, from);
            if label.kind != LabelKind::Trip {
                continue;
            }
            let time = D::primary(&label);
            for edge in D::continuations(network.connections()).from_node(from.index()) {
                let reached = D::combine(time, edge.duration);
                if !D::better(reached, D::primary(self.labels.best(edge.to))) {
                    continue;
                }
                if self.pruned::<D>(reached) {
                    continue;
                }
                let kind = match edge.kind {
                    ContinuationKind::Extension => LabelKind::Extension,
                    ContinuationKind::Guarantee => LabelKind::Guarantee,
                };
                let next = Label::transfer(reached, from, kind);
                self.labels.write::<D>(k, edge.to, next);
                if !self.bound.consider::<D>(edge.to, &next, k) {
                    self.touched.mark_pattern_point(edge.to);
                    let point = network.pattern_point(edge.to);
                    self.queue.mark::<D>(point.pattern, point.order);
                }
            }
        }
    }

    /// Best trip or origin label among `served` in the current round.
    fn best_arrival<D: Direction>(
        &self,
        served: &[PatternPointIdx],
    ) -> Option<(PatternPointIdx, DateTime)> {
        let mut best: Option<(PatternPointIdx, DateTime)> = None;
        for &pp in served {
            let label = self.labels.get(self.round, pp);
            if !matches!(label.kind, LabelKind::Trip | LabelKind::Origin) {
                continue;
            }
            let time = D::primary(label);
            if best.is_none_or(|(_, current)| D::better(time, current)) {
                best = Some((pp, time));
            }
        }
        best
    }

    /// Is `time` strictly worse than the destination bound?
    fn pruned<D: Direction>(&self, time: DateTime) -> bool {
        self.config.global_pruning && D::better(self.bound.time(), time)
    }

    /// Does `time` strictly beat the Best-Label at `pp`?
    fn improves<D: Direction>(&self, pp: PatternPointIdx, time: DateTime) -> bool {
        time != D::worst()
            && !self.pruned::<D>(time)
            && D::better(time, D::primary(self.labels.best(pp)))
    }

    /// Would a footpath reaching `pp` at `time` improve it?
    ///
    /// Ties with the Best-Label are accepted while the node has no label in
    /// the current round.
    fn accepts<D: Direction>(&self, pp: PatternPointIdx, time: DateTime) -> bool {
        if time == D::worst() || self.pruned::<D>(time) {
            return false;
        }
        let best = D::primary(self.labels.best(pp));
        D::better(time, best)
            || (time == best && !self.labels.get(self.round, pp).is_initialized())
    }

    /// Writes a transfer label and queues its pattern unless it settled the
    /// destination bound.
    fn relax<D: Direction>(&mut self, pp: PatternPointIdx, label: Label) {
        let k = self.round;
        self.labels.write::<D>(k, pp, label);
        if !self.bound.consider::<D>(pp, &label, k) {
            let point = self.network.pattern_point(pp);
            self.queue.mark::<D>(point.pattern, point.order);
        }
    }
}
