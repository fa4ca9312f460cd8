//! Round scanning engine.
//!
//! One `Raptor` value owns all per-query state: the label store, the scan
//! queue, the touched sets and the destination bound. The network is only
//! borrowed, so any number of engines can run against it at once.
//!
//! A query is `clear_and_init` followed by `run`. Each round scans the queued
//! patterns, then propagates continuations and footpaths from what the scan
//! improved. The loop stops after a round whose scan marked nothing.

use fixedbitset::FixedBitSet;
use tracing::{debug, trace, warn};

use crate::domain::{DateTime, Label, Network, PatternIdx, PatternPointIdx, StopTime, TripIdx};

use super::bookkeeping::{ScanQueue, Touched};
use super::bound::DestinationBound;
use super::config::RaptorConfig;
use super::direction::Direction;
use super::labels::LabelStore;
use super::search::StopAccess;
use super::trip_select::{TimetableSelector, TripSelector};

/// A round-0 origin label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    pub pattern_point: PatternPointIdx,
    pub time: DateTime,
}

/// Per-query overrides of the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    /// Only board wheelchair-accessible trips.
    pub wheelchair: bool,
    /// Pedestrian speed in m/s.
    pub walking_speed: f64,
    /// Longest footpath considered, in metres.
    pub max_walking_distance: u32,
}

impl ScanParams {
    pub fn from_config(config: &RaptorConfig) -> Self {
        Self {
            wheelchair: false,
            walking_speed: config.walking_speed,
            max_walking_distance: config.max_walking_distance,
        }
    }
}

/// The trip held while scanning one pattern.
#[derive(Debug, Clone, Copy)]
struct Held {
    trip: TripIdx,
    gap: u32,
    boarded_at: PatternPointIdx,
    /// Local zone of the boarding stop time.
    zone: Option<u32>,
    /// Instant the trip reaches the node being scanned.
    working: DateTime,
}

/// Round-based scanning engine over one network.
#[derive(Debug)]
pub struct Raptor<'a, S: TripSelector = TimetableSelector> {
    pub(super) network: &'a Network,
    pub(super) config: &'a RaptorConfig,
    selector: &'a S,
    pub(super) labels: LabelStore,
    pub(super) queue: ScanQueue,
    pub(super) touched: Touched,
    pub(super) bound: DestinationBound,
    valid_patterns: FixedBitSet,
    pub(super) params: ScanParams,
    pub(super) round: usize,
}

impl<'a> Raptor<'a> {
    /// Create an engine using the stock timetable lookup.
    pub fn new(network: &'a Network, config: &'a RaptorConfig) -> Self {
        Self::with_selector(network, config, &TimetableSelector)
    }
}

impl<'a, S: TripSelector> Raptor<'a, S> {
    /// Create an engine using a custom trip lookup.
    ///
    /// Every pattern starts out valid.
    pub fn with_selector(network: &'a Network, config: &'a RaptorConfig, selector: &'a S) -> Self {
        let mut valid_patterns = FixedBitSet::with_capacity(network.patterns().len());
        valid_patterns.insert_range(..);
        Self {
            network,
            config,
            selector,
            labels: LabelStore::new(),
            queue: ScanQueue::new(),
            touched: Touched::new(),
            bound: DestinationBound::new(),
            valid_patterns,
            params: ScanParams::from_config(config),
            round: 0,
        }
    }

    /// Restricts scanning to the patterns whose bit is set.
    ///
    /// Must be called before [`clear_and_init`](Self::clear_and_init), which
    /// only registers destinations on valid patterns.
    pub fn set_valid_patterns(&mut self, valid: FixedBitSet) {
        self.valid_patterns = valid;
    }

    pub fn valid_patterns(&self) -> &FixedBitSet {
        &self.valid_patterns
    }

    pub fn set_params(&mut self, params: ScanParams) {
        self.params = params;
    }

    pub fn params(&self) -> ScanParams {
        self.params
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    /// Resets all per-query state, then seeds origins and registers targets.
    ///
    /// Seeds beyond `bound` are dropped. A target stop point registers each
    /// of its pattern points on a valid pattern as a destination, with the
    /// stop's access time as egress.
    pub fn clear_and_init<D: Direction>(
        &mut self,
        seeds: &[Seed],
        targets: &[StopAccess],
        bound: DateTime,
    ) {
        let network = self.network;
        self.labels.reset::<D>(network);
        self.queue.reset(network.patterns().len());
        self.touched
            .reset(network.pattern_points().len(), network.stop_points().len());
        self.bound.reinit(network.pattern_points().len(), bound);
        self.round = 0;

        for seed in seeds {
            if D::better(bound, seed.time) {
                continue;
            }
            let point = network.pattern_point(seed.pattern_point);
            self.labels
                .seed::<D>(seed.pattern_point, Label::origin(seed.time));
            self.queue.mark::<D>(point.pattern, point.order);
            self.touched.mark(seed.pattern_point, point.stop_point);
        }

        for target in targets {
            for &pp in &network.stop_point(target.stop).pattern_points {
                let pattern = network.pattern_point(pp).pattern;
                if !self.valid_patterns.contains(pattern.index()) {
                    continue;
                }
                let best = D::primary(self.labels.best(pp));
                let limit = self.bound.time();
                if limit == D::worst() || D::better(limit, best) {
                    self.bound.add_destination(pp, target.access_secs);
                    if D::better(limit, best) {
                        self.labels.bound_best::<D>(pp, limit);
                    }
                }
            }
        }
    }

    /// Scans to convergence and returns the number of rounds run.
    pub fn run<D: Direction>(&mut self) -> usize {
        self.run_observed::<D>(|_, _| {})
    }

    /// Like [`run`](Self::run), calling `observe` with the store after round 0
    /// and after every later round.
    pub fn run_observed<D: Direction>(&mut self, mut observe: impl FnMut(usize, &LabelStore)) -> usize {
        self.round = 0;
        self.propagate_footpaths::<D>();
        observe(0, &self.labels);

        loop {
            if self.round >= self.config.max_rounds {
                warn!(
                    rounds = self.round,
                    queued = self.queue.queued(),
                    "round ceiling reached before convergence"
                );
                break;
            }
            self.round += 1;
            self.labels.ensure_round::<D>(self.round, self.network);
            self.touched.clear();

            let marked = self.scan_round::<D>();
            trace!(
                round = self.round,
                marked,
                touched_stops = self.touched.stop_points.count_ones(..),
                "round scanned"
            );
            if marked {
                self.propagate_continuations::<D>();
                self.propagate_footpaths::<D>();
            }
            observe(self.round, &self.labels);
            if !marked {
                break;
            }
        }

        debug!(
            clockwise = D::CLOCKWISE,
            rounds = self.round,
            reached = self.bound.is_reached(),
            "scan complete"
        );
        self.round
    }

    /// Scans every queued valid pattern once. Returns true if any node was
    /// marked for further work.
    fn scan_round<D: Direction>(&mut self) -> bool {
        let mut marked = false;
        for idx in 0..self.network.patterns().len() {
            let pattern = PatternIdx::from(idx);
            let Some(cursor) = self.queue.take(pattern) else {
                continue;
            };
            if self.valid_patterns.contains(idx) {
                marked |= self.scan_pattern::<D>(pattern, cursor);
            }
        }
        marked
    }

    fn scan_pattern<D: Direction>(&mut self, pattern: PatternIdx, cursor: usize) -> bool {
        let network = self.network;
        let k = self.round;
        let points = &network.pattern(pattern).points;
        let mut held: Option<Held> = None;
        let mut marked = false;

        for order in D::traverse(cursor, points.len()) {
            let pp = points[order];

            if let Some(h) = held.as_mut() {
                let st = network.stop_time(h.trip, order);
                h.working = D::update_working_time(h.working, st, h.gap);
                // Riding within the boarding zone does not count as a stop
                let same_zone = h.zone.is_some() && h.zone == st.local_zone;
                if !same_zone {
                    marked |= self.store::<D>(pp, h, st);
                }
            }

            let previous = self.labels.get(k - 1, pp);
            if !previous.is_initialized() {
                continue;
            }
            let ready = D::primary(previous);

            // A held trip leaving before we are ready cannot be beaten here
            let worth_checking = held.is_none_or(|h| {
                let st = network.stop_time(h.trip, order);
                !D::better(D::boarding_time(h.working, st, h.gap), ready)
            });
            if !worth_checking {
                continue;
            }

            let Some(boarding) = D::select_trip(
                self.selector,
                network,
                pattern,
                order,
                ready,
                self.params.wheelchair,
            ) else {
                continue;
            };
            let st = network.stop_time(boarding.trip, order);
            let boarding_time = D::boarding_time(ready, st, boarding.gap);
            // The same trip on an earlier service day is a different instance
            let switch = held.is_none_or(|h| {
                h.trip != boarding.trip
                    || h.gap != boarding.gap
                    || D::better(
                        boarding_time,
                        D::boarding_time(h.working, network.stop_time(h.trip, order), h.gap),
                    )
            });
            if switch {
                held = Some(Held {
                    trip: boarding.trip,
                    gap: boarding.gap,
                    boarded_at: pp,
                    zone: st.local_zone,
                    working: boarding_time,
                });
            }
        }
        marked
    }

    /// Records the held trip reaching `pp`. Returns true if the node was
    /// marked touched.
    fn store<D: Direction>(&mut self, pp: PatternPointIdx, held: &Held, st: &StopTime) -> bool {
        if !D::can_alight(st) {
            return false;
        }
        let k = self.round;
        let limit = self.limit::<D>(pp);

        if D::better(held.working, limit) {
            let label = D::trip_label(held.working, st, held.gap, held.boarded_at, held.trip);
            self.labels.write::<D>(k, pp, label);
            if !self.bound.consider::<D>(pp, &label, k) {
                let stop = self.network.pattern_point(pp).stop_point;
                self.touched.mark(pp, stop);
                return true;
            }
        } else if held.working == limit && !self.labels.get(k - 1, pp).is_initialized() {
            // Ties only count when they settle a destination
            let label = D::trip_label(held.working, st, held.gap, held.boarded_at, held.trip);
            if self.bound.consider::<D>(pp, &label, k) {
                self.labels.write::<D>(k, pp, label);
            }
        }
        false
    }

    /// The value a new label at `pp` has to beat.
    fn limit<D: Direction>(&self, pp: PatternPointIdx) -> DateTime {
        let best = D::primary(self.labels.best(pp));
        if !self.config.global_pruning || D::better(best, self.bound.time()) {
            best
        } else {
            self.bound.time()
        }
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn bound(&self) -> &DestinationBound {
        &self.bound
    }

    /// Rounds run by the last [`run`](Self::run).
    pub fn rounds(&self) -> usize {
        self.round
    }

    /// First round whose label at `pp` is the Best-Label, if `pp` was reached.
    pub fn best_round(&self, pp: PatternPointIdx) -> Option<usize> {
        let best = self.labels.best(pp);
        if !best.is_initialized() {
            return None;
        }
        self.labels
            .rounds()
            .iter()
            .position(|round| round[pp.index()] == *best)
    }
}
