//! Query orchestration.
//!
//! Turns a request into engine passes. A point-to-point search runs a first
//! pass in the request's direction to find the best reachable time, then
//! tightens each Pareto-optimal answer with a pass in the opposite direction,
//! which keeps the arrival and departs as late as possible (or the mirror for
//! arrive-by searches).

use tracing::{debug, warn};

use crate::domain::{DateTime, Journey, Network, PatternPointIdx, StopAreaIdx, StopPointIdx};

use super::bound::DestinationBound;
use super::config::RaptorConfig;
use super::direction::{Backward, Direction, Forward};
use super::engine::{Raptor, ScanParams, Seed};
use super::labels::LabelStore;
use super::rank::{deduplicate, rank_journeys, remove_dominated};
use super::reconstruct::reconstruct;
use super::trip_select::{TimetableSelector, TripSelector};
use super::validity::{Forbidden, valid_patterns};

/// Error from journey search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Forbidden filter key other than line, journey_pattern or mode
    #[error("unknown forbidden key: {0}")]
    UnknownForbiddenKey(String),
}

/// A stop point and the time to walk between it and the traveller's
/// actual origin or destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopAccess {
    pub stop: StopPointIdx,
    pub access_secs: u32,
}

impl StopAccess {
    pub fn new(stop: StopPointIdx, access_secs: u32) -> Self {
        Self { stop, access_secs }
    }

    /// The stop itself, reached at no cost.
    pub fn at(stop: StopPointIdx) -> Self {
        Self::new(stop, 0)
    }
}

/// Request for journey search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub origins: Vec<StopAccess>,
    pub destinations: Vec<StopAccess>,

    /// True to depart at the query time, false to arrive by it.
    pub clockwise: bool,

    /// Latest arrival (or earliest departure for arrive-by searches) worth
    /// returning.
    pub bound: Option<DateTime>,

    /// Only board wheelchair-accessible trips.
    pub wheelchair: bool,

    /// Overrides the configured walking speed (m/s).
    pub walking_speed: Option<f64>,

    /// Overrides the configured maximum walking distance (metres).
    pub max_walking_distance: Option<u32>,

    pub forbidden: Forbidden,
}

impl SearchRequest {
    /// A depart-at request with default walking parameters and no filters.
    pub fn new(origins: Vec<StopAccess>, destinations: Vec<StopAccess>) -> Self {
        Self {
            origins,
            destinations,
            clockwise: true,
            bound: None,
            wheelchair: false,
            walking_speed: None,
            max_walking_distance: None,
            forbidden: Forbidden::none(),
        }
    }

    /// Treat the query time as an arrive-by time.
    pub fn arrive_by(mut self) -> Self {
        self.clockwise = false;
        self
    }

    pub fn with_bound(mut self, bound: DateTime) -> Self {
        self.bound = Some(bound);
        self
    }

    pub fn with_wheelchair(mut self, wheelchair: bool) -> Self {
        self.wheelchair = wheelchair;
        self
    }

    pub fn with_walking(mut self, speed: f64, max_distance: u32) -> Self {
        self.walking_speed = Some(speed);
        self.max_walking_distance = Some(max_distance);
        self
    }

    pub fn with_forbidden(mut self, forbidden: Forbidden) -> Self {
        self.forbidden = forbidden;
        self
    }

    /// Validate the search request against `network`.
    pub fn validate(&self, network: &Network) -> Result<(), SearchError> {
        self.validate_origins(network)?;
        if self.destinations.is_empty() {
            return Err(SearchError::InvalidRequest(
                "no destination stop points".to_string(),
            ));
        }
        check_stops(network, &self.destinations)
    }

    /// Validate everything but the destinations, which isochrones ignore.
    pub fn validate_origins(&self, network: &Network) -> Result<(), SearchError> {
        if self.origins.is_empty() {
            return Err(SearchError::InvalidRequest(
                "no origin stop points".to_string(),
            ));
        }
        check_stops(network, &self.origins)?;

        if let Some(speed) = self.walking_speed {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(SearchError::InvalidRequest(format!(
                    "walking speed must be positive, got {speed}"
                )));
            }
        }
        Ok(())
    }

    fn params(&self, config: &RaptorConfig) -> ScanParams {
        ScanParams {
            wheelchair: self.wheelchair,
            walking_speed: self.walking_speed.unwrap_or(config.walking_speed),
            max_walking_distance: self
                .max_walking_distance
                .unwrap_or(config.max_walking_distance),
        }
    }
}

fn check_stops(network: &Network, stops: &[StopAccess]) -> Result<(), SearchError> {
    let count = network.stop_points().len();
    match stops.iter().find(|access| access.stop.index() >= count) {
        Some(access) => Err(SearchError::InvalidRequest(format!(
            "unknown stop point {}",
            access.stop
        ))),
        None => Ok(()),
    }
}

/// Result of journey search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Found journeys; empty when the destination is unreachable.
    pub journeys: Vec<Journey>,

    /// Rounds run by the first passes.
    pub rounds: usize,
}

impl SearchResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            journeys: Vec::new(),
            rounds: 0,
        }
    }
}

/// Best reachable times from a set of origins.
///
/// Times are departures for an arrive-by isochrone and arrivals otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isochrone {
    clockwise: bool,
    times: Vec<Option<DateTime>>,
    stop_times: Vec<Option<DateTime>>,
}

impl Isochrone {
    fn from_labels<D: Direction>(network: &Network, labels: &LabelStore, limit: DateTime) -> Self {
        let times: Vec<Option<DateTime>> = labels
            .best_labels()
            .iter()
            .map(|label| {
                let time = D::primary(label);
                (label.is_initialized() && !D::better(limit, time)).then_some(time)
            })
            .collect();

        let stop_times = network
            .stop_points()
            .iter()
            .map(|stop| {
                stop.pattern_points
                    .iter()
                    .filter_map(|pp| times[pp.index()])
                    .reduce(|a, b| if D::better(b, a) { b } else { a })
            })
            .collect();

        Self {
            clockwise: D::CLOCKWISE,
            times,
            stop_times,
        }
    }

    /// True for a depart-at isochrone.
    pub fn is_clockwise(&self) -> bool {
        self.clockwise
    }

    /// Best time at `pp`, or `None` if it cannot be reached.
    pub fn time(&self, pp: PatternPointIdx) -> Option<DateTime> {
        self.times.get(pp.index()).copied().flatten()
    }

    /// Per pattern point times, indexed by [`PatternPointIdx`].
    pub fn times(&self) -> &[Option<DateTime>] {
        &self.times
    }

    /// Best time over all pattern points of `stop`.
    pub fn stop_time(&self, stop: StopPointIdx) -> Option<DateTime> {
        self.stop_times.get(stop.index()).copied().flatten()
    }

    /// Every reachable pattern point with its time.
    pub fn reachable(&self) -> impl Iterator<Item = (PatternPointIdx, DateTime)> + '_ {
        self.times
            .iter()
            .enumerate()
            .filter_map(|(idx, time)| time.map(|t| (PatternPointIdx::from(idx), t)))
    }

    pub fn reachable_count(&self) -> usize {
        self.times.iter().filter(|t| t.is_some()).count()
    }
}

/// Round-0 seeds for every pattern point of the given stops.
fn seeds_for<D: Direction>(network: &Network, stops: &[StopAccess], datetime: DateTime) -> Vec<Seed> {
    stops
        .iter()
        .flat_map(|access| {
            let time = D::combine(datetime, access.access_secs);
            network
                .stop_point(access.stop)
                .pattern_points
                .iter()
                .map(move |&pattern_point| Seed {
                    pattern_point,
                    time,
                })
        })
        .collect()
}

/// Seeds for the tightening passes: for each round whose best target value,
/// egress included, beats every earlier round, the node holding it.
fn pareto_seeds<D: Direction>(
    network: &Network,
    labels: &LabelStore,
    bound: &DestinationBound,
    targets: &[StopAccess],
) -> Vec<Seed> {
    let nodes: Vec<(PatternPointIdx, u32)> = targets
        .iter()
        .flat_map(|access| network.stop_point(access.stop).pattern_points.iter())
        .filter_map(|&pp| bound.egress(pp).map(|egress| (pp, egress)))
        .collect();

    let mut seeds = Vec::new();
    let mut best = D::worst();
    for round in labels.rounds() {
        let mut round_best: Option<(Seed, DateTime)> = None;
        for &(pp, egress) in &nodes {
            let label = &round[pp.index()];
            if !label.is_initialized() {
                continue;
            }
            let time = D::primary(label);
            let total = D::combine(time, egress);
            if round_best.is_none_or(|(_, current)| D::better(total, current)) {
                round_best = Some((
                    Seed {
                        pattern_point: pp,
                        time,
                    },
                    total,
                ));
            }
        }
        if let Some((seed, total)) = round_best {
            if D::better(total, best) {
                best = total;
                seeds.push(seed);
            }
        }
    }
    seeds
}

/// Journey planner over one network.
///
/// Each call builds its own engine, so a planner can be shared freely.
#[derive(Debug, Clone)]
pub struct Planner<'a, S: TripSelector = TimetableSelector> {
    network: &'a Network,
    config: &'a RaptorConfig,
    selector: S,
}

impl<'a> Planner<'a> {
    /// Create a new planner using the stock timetable lookup.
    pub fn new(network: &'a Network, config: &'a RaptorConfig) -> Self {
        Self::with_selector(network, config, TimetableSelector)
    }
}

impl<'a, S: TripSelector> Planner<'a, S> {
    pub fn with_selector(network: &'a Network, config: &'a RaptorConfig, selector: S) -> Self {
        Self {
            network,
            config,
            selector,
        }
    }

    /// Engine with the request's parameters and the patterns valid on `days`.
    fn engine(&self, request: &SearchRequest, days: &[u32]) -> Raptor<'_, S> {
        let mut engine = Raptor::with_selector(self.network, self.config, &self.selector);
        engine.set_valid_patterns(valid_patterns(self.network, days, &request.forbidden));
        engine.set_params(request.params(self.config));
        engine
    }

    /// Point-to-point search between two stop areas.
    ///
    /// Every stop point of either area is reached at no cost, and walking
    /// uses the configured defaults.
    pub fn compute(
        &self,
        origin: StopAreaIdx,
        destination: StopAreaIdx,
        datetime: DateTime,
        clockwise: bool,
        wheelchair: bool,
    ) -> Result<SearchResult, SearchError> {
        let origins = self.area_stops(origin)?;
        let destinations = self.area_stops(destination)?;
        let mut request = SearchRequest::new(origins, destinations).with_wheelchair(wheelchair);
        if !clockwise {
            request = request.arrive_by();
        }
        self.compute_all(&request, datetime)
    }

    fn area_stops(&self, area: StopAreaIdx) -> Result<Vec<StopAccess>, SearchError> {
        let Some(area) = self.network.stop_areas().get(area.index()) else {
            return Err(SearchError::InvalidRequest(format!(
                "unknown stop area {area}"
            )));
        };
        Ok(area.stop_points.iter().copied().map(StopAccess::at).collect())
    }

    /// Search for journeys at one query time.
    ///
    /// Returns one journey per Pareto-optimal round of the first pass: the
    /// fastest answer plus any slower one that needs fewer boardings.
    pub fn compute_all(
        &self,
        request: &SearchRequest,
        datetime: DateTime,
    ) -> Result<SearchResult, SearchError> {
        request.validate(self.network)?;
        let mut engine = self.engine(request, &[datetime.day()]);

        let (journeys, rounds) = if request.clockwise {
            self.two_pass::<Forward>(
                &mut engine,
                &request.origins,
                &request.destinations,
                datetime,
                request.bound,
            )
        } else {
            self.two_pass::<Backward>(
                &mut engine,
                &request.destinations,
                &request.origins,
                datetime,
                request.bound,
            )
        };

        let journeys = deduplicate(journeys);
        debug!(
            journeys = journeys.len(),
            rounds,
            clockwise = request.clockwise,
            "search complete"
        );
        Ok(SearchResult { journeys, rounds })
    }

    /// Search once per query time, keeping one journey per reachable time.
    ///
    /// Times are processed in travel order: ascending for depart-at,
    /// descending for arrive-by. Each journey records the time it answers.
    ///
    /// One engine and one validity pass serve every time. Labels are cleared
    /// before each pass, since Best-Labels from an earlier depart-at time
    /// would hide the later journeys.
    pub fn compute_departures(
        &self,
        request: &SearchRequest,
        datetimes: &[DateTime],
    ) -> Result<SearchResult, SearchError> {
        request.validate(self.network)?;
        if datetimes.is_empty() {
            return Ok(SearchResult::empty());
        }

        let mut times = datetimes.to_vec();
        times.sort_unstable();
        times.dedup();
        if !request.clockwise {
            times.reverse();
        }
        let mut days: Vec<u32> = times.iter().map(|t| t.day()).collect();
        days.sort_unstable();
        days.dedup();

        let mut engine = self.engine(request, &days);
        let mut journeys = Vec::new();
        let mut rounds = 0;
        for &datetime in &times {
            let (journey, pass_rounds) = if request.clockwise {
                self.best_pass::<Forward>(
                    &mut engine,
                    &request.origins,
                    &request.destinations,
                    datetime,
                    request.bound,
                )
            } else {
                self.best_pass::<Backward>(
                    &mut engine,
                    &request.destinations,
                    &request.origins,
                    datetime,
                    request.bound,
                )
            };
            rounds += pass_rounds;
            journeys.extend(journey.map(|j| j.with_request_time(datetime)));
        }

        debug!(
            departures = times.len(),
            journeys = journeys.len(),
            "multi-departure search complete"
        );
        Ok(SearchResult { journeys, rounds })
    }

    /// Profile search: one search per query time, then the non-dominated,
    /// distinct journeys ranked best-first.
    pub fn profile(
        &self,
        request: &SearchRequest,
        datetimes: &[DateTime],
    ) -> Result<SearchResult, SearchError> {
        let SearchResult { journeys, rounds } = self.compute_departures(request, datetimes)?;
        let journeys = rank_journeys(remove_dominated(deduplicate(journeys)));
        Ok(SearchResult { journeys, rounds })
    }

    /// Best times from the request's origins to every node.
    ///
    /// Destinations are ignored. The request bound, if any, is a time limit:
    /// nothing reached beyond it is reported.
    pub fn isochrone(
        &self,
        request: &SearchRequest,
        datetime: DateTime,
    ) -> Result<Isochrone, SearchError> {
        request.validate_origins(self.network)?;
        let mut engine = self.engine(request, &[datetime.day()]);
        let isochrone = if request.clockwise {
            self.reach::<Forward>(&mut engine, &request.origins, datetime, request.bound)
        } else {
            self.reach::<Backward>(&mut engine, &request.origins, datetime, request.bound)
        };
        Ok(isochrone)
    }

    fn reach<D: Direction>(
        &self,
        engine: &mut Raptor<'_, S>,
        origins: &[StopAccess],
        datetime: DateTime,
        limit: Option<DateTime>,
    ) -> Isochrone {
        let limit = limit.unwrap_or(D::worst());
        let seeds = seeds_for::<D>(self.network, origins, datetime);
        engine.clear_and_init::<D>(&seeds, &[], limit);
        let rounds = engine.run::<D>();

        let isochrone = Isochrone::from_labels::<D>(self.network, engine.labels(), limit);
        debug!(
            rounds,
            reachable = isochrone.reachable_count(),
            "isochrone complete"
        );
        isochrone
    }

    /// Scans from `from` towards `to`. Returns the rounds run.
    fn first_pass<D: Direction>(
        &self,
        engine: &mut Raptor<'_, S>,
        from: &[StopAccess],
        to: &[StopAccess],
        datetime: DateTime,
        bound: Option<DateTime>,
    ) -> usize {
        let seeds = seeds_for::<D>(self.network, from, datetime);
        engine.clear_and_init::<D>(&seeds, to, bound.unwrap_or(D::worst()));
        engine.run::<D>()
    }

    /// First pass, then one tightening pass per Pareto-optimal round.
    fn two_pass<D: Direction>(
        &self,
        engine: &mut Raptor<'_, S>,
        from: &[StopAccess],
        to: &[StopAccess],
        datetime: DateTime,
        bound: Option<DateTime>,
    ) -> (Vec<Journey>, usize) {
        let rounds = self.first_pass::<D>(engine, from, to, datetime, bound);
        if !engine.bound().is_reached() {
            debug!(rounds, "destination unreachable");
            return (Vec::new(), rounds);
        }

        let seeds = pareto_seeds::<D>(self.network, engine.labels(), engine.bound(), to);
        let journeys = seeds
            .into_iter()
            .filter_map(|seed| self.tighten::<D::Reverse>(engine, seed, from, datetime))
            .collect();
        (journeys, rounds)
    }

    /// First pass, then one tightening pass from the bound's node.
    fn best_pass<D: Direction>(
        &self,
        engine: &mut Raptor<'_, S>,
        from: &[StopAccess],
        to: &[StopAccess],
        datetime: DateTime,
        bound: Option<DateTime>,
    ) -> (Option<Journey>, usize) {
        let rounds = self.first_pass::<D>(engine, from, to, datetime, bound);
        let Some(reached) = engine.bound().reached() else {
            return (None, rounds);
        };
        let seed = Seed {
            pattern_point: reached.node,
            time: D::primary(&reached.label),
        };
        (self.tighten::<D::Reverse>(engine, seed, from, datetime), rounds)
    }

    /// Scans back from one reached node to the first pass's origins, bounded
    /// by the query time, and rebuilds the journey.
    fn tighten<R: Direction>(
        &self,
        engine: &mut Raptor<'_, S>,
        seed: Seed,
        origins: &[StopAccess],
        datetime: DateTime,
    ) -> Option<Journey> {
        engine.clear_and_init::<R>(&[seed], origins, datetime);
        engine.run::<R>();

        let reached = engine.bound().reached()?;
        match reconstruct::<R>(self.network, engine.labels(), reached.node, reached.round) {
            Ok(journey) => Some(journey),
            Err(err) => {
                warn!(node = %reached.node, round = reached.round, error = %err, "journey reconstruction failed");
                None
            }
        }
    }
}
