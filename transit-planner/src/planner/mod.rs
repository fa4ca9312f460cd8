//! Round-based journey planner.
//!
//! This module implements the scanning engine that answers: "what is the
//! earliest I can reach these stops from those, and how?" (or the latest I
//! can leave to arrive by a given time).
//!
//! Each round allows one more vehicle boarding. A round scans every pattern
//! that improved last round, then spreads the improvements over
//! continuations and footpaths. The loop stops once a round improves
//! nothing.

mod bookkeeping;
mod bound;
mod config;
mod direction;
mod engine;
mod labels;
mod propagation;
mod rank;
mod reconstruct;
mod search;
mod trip_select;
mod validity;

#[cfg(test)]
mod test_support;

pub use bookkeeping::{ScanQueue, Touched};
pub use bound::{DestinationBound, Reached};
pub use config::{ConfigError, RaptorConfig};
pub use direction::{Backward, Direction, Forward};
pub use engine::{Raptor, ScanParams, Seed};
pub use labels::LabelStore;
pub use propagation::WalkScale;
pub use rank::{deduplicate, rank_journeys, remove_dominated};
pub use reconstruct::reconstruct;
pub use search::{Isochrone, Planner, SearchError, SearchRequest, SearchResult, StopAccess};
pub use trip_select::{Boarding, TimetableSelector, TripSelector};
pub use validity::{Forbidden, valid_patterns};
