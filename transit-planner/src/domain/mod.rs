//! Domain types for the transit planner.
//!
//! This module contains the timetable network and the values the engine
//! produces from it. The network is validated while it is built, so code
//! that receives a [`Network`] can trust every index it holds.

mod builder;
mod error;
mod ids;
mod journey;
mod label;
mod network;
mod time;

pub use builder::NetworkBuilder;
pub use error::DomainError;
pub use ids::{
    LineIdx, ModeIdx, PatternIdx, PatternPointIdx, StopAreaIdx, StopPointIdx, TripIdx,
    ValidityPatternIdx,
};
pub use journey::{Journey, Ride, Segment, Transfer, TransferKind};
pub use label::{Label, LabelKind};
pub use network::{
    Frequency, Line, Mode, Network, Pattern, PatternPoint, StopArea, StopPoint, StopTime, Trip,
    ValidityPattern,
};
pub use time::{DateTime, SECONDS_PER_DAY};
