//! Public-transit journey planner.
//!
//! A library that answers: "given where I am and when, how do I get there
//! as early as possible?" over a timetabled network of trips and footpaths.

pub mod connections;
pub mod domain;
pub mod planner;
