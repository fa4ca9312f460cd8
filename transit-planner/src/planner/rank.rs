//! Journey ranking for profile results.
//!
//! A profile search yields one journey per requested departure, many of them
//! identical or beaten by another. These helpers thin and order that set.

use std::cmp::Ordering;

use crate::domain::{DateTime, Journey};

/// Sort key: arrival, then changes, then duration.
fn rank_key(journey: &Journey) -> (DateTime, usize, u32) {
    (
        journey.arrival_time(),
        journey.change_count(),
        journey.total_duration(),
    )
}

/// Does `a` dominate `b`?
///
/// `a` must be no worse on arrival, changes and duration, and strictly
/// better on at least one of them.
fn dominates(a: &Journey, b: &Journey) -> bool {
    let (a_arr, a_chg, a_dur) = rank_key(a);
    let (b_arr, b_chg, b_dur) = rank_key(b);
    a_arr <= b_arr
        && a_chg <= b_chg
        && a_dur <= b_dur
        && (a_arr < b_arr || a_chg < b_chg || a_dur < b_dur)
}

/// Rank journeys by preference.
///
/// Journeys are ranked by:
/// 1. Arrival time (earlier is better)
/// 2. Number of changes (fewer is better)
/// 3. Total duration (shorter is better)
///
/// Returns journeys sorted best-first. The sort is stable.
pub fn rank_journeys(mut journeys: Vec<Journey>) -> Vec<Journey> {
    journeys.sort_by_key(rank_key);
    journeys
}

/// Remove dominated journeys, keeping the Pareto set in input order.
pub fn remove_dominated(journeys: Vec<Journey>) -> Vec<Journey> {
    if journeys.len() <= 1 {
        return journeys;
    }

    let mut kept: Vec<Journey> = Vec::with_capacity(journeys.len());
    for journey in journeys {
        if kept.iter().any(|existing| dominates(existing, &journey)) {
            continue;
        }
        kept.retain(|existing| !dominates(&journey, existing));
        kept.push(journey);
    }
    kept
}

/// Drop journeys with the same departure, arrival and change count,
/// keeping the shortest of each group.
///
/// Neighbouring requested departures often lead to the same best journey.
pub fn deduplicate(mut journeys: Vec<Journey>) -> Vec<Journey> {
    if journeys.len() <= 1 {
        return journeys;
    }

    let key = |j: &Journey| (j.arrival_time(), j.departure_time(), j.change_count());
    journeys.sort_by(|a, b| match key(a).cmp(&key(b)) {
        Ordering::Equal => a.total_duration().cmp(&b.total_duration()),
        other => other,
    });
    journeys.dedup_by(|later, earlier| key(&*later) == key(&*earlier));
    journeys
}
