//! Journey reconstruction.
//!
//! Walks boarding references from a reached node back to a seeded origin.
//! A trip label steps to the previous round at its boarding node; transfer
//! labels stay in their round and step to their source node.

use crate::domain::{
    DomainError, Journey, Label, LabelKind, Network, PatternPointIdx, Ride, Segment, Transfer,
    TransferKind, TripIdx,
};

use super::direction::Direction;
use super::labels::LabelStore;

/// Builds the journey ending at `target`'s label in `round` of a `D` scan.
///
/// The scan's own direction decides the travel direction: a forward scan
/// walks from the destination back to the origin, so its segments are
/// reversed; a backward scan walks in travel order.
pub fn reconstruct<D: Direction>(
    network: &Network,
    labels: &LabelStore,
    target: PatternPointIdx,
    round: usize,
) -> Result<Journey, DomainError> {
    let limit = network.pattern_points().len() * (labels.round_count() + 1);
    let mut segments = Vec::new();
    let mut node = target;
    let mut k = round;

    for _ in 0..limit {
        let label = labels.get(k, node);
        match label.kind {
            LabelKind::Origin => {
                if D::CLOCKWISE {
                    segments.reverse();
                }
                return Journey::new(segments);
            }
            LabelKind::Uninitialized => return Err(DomainError::BrokenLabelChain(node)),
            LabelKind::Trip => {
                let (Some(boarded), Some(trip)) = (label.boarding, label.trip) else {
                    return Err(DomainError::BrokenLabelChain(node));
                };
                if k == 0 {
                    return Err(DomainError::BrokenLabelChain(node));
                }
                segments.push(Segment::Ride(ride::<D>(network, label, trip, boarded, node)));
                node = boarded;
                k -= 1;
            }
            LabelKind::Connection | LabelKind::Extension | LabelKind::Guarantee => {
                let Some(source) = label.boarding else {
                    return Err(DomainError::BrokenLabelChain(node));
                };
                let from = labels.get(k, source);
                segments.push(Segment::Transfer(transfer::<D>(network, from, label, source, node)));
                node = source;
            }
        }
    }

    Err(DomainError::UnterminatedLabelChain(limit))
}

/// The ride recorded by a trip label at `node`, boarded at `boarded` in scan
/// order.
fn ride<D: Direction>(
    network: &Network,
    label: &Label,
    trip: TripIdx,
    boarded: PatternPointIdx,
    node: PatternPointIdx,
) -> Ride {
    let order = |pp: PatternPointIdx| network.pattern_point(pp).order;
    if D::CLOCKWISE {
        let board = network.stop_time(trip, order(boarded));
        let alight = network.stop_time(trip, order(node));
        Ride {
            trip,
            board: boarded,
            alight: node,
            departure: label
                .arrival
                .saturating_sub(alight.arrival.saturating_sub(board.departure)),
            arrival: label.arrival,
        }
    } else {
        let board = network.stop_time(trip, order(node));
        let alight = network.stop_time(trip, order(boarded));
        Ride {
            trip,
            board: node,
            alight: boarded,
            departure: label.departure,
            arrival: label
                .departure
                .saturating_add(alight.arrival.saturating_sub(board.departure)),
        }
    }
}

/// The transfer from `source` (in scan order) to `node`.
fn transfer<D: Direction>(
    network: &Network,
    from: &Label,
    label: &Label,
    source: PatternPointIdx,
    node: PatternPointIdx,
) -> Transfer {
    let kind = match label.kind {
        LabelKind::Extension => TransferKind::StaySeated,
        LabelKind::Guarantee => TransferKind::Guaranteed,
        _ if network.pattern_point(source).stop_point == network.pattern_point(node).stop_point => {
            TransferKind::SameStop
        }
        _ => TransferKind::Walking,
    };
    if D::CLOCKWISE {
        Transfer {
            from: source,
            to: node,
            departure: D::primary(from),
            arrival: D::primary(label),
            kind,
        }
    } else {
        Transfer {
            from: node,
            to: source,
            departure: D::primary(label),
            arrival: D::primary(from),
            kind,
        }
    }
}
