//! Secondary edges between timetable nodes.
//!
//! Two families of edges complement the timetable:
//!
//! - footpaths between stop points, symmetric and scaled by walking speed;
//! - continuations between pattern points, where a vehicle carries on under
//!   another pattern (an extension) or a connection is held (a guarantee).
//!
//! For the engine, both are stored grouped by origin node in flat arrays with
//! an `(offset, count)` index per node, once per search direction. The
//! backward copies are reversed, so `to` is always the node a propagation
//! step writes.

use std::collections::HashMap;

use crate::domain::{PatternPointIdx, StopPointIdx};

/// A walking edge between two stop points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footpath {
    pub from: StopPointIdx,
    pub to: StopPointIdx,
    /// Seconds at the network's reference walking speed.
    pub duration: u32,
}

/// What a continuation edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContinuationKind {
    /// The same vehicle continues as another pattern
    Extension,
    /// The transfer is held regardless of the nominal schedule
    Guarantee,
}

/// An operational edge between two pattern points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub from: PatternPointIdx,
    pub to: PatternPointIdx,
    pub duration: u32,
    pub kind: ContinuationKind,
}

/// A set of footpaths between stop points.
///
/// Footpaths are symmetric: if you can walk from A to B, you can walk from B
/// to A in the same time. Adding a pair twice keeps the shorter duration.
#[derive(Debug, Clone, Default)]
pub struct FootpathSet {
    /// Map from (from, to) to duration in seconds, stored in both directions.
    paths: HashMap<(StopPointIdx, StopPointIdx), u32>,
}

impl FootpathSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a footpath between two stop points, in both directions.
    pub fn add(&mut self, a: StopPointIdx, b: StopPointIdx, duration: u32) {
        for key in [(a, b), (b, a)] {
            self.paths
                .entry(key)
                .and_modify(|d| *d = (*d).min(duration))
                .or_insert(duration);
        }
    }

    /// Walking duration between two stop points, if they are connected.
    pub fn get(&self, from: StopPointIdx, to: StopPointIdx) -> Option<u32> {
        self.paths.get(&(from, to)).copied()
    }

    /// Check if two stop points are connected on foot.
    pub fn is_walkable(&self, from: StopPointIdx, to: StopPointIdx) -> bool {
        self.paths.contains_key(&(from, to))
    }

    /// All stop points reachable on foot from `from`.
    pub fn walkable_from(&self, from: StopPointIdx) -> Vec<(StopPointIdx, u32)> {
        let mut out: Vec<_> = self
            .paths
            .iter()
            .filter(|((f, _), _)| *f == from)
            .map(|((_, t), d)| (*t, *d))
            .collect();
        out.sort_unstable_by_key(|(t, d)| (*d, *t));
        out
    }

    /// Returns the number of connected pairs (counting A→B and B→A as one).
    pub fn len(&self) -> usize {
        self.paths.len() / 2
    }

    /// Returns true if there are no footpaths.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn edges(&self) -> Vec<Footpath> {
        self.paths
            .iter()
            .filter(|((from, to), _)| from != to)
            .map(|((from, to), duration)| Footpath {
                from: *from,
                to: *to,
                duration: *duration,
            })
            .collect()
    }
}

/// Edges of one kind, grouped contiguously by origin node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedEdges<E> {
    edges: Vec<E>,
    /// Per origin node: offset of its first edge and number of edges.
    index: Vec<(usize, usize)>,
}

impl<E> GroupedEdges<E> {
    /// Groups `edges` by `origin`, ordering each group by `duration` so that
    /// equal durations are adjacent.
    pub fn group(
        mut edges: Vec<E>,
        nodes: usize,
        origin: impl Fn(&E) -> usize,
        duration: impl Fn(&E) -> u32,
    ) -> Self {
        edges.sort_by_key(|e| (origin(e), duration(e)));
        let mut index = vec![(0, 0); nodes];
        let mut offset = 0;
        for (node, slot) in index.iter_mut().enumerate() {
            let count = edges[offset..]
                .iter()
                .take_while(|e| origin(e) == node)
                .count();
            *slot = (offset, count);
            offset += count;
        }
        Self { edges, index }
    }

    /// Edges leaving `node`; empty for unknown nodes.
    pub fn from_node(&self, node: usize) -> &[E] {
        match self.index.get(node) {
            Some(&(offset, count)) => &self.edges[offset..offset + count],
            None => &[],
        }
    }

    /// The `(offset, count)` slot of `node`.
    pub fn slot(&self, node: usize) -> Option<(usize, usize)> {
        self.index.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Both edge families in both search directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIndex {
    pub footpaths_forward: GroupedEdges<Footpath>,
    pub footpaths_backward: GroupedEdges<Footpath>,
    pub continuations_forward: GroupedEdges<Continuation>,
    pub continuations_backward: GroupedEdges<Continuation>,
}

impl ConnectionIndex {
    /// Builds the grouped arrays for a network of the given size.
    pub fn new(
        stop_points: usize,
        pattern_points: usize,
        footpaths: &FootpathSet,
        continuations: &[Continuation],
    ) -> Self {
        let forward = footpaths.edges();
        let backward = forward
            .iter()
            .map(|fp| Footpath {
                from: fp.to,
                to: fp.from,
                duration: fp.duration,
            })
            .collect();
        let reversed = continuations
            .iter()
            .map(|c| Continuation {
                from: c.to,
                to: c.from,
                ..*c
            })
            .collect();

        Self {
            footpaths_forward: GroupedEdges::group(
                forward,
                stop_points,
                |fp| fp.from.index(),
                |fp| fp.duration,
            ),
            footpaths_backward: GroupedEdges::group(
                backward,
                stop_points,
                |fp| fp.from.index(),
                |fp| fp.duration,
            ),
            continuations_forward: GroupedEdges::group(
                continuations.to_vec(),
                pattern_points,
                |c| c.from.index(),
                |c| c.duration,
            ),
            continuations_backward: GroupedEdges::group(
                reversed,
                pattern_points,
                |c| c.from.index(),
                |c| c.duration,
            ),
        }
    }
}
