//! Queue and mark bookkeeping.
//!
//! The scan queue holds one cursor per pattern: the position the next round
//! must start scanning from. The touched sets record which pattern points and
//! stop points improved in the current round.

use fixedbitset::FixedBitSet;

use crate::domain::{PatternIdx, PatternPointIdx, StopPointIdx};

use super::direction::Direction;

/// Per-pattern scan start positions. `None` means "not queued".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanQueue {
    cursors: Vec<Option<usize>>,
}

impl ScanQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unqueues every pattern, resizing for `patterns` patterns.
    pub fn reset(&mut self, patterns: usize) {
        self.cursors.clear();
        self.cursors.resize(patterns, None);
    }

    /// Queues `pattern` so that the scan covers `order`.
    ///
    /// Returns true if the cursor moved.
    pub fn mark<D: Direction>(&mut self, pattern: PatternIdx, order: usize) -> bool {
        let cursor = &mut self.cursors[pattern.index()];
        match *cursor {
            Some(current) if !D::scans_before(order, current) => false,
            _ => {
                *cursor = Some(order);
                true
            }
        }
    }

    /// Takes the cursor of `pattern`, leaving it unqueued.
    pub fn take(&mut self, pattern: PatternIdx) -> Option<usize> {
        self.cursors[pattern.index()].take()
    }

    pub fn cursor(&self, pattern: PatternIdx) -> Option<usize> {
        self.cursors[pattern.index()]
    }

    /// Number of queued patterns.
    pub fn queued(&self) -> usize {
        self.cursors.iter().filter(|c| c.is_some()).count()
    }
}

/// Nodes improved during the current round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Touched {
    pub pattern_points: FixedBitSet,
    pub stop_points: FixedBitSet,
}

impl Touched {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears both sets, resizing them for the given network size.
    pub fn reset(&mut self, pattern_points: usize, stop_points: usize) {
        self.pattern_points.clear();
        self.pattern_points.grow(pattern_points);
        self.stop_points.clear();
        self.stop_points.grow(stop_points);
    }

    /// Clears both sets, keeping their size.
    pub fn clear(&mut self) {
        self.pattern_points.clear();
        self.stop_points.clear();
    }

    pub fn mark(&mut self, pp: PatternPointIdx, stop: StopPointIdx) {
        self.pattern_points.insert(pp.index());
        self.stop_points.insert(stop.index());
    }

    pub fn mark_pattern_point(&mut self, pp: PatternPointIdx) {
        self.pattern_points.insert(pp.index());
    }

    /// Returns true if nothing was touched.
    pub fn is_empty(&self) -> bool {
        self.pattern_points.is_clear() && self.stop_points.is_clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::direction::{Backward, Forward};

    #[test]
    fn forward_cursor_keeps_minimum() {
        let mut q = ScanQueue::new();
        q.reset(2);
        let p = PatternIdx(1);

        assert!(q.mark::<Forward>(p, 3));
        assert!(q.mark::<Forward>(p, 1));
        assert!(!q.mark::<Forward>(p, 2));
        assert_eq!(q.cursor(p), Some(1));
        assert_eq!(q.queued(), 1);
    }

    #[test]
    fn backward_cursor_keeps_maximum() {
        let mut q = ScanQueue::new();
        q.reset(1);
        let p = PatternIdx(0);

        assert!(q.mark::<Backward>(p, 1));
        assert!(q.mark::<Backward>(p, 4));
        assert!(!q.mark::<Backward>(p, 2));
        assert_eq!(q.cursor(p), Some(4));
    }

    #[test]
    fn take_unqueues() {
        let mut q = ScanQueue::new();
        q.reset(1);
        q.mark::<Forward>(PatternIdx(0), 0);

        assert_eq!(q.take(PatternIdx(0)), Some(0));
        assert_eq!(q.take(PatternIdx(0)), None);
        assert_eq!(q.queued(), 0);
    }

    #[test]
    fn touched_sets() {
        let mut t = Touched::new();
        t.reset(4, 3);
        assert!(t.is_empty());

        t.mark(PatternPointIdx(2), StopPointIdx(1));
        assert!(t.pattern_points.contains(2));
        assert!(t.stop_points.contains(1));

        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.pattern_points.len(), 4);
    }
}
