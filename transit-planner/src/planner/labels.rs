//! Label store: one label vector per round plus the running optimum.

use crate::domain::{DateTime, Label, Network, PatternPointIdx};

use super::direction::Direction;

/// Per-round labels and the cross-round Best-Label of every pattern point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelStore {
    rounds: Vec<Vec<Label>>,
    best: Vec<Label>,
}

impl LabelStore {
    /// Creates an empty store; call [`reset`](Self::reset) before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all rounds and starts over with round 0 and Best-Labels at the
    /// direction's worst value. Allocations are kept.
    pub fn reset<D: Direction>(&mut self, network: &Network) {
        let template = network.label_template(D::CLOCKWISE);
        self.rounds.truncate(1);
        match self.rounds.first_mut() {
            Some(round) => {
                round.clear();
                round.extend_from_slice(template);
            }
            None => self.rounds.push(template.to_vec()),
        }
        self.best.clear();
        self.best.extend_from_slice(template);
    }

    /// Makes sure round `k` exists, cloning it from the template if not.
    pub fn ensure_round<D: Direction>(&mut self, k: usize, network: &Network) {
        while self.rounds.len() <= k {
            self.rounds.push(network.label_template(D::CLOCKWISE).to_vec());
        }
    }

    /// Number of allocated rounds, including round 0.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn round(&self, k: usize) -> &[Label] {
        &self.rounds[k]
    }

    pub fn rounds(&self) -> &[Vec<Label>] {
        &self.rounds
    }

    /// Label of `pp` in round `k`.
    pub fn get(&self, k: usize, pp: PatternPointIdx) -> &Label {
        &self.rounds[k][pp.index()]
    }

    /// Best-Label of `pp` over all rounds so far.
    pub fn best(&self, pp: PatternPointIdx) -> &Label {
        &self.best[pp.index()]
    }

    pub fn best_labels(&self) -> &[Label] {
        &self.best
    }

    /// Writes round `k`'s label of `pp` and the Best-Label together.
    pub fn write<D: Direction>(&mut self, k: usize, pp: PatternPointIdx, label: Label) {
        let slot = &mut self.rounds[k][pp.index()];
        debug_assert!(
            !slot.is_initialized() || !D::better(D::primary(slot), D::primary(&label)),
            "round {k} label of {pp} regressed"
        );
        *slot = label;
        self.best[pp.index()] = label;
    }

    /// Seeds an origin label in round 0, keeping the better of two seeds.
    pub fn seed<D: Direction>(&mut self, pp: PatternPointIdx, label: Label) {
        let slot = &mut self.rounds[0][pp.index()];
        if !slot.is_initialized() || D::better(D::primary(&label), D::primary(slot)) {
            *slot = label;
            self.best[pp.index()] = label;
        }
    }

    /// Overrides the Best-Label time of `pp` without touching any round.
    pub fn bound_best<D: Direction>(&mut self, pp: PatternPointIdx, time: DateTime) {
        D::set_primary(&mut self.best[pp.index()], time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LabelKind, NetworkBuilder};
    use crate::planner::direction::{Backward, Forward};
    use chrono::NaiveDate;

    fn network() -> Network {
        let mut b = NetworkBuilder::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let a = b.add_stop_point("a", "A", None).unwrap();
        let c = b.add_stop_point("c", "C", None).unwrap();
        let line = b.add_line("l", "L");
        let mode = b.add_mode("m", "M");
        b.add_pattern("p", line, mode, &[a, c]).unwrap();
        b.build()
    }

    fn pp(i: u32) -> PatternPointIdx {
        PatternPointIdx(i)
    }

    #[test]
    fn reset_uses_direction_template() {
        let net = network();
        let mut store = LabelStore::new();

        store.reset::<Forward>(&net);
        assert_eq!(store.round_count(), 1);
        assert_eq!(store.best(pp(0)).arrival, DateTime::INF);

        store.reset::<Backward>(&net);
        assert_eq!(store.best(pp(0)).departure, DateTime::MIN);
        assert_eq!(store.get(0, pp(1)).departure, DateTime::MIN);
    }

    #[test]
    fn reset_drops_later_rounds() {
        let net = network();
        let mut store = LabelStore::new();
        store.reset::<Forward>(&net);
        store.ensure_round::<Forward>(3, &net);
        assert_eq!(store.round_count(), 4);

        store.write::<Forward>(2, pp(1), Label::origin(DateTime::new(0, 10)));
        store.reset::<Forward>(&net);

        assert_eq!(store.round_count(), 1);
        assert!(!store.best(pp(1)).is_initialized());
    }

    #[test]
    fn write_updates_best() {
        let net = network();
        let mut store = LabelStore::new();
        store.reset::<Forward>(&net);
        store.ensure_round::<Forward>(1, &net);

        let label = Label::transfer(DateTime::new(0, 500), pp(0), LabelKind::Connection);
        store.write::<Forward>(1, pp(1), label);

        assert_eq!(store.get(1, pp(1)), &label);
        assert_eq!(store.best(pp(1)), &label);
        assert!(!store.get(0, pp(1)).is_initialized());
    }

    #[test]
    fn seed_keeps_better_origin() {
        let net = network();
        let mut store = LabelStore::new();
        store.reset::<Forward>(&net);

        store.seed::<Forward>(pp(0), Label::origin(DateTime::new(0, 300)));
        store.seed::<Forward>(pp(0), Label::origin(DateTime::new(0, 400)));
        store.seed::<Forward>(pp(0), Label::origin(DateTime::new(0, 200)));

        assert_eq!(store.get(0, pp(0)).arrival, DateTime::new(0, 200));
    }

    #[test]
    fn bound_best_leaves_rounds_alone() {
        let net = network();
        let mut store = LabelStore::new();
        store.reset::<Backward>(&net);

        store.bound_best::<Backward>(pp(1), DateTime::new(0, 700));

        assert_eq!(store.best(pp(1)).departure, DateTime::new(0, 700));
        assert!(!store.best(pp(1)).is_initialized());
        assert_eq!(store.get(0, pp(1)).departure, DateTime::MIN);
    }
}
