//! Pattern validity pre-pass.
//!
//! Computed once per query, before any scanning. Patterns that are excluded
//! by the caller or that have no trip running around the query days are
//! never scanned.

use std::collections::HashSet;

use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::domain::{Network, Pattern};

use super::search::SearchError;

/// Entities the caller does not want to travel on, keyed by URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forbidden {
    pub lines: HashSet<String>,
    pub journey_patterns: HashSet<String>,
    pub modes: HashSet<String>,
}

impl Forbidden {
    /// No exclusions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses `(key, uri)` pairs, where key is `line`, `journey_pattern` or
    /// `mode`.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, SearchError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut forbidden = Self::default();
        for (key, uri) in pairs {
            let set = match key.as_ref() {
                "line" => &mut forbidden.lines,
                "journey_pattern" => &mut forbidden.journey_patterns,
                "mode" => &mut forbidden.modes,
                other => return Err(SearchError::UnknownForbiddenKey(other.to_string())),
            };
            set.insert(uri.into());
        }
        Ok(forbidden)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.journey_patterns.is_empty() && self.modes.is_empty()
    }

    /// Is any of the pattern's own URI, line or mode excluded?
    pub fn excludes(&self, network: &Network, pattern: &Pattern) -> bool {
        self.journey_patterns.contains(&pattern.uri)
            || self.lines.contains(&network.line(pattern.line).uri)
            || self.modes.contains(&network.mode(pattern.mode).uri)
    }
}

/// Does any trip of `pattern` run on or around one of `days`?
fn runs_on(network: &Network, pattern: &Pattern, days: &[u32]) -> bool {
    pattern.trips.iter().any(|&trip| {
        let vp = network.validity_pattern(network.trip(trip).validity);
        days.iter().any(|&day| vp.check2(day))
    })
}

/// Bit per pattern: set if the pattern may be scanned for a query on `days`.
pub fn valid_patterns(network: &Network, days: &[u32], forbidden: &Forbidden) -> FixedBitSet {
    let patterns = network.patterns();
    let mut valid = FixedBitSet::with_capacity(patterns.len());
    for (idx, pattern) in patterns.iter().enumerate() {
        if !forbidden.excludes(network, pattern) && runs_on(network, pattern, days) {
            valid.insert(idx);
        }
    }
    debug!(
        valid = valid.count_ones(..),
        patterns = patterns.len(),
        days = days.len(),
        "validity pre-pass complete"
    );
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NetworkBuilder, StopTime};
    use chrono::NaiveDate;

    fn network() -> Network {
        let mut b = NetworkBuilder::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let a = b.add_stop_point("a", "A", None).unwrap();
        let c = b.add_stop_point("c", "C", None).unwrap();
        let bus = b.add_mode("bus", "Bus");
        let tram = b.add_mode("tram", "Tram");
        let l1 = b.add_line("l1", "Line 1");
        let l2 = b.add_line("l2", "Line 2");
        let monday = b.add_validity_pattern(crate::domain::ValidityPattern::from_days(&[0]));
        let friday = b.add_validity_pattern(crate::domain::ValidityPattern::from_days(&[4]));

        let p0 = b.add_pattern("p0", l1, bus, &[a, c]).unwrap();
        let p1 = b.add_pattern("p1", l2, tram, &[a, c]).unwrap();
        let p2 = b.add_pattern("p2", l2, bus, &[c, a]).unwrap();
        b.add_pattern("empty", l1, bus, &[c, a]).unwrap();

        let times = || vec![StopTime::new(100, 100), StopTime::new(200, 200)];
        b.add_trip("t0", p0, monday, times()).unwrap();
        b.add_trip("t1", p1, monday, times()).unwrap();
        b.add_trip("t2", p2, friday, times()).unwrap();
        b.build()
    }

    fn set(bits: &FixedBitSet) -> Vec<usize> {
        bits.ones().collect()
    }

    #[test]
    fn calendar_filter_tolerates_neighbouring_days() {
        let net = network();
        let none = Forbidden::none();

        assert_eq!(set(&valid_patterns(&net, &[0], &none)), vec![0, 1]);
        assert_eq!(set(&valid_patterns(&net, &[1], &none)), vec![0, 1]);
        assert_eq!(set(&valid_patterns(&net, &[2], &none)), Vec::<usize>::new());
        assert_eq!(set(&valid_patterns(&net, &[5], &none)), vec![2]);
    }

    #[test]
    fn union_over_days() {
        let net = network();
        let valid = valid_patterns(&net, &[0, 4], &Forbidden::none());
        assert_eq!(set(&valid), vec![0, 1, 2]);
    }

    #[test]
    fn forbidden_entities_are_excluded() {
        let net = network();
        let days = [0, 4];

        let by_line = Forbidden::from_pairs([("line", "l2")]).unwrap();
        assert_eq!(set(&valid_patterns(&net, &days, &by_line)), vec![0]);

        let by_mode = Forbidden::from_pairs([("mode", "bus")]).unwrap();
        assert_eq!(set(&valid_patterns(&net, &days, &by_mode)), vec![1]);

        let by_pattern = Forbidden::from_pairs([("journey_pattern", "p1")]).unwrap();
        assert_eq!(set(&valid_patterns(&net, &days, &by_pattern)), vec![0, 2]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = Forbidden::from_pairs([("network", "n1")]).unwrap_err();
        assert!(matches!(err, SearchError::UnknownForbiddenKey(ref k) if k == "network"));
    }

    #[test]
    fn from_pairs_accumulates() {
        let forbidden =
            Forbidden::from_pairs([("line", "l1"), ("line", "l2"), ("mode", "tram")]).unwrap();
        assert_eq!(forbidden.lines.len(), 2);
        assert!(forbidden.modes.contains("tram"));
        assert!(forbidden.journey_patterns.is_empty());
        assert!(!forbidden.is_empty());
        assert!(Forbidden::none().is_empty());
    }
}
