//! Typed indices into the network tables.
//!
//! Every table in [`Network`](super::Network) is an arena addressed by a
//! dedicated index type, so a pattern index can never be used to look up a
//! trip. Absent references are `Option<Idx>`, never a magic value.

use serde::Serialize;

macro_rules! typed_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the index as a `usize` for slice access.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                $name(value as u32)
            }
        }

        impl From<$name> for usize {
            fn from(value: $name) -> Self {
                value.0 as usize
            }
        }
    };
}

typed_index!(
    /// Index of a [`Pattern`](super::Pattern).
    PatternIdx
);
typed_index!(
    /// Index of a [`PatternPoint`](super::PatternPoint), global across patterns.
    PatternPointIdx
);
typed_index!(
    /// Index of a [`StopPoint`](super::StopPoint).
    StopPointIdx
);
typed_index!(
    /// Index of a [`StopArea`](super::StopArea).
    StopAreaIdx
);
typed_index!(
    /// Index of a [`Trip`](super::Trip).
    TripIdx
);
typed_index!(
    /// Index of a [`ValidityPattern`](super::ValidityPattern).
    ValidityPatternIdx
);
typed_index!(LineIdx);
typed_index!(ModeIdx);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_conversions() {
        let idx = PatternPointIdx::from(7usize);
        assert_eq!(idx, PatternPointIdx(7));
        assert_eq!(idx.index(), 7);
        assert_eq!(usize::from(idx), 7);
        assert_eq!(idx.to_string(), "7");
    }

    #[test]
    fn indices_order_by_value() {
        assert!(TripIdx(1) < TripIdx(2));
        assert_eq!(StopPointIdx(3).max(StopPointIdx(1)), StopPointIdx(3));
    }
}
