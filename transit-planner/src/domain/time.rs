//! Network clock.
//!
//! Times inside the engine are whole seconds counted from midnight of the
//! network's first calendar day. Timetable offsets are seconds from the
//! midnight of a trip's service day and may exceed 24h for services running
//! past midnight, so the engine only ever compares absolute instants.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Seconds in a service day.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// An absolute instant on the network clock.
///
/// `DateTime::INF` and `DateTime::MIN` double as the "worst" sentinels of the
/// forward and backward searches, and all arithmetic saturates at them.
///
/// # Examples
///
/// ```
/// use transit_planner::domain::DateTime;
///
/// let dt = DateTime::new(1, 3600);
/// assert_eq!(dt.day(), 1);
/// assert_eq!(dt.seconds_of_day(), 3600);
/// assert_eq!(dt.to_string(), "D1 01:00:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DateTime(u32);

impl DateTime {
    /// Unreachable in the future: the forward worst value.
    pub const INF: DateTime = DateTime(u32::MAX);

    /// Unreachable in the past: the backward worst value.
    pub const MIN: DateTime = DateTime(0);

    /// Creates an instant from a day number and seconds since that day's midnight.
    pub fn new(day: u32, seconds: u32) -> Self {
        Self(
            day.saturating_mul(SECONDS_PER_DAY)
                .saturating_add(seconds),
        )
    }

    /// Raw seconds since the network start.
    pub fn seconds(self) -> u32 {
        self.0
    }

    /// Day number (0 = first calendar day of the network).
    pub fn day(self) -> u32 {
        self.0 / SECONDS_PER_DAY
    }

    /// Seconds since midnight of [`day`](Self::day).
    pub fn seconds_of_day(self) -> u32 {
        self.0 % SECONDS_PER_DAY
    }

    /// Returns true for either sentinel.
    pub fn is_sentinel(self) -> bool {
        self == Self::INF || self == Self::MIN
    }

    /// Earliest instant at or after `self` whose time of day matches `offset`.
    ///
    /// `offset` is a timetable offset; anything past 24h is reduced modulo a day.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::DateTime;
    ///
    /// let ready = DateTime::new(0, 8000);
    /// assert_eq!(ready.update(8100), DateTime::new(0, 8100));
    ///
    /// // Already past 01:56:40 today, so tomorrow's
    /// assert_eq!(ready.update(7000), DateTime::new(1, 7000));
    /// ```
    pub fn update(self, offset: u32) -> Self {
        if self == Self::INF {
            return self;
        }
        let target = offset % SECONDS_PER_DAY;
        let day = if self.seconds_of_day() <= target {
            self.day()
        } else {
            self.day().saturating_add(1)
        };
        Self::new(day, target)
    }

    /// Latest instant at or before `self` whose time of day matches `offset`.
    ///
    /// Saturates to [`DateTime::MIN`] when that instant would fall before day 0.
    pub fn update_reverse(self, offset: u32) -> Self {
        if self == Self::INF {
            return Self::new(self.day(), offset % SECONDS_PER_DAY);
        }
        let target = offset % SECONDS_PER_DAY;
        if self.seconds_of_day() >= target {
            Self::new(self.day(), target)
        } else {
            match self.day().checked_sub(1) {
                Some(day) => Self::new(day, target),
                None => Self::MIN,
            }
        }
    }

    /// Adds seconds, saturating at [`DateTime::INF`].
    pub fn saturating_add(self, seconds: u32) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Subtracts seconds, saturating at [`DateTime::MIN`].
    pub fn saturating_sub(self, seconds: u32) -> Self {
        Self(self.0.saturating_sub(seconds))
    }

    /// Seconds from `earlier` to `self`, or zero if `earlier` is later.
    pub fn seconds_since(self, earlier: DateTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }

    /// Converts to a calendar datetime given the network's first day.
    ///
    /// Returns `None` for the sentinels and for dates chrono cannot represent.
    pub fn to_naive(self, start_date: NaiveDate) -> Option<NaiveDateTime> {
        if self == Self::INF {
            return None;
        }
        let midnight = start_date.and_hms_opt(0, 0, 0)?;
        midnight.checked_add_signed(Duration::seconds(i64::from(self.0)))
    }

    /// Converts a calendar datetime to the network clock.
    ///
    /// Returns `None` before `start_date` or beyond the representable range.
    pub fn from_naive(value: NaiveDateTime, start_date: NaiveDate) -> Option<Self> {
        let midnight = start_date.and_hms_opt(0, 0, 0)?;
        let seconds = value.signed_duration_since(midnight).num_seconds();
        u32::try_from(seconds)
            .ok()
            .filter(|s| *s != u32::MAX)
            .map(Self)
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateTime({self})")
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INF {
            return write!(f, "+inf");
        }
        let secs = self.seconds_of_day();
        write!(
            f,
            "D{} {:02}:{:02}:{:02}",
            self.day(),
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        )
    }
}
