//! Shared fixtures for planner tests.

use chrono::NaiveDate;

use crate::domain::{
    DateTime, Network, NetworkBuilder, PatternIdx, PatternPointIdx, StopPointIdx, StopTime,
    TripIdx, ValidityPattern,
};

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

/// An instant on day 0.
pub fn t(secs: u32) -> DateTime {
    DateTime::new(0, secs)
}

/// Routes `tracing` output through the test harness; `RUST_LOG` applies.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two single-trip patterns joined by a footpath:
///
/// ```text
/// A --T0 8000..8100--> B ~~200s walk~~ C --T1 9000..9500--> D
/// ```
pub struct LineFixture {
    pub network: Network,
    pub stop_a: StopPointIdx,
    pub stop_b: StopPointIdx,
    pub stop_c: StopPointIdx,
    pub stop_d: StopPointIdx,
    pub ab: PatternIdx,
    pub cd: PatternIdx,
    pub a: PatternPointIdx,
    pub b: PatternPointIdx,
    pub c: PatternPointIdx,
    pub d: PatternPointIdx,
    pub trip: TripIdx,
    pub trip_cd: TripIdx,
}

pub fn line_network() -> LineFixture {
    let mut b = NetworkBuilder::new(date());
    let stop_a = b.add_stop_point("sp:a", "A", None).unwrap();
    let stop_b = b.add_stop_point("sp:b", "B", None).unwrap();
    let stop_c = b.add_stop_point("sp:c", "C", None).unwrap();
    let stop_d = b.add_stop_point("sp:d", "D", None).unwrap();
    let line = b.add_line("line:1", "Line 1");
    let mode = b.add_mode("mode:bus", "Bus");
    let week = b.add_validity_pattern(ValidityPattern::every_day(7));

    let ab = b.add_pattern("jp:ab", line, mode, &[stop_a, stop_b]).unwrap();
    let cd = b.add_pattern("jp:cd", line, mode, &[stop_c, stop_d]).unwrap();
    let trip = b
        .add_trip(
            "trip:0",
            ab,
            week,
            vec![StopTime::new(8000, 8000), StopTime::new(8100, 8100)],
        )
        .unwrap();
    let trip_cd = b
        .add_trip(
            "trip:1",
            cd,
            week,
            vec![StopTime::new(9000, 9000), StopTime::new(9500, 9500)],
        )
        .unwrap();
    b.add_footpath(stop_b, stop_c, 200).unwrap();

    let a = b.pattern_point(ab, 0).unwrap();
    let bp = b.pattern_point(ab, 1).unwrap();
    let c = b.pattern_point(cd, 0).unwrap();
    let d = b.pattern_point(cd, 1).unwrap();

    LineFixture {
        network: b.build(),
        stop_a,
        stop_b,
        stop_c,
        stop_d,
        ab,
        cd,
        a,
        b: bp,
        c,
        d,
        trip,
        trip_cd,
    }
}
