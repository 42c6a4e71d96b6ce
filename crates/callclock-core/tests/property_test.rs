//! Property-based tests for elapsed-time arithmetic.
//!
//! Uses deterministic, in-memory testing without external dependencies.

#![allow(clippy::unwrap_used)]

use callclock_core::elapsed_seconds;
use chrono::{DateTime, TimeDelta, Utc};
use proptest::{prelude::*, test_runner::Config as ProptestConfig};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 200,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

/// Timestamps between 2000 and 2100 in milliseconds.
fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800_000_i64..4_102_444_800_000_i64)
        .prop_map(|millis| DateTime::from_timestamp_millis(millis).unwrap())
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn elapsed_matches_floor_of_millisecond_difference(
        start in timestamp_strategy(),
        offset_ms in 0_i64..10_000_000,
    ) {
        let now = start + TimeDelta::milliseconds(offset_ms);
        prop_assert_eq!(elapsed_seconds(start, now), u64::try_from(offset_ms / 1000).unwrap());
    }

    #[test]
    fn elapsed_is_monotonic_in_lookup_time(
        start in timestamp_strategy(),
        first_ms in 0_i64..1_000_000,
        extra_ms in 0_i64..1_000_000,
    ) {
        let first = start + TimeDelta::milliseconds(first_ms);
        let later = first + TimeDelta::milliseconds(extra_ms);
        prop_assert!(elapsed_seconds(start, first) <= elapsed_seconds(start, later));
    }

    #[test]
    fn elapsed_never_negative_under_clock_skew(
        start in timestamp_strategy(),
        skew_ms in 1_i64..1_000_000,
    ) {
        let now = start - TimeDelta::milliseconds(skew_ms);
        prop_assert_eq!(elapsed_seconds(start, now), 0);
    }
}
