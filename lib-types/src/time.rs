//! Pool-Day Bucketing
//!
//! Deposits and exchange quotas are bucketed by whole days elapsed since
//! pool start. Bucketing is pure math over injected timestamps; no clock
//! is read here.

use crate::{DayIndex, Timestamp};

/// Seconds in one pool-day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Day bucket of `at`, relative to `start`.
///
/// Returns `None` for timestamps before the pool starts.
pub fn day_index(start: Timestamp, at: Timestamp) -> Option<DayIndex> {
    if at < start {
        return None;
    }
    Some((at - start) / SECONDS_PER_DAY)
}

/// Whole days covered by `duration_secs`, rounded down.
pub fn days_in(duration_secs: u64) -> u64 {
    duration_secs / SECONDS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_zero_spans_the_first_whole_day() {
        let start = 1_000_000;
        assert_eq!(day_index(start, start), Some(0));
        assert_eq!(day_index(start, start + SECONDS_PER_DAY - 1), Some(0));
        assert_eq!(day_index(start, start + SECONDS_PER_DAY), Some(1));
    }

    #[test]
    fn timestamps_before_start_have_no_bucket() {
        assert_eq!(day_index(1_000_000, 999_999), None);
        assert_eq!(day_index(1_000_000, 0), None);
    }

    #[test]
    fn later_days_are_sequential() {
        let start = 500;
        assert_eq!(day_index(start, start + 10 * SECONDS_PER_DAY), Some(10));
        assert_eq!(day_index(start, start + 10 * SECONDS_PER_DAY + 1), Some(10));
        assert_eq!(day_index(start, start + 11 * SECONDS_PER_DAY), Some(11));
    }

    #[test]
    fn days_in_rounds_down() {
        assert_eq!(days_in(0), 0);
        assert_eq!(days_in(SECONDS_PER_DAY - 1), 0);
        assert_eq!(days_in(SECONDS_PER_DAY), 1);
        assert_eq!(days_in(180 * SECONDS_PER_DAY + 3600), 180);
    }
}
