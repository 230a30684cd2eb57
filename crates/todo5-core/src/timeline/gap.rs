//! Free period detection between calendar commitments.
//!
//! Finds the gaps left between busy intervals inside a bounded horizon
//! that starts at the moment of the call.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default scan horizon for gap computation.
pub const DEFAULT_HORIZON_HOURS: i64 = 24;

/// A calendar commitment that blocks scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A maximal gap between commitments within the scan horizon.
///
/// Always satisfies `end > start`; the only constructor enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreePeriod {
    /// Create a free period, or `None` if the range is empty or inverted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get duration in whole minutes (truncated)
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Check if this period can fit a task of given duration
    pub fn can_fit(&self, minutes: i64) -> bool {
        self.duration_minutes() >= minutes
    }
}

/// Computes the complement of a set of busy intervals over `[now, now + horizon)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapCalculator {
    horizon: Duration,
}

impl GapCalculator {
    /// Create a calculator with the default 24 hour horizon
    pub fn new() -> Self {
        Self {
            horizon: Duration::hours(DEFAULT_HORIZON_HOURS),
        }
    }

    /// Set the scan horizon
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Find free periods between `intervals`, scanning from `now`.
    ///
    /// Intervals may overlap and arrive in any order. The cursor only ever
    /// moves forward, so an interval nested inside an earlier one cannot
    /// reopen time that is already covered. Output is chronological and
    /// lies entirely within the horizon.
    pub fn find_free_periods(
        &self,
        intervals: &[BusyInterval],
        now: DateTime<Utc>,
    ) -> Vec<FreePeriod> {
        let horizon_end = now + self.horizon;

        let mut sorted = intervals.to_vec();
        // stable: ties keep input order
        sorted.sort_by_key(|interval| interval.start);

        let mut periods = Vec::new();
        let mut cursor = now;

        for interval in &sorted {
            if interval.start > cursor && cursor < horizon_end {
                if let Some(period) = FreePeriod::new(cursor, interval.start.min(horizon_end)) {
                    periods.push(period);
                }
            }
            cursor = cursor.max(interval.end);
        }

        if let Some(period) = FreePeriod::new(cursor, horizon_end) {
            periods.push(period);
        }

        periods
    }
}

impl Default for GapCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to find free periods with the default horizon
pub fn determine_free_periods(intervals: &[BusyInterval], now: DateTime<Utc>) -> Vec<FreePeriod> {
    GapCalculator::new().find_free_periods(intervals, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, 20, h, m, 0).unwrap()
    }

    #[test]
    fn test_free_period_rejects_empty_range() {
        assert!(FreePeriod::new(at(9, 0), at(9, 0)).is_none());
        assert!(FreePeriod::new(at(10, 0), at(9, 0)).is_none());
        assert_eq!(FreePeriod::new(at(9, 0), at(9, 30)).unwrap().duration_minutes(), 30);
    }

    #[test]
    fn test_empty_input_spans_horizon() {
        let now = at(8, 0);
        let periods = determine_free_periods(&[], now);
        assert_eq!(periods, vec![FreePeriod::new(now, now + Duration::hours(24)).unwrap()]);
    }

    #[test]
    fn test_gap_between_two_meetings() {
        let now = at(8, 0);
        let events = vec![
            BusyInterval::new(at(9, 0), at(10, 0)),
            BusyInterval::new(at(11, 0), at(12, 0)),
        ];

        let periods = determine_free_periods(&events, now);
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0], FreePeriod::new(at(8, 0), at(9, 0)).unwrap());
        assert_eq!(periods[1], FreePeriod::new(at(10, 0), at(11, 0)).unwrap());
        assert_eq!(periods[2].start, at(12, 0));
        assert_eq!(periods[2].end, now + Duration::hours(24));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let now = at(8, 0);
        let events = vec![
            BusyInterval::new(at(11, 0), at(12, 0)),
            BusyInterval::new(at(9, 0), at(10, 0)),
        ];
        let periods = determine_free_periods(&events, now);
        assert_eq!(periods[1], FreePeriod::new(at(10, 0), at(11, 0)).unwrap());
    }

    #[test]
    fn test_nested_interval_does_not_regress_cursor() {
        let now = at(8, 0);
        let events = vec![
            BusyInterval::new(at(9, 0), at(13, 0)),
            BusyInterval::new(at(10, 0), at(11, 0)),
        ];
        let periods = determine_free_periods(&events, now);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1].start, at(13, 0));
    }

    #[test]
    fn test_interval_already_in_progress() {
        let now = at(9, 30);
        let events = vec![BusyInterval::new(at(9, 0), at(10, 0))];
        let periods = determine_free_periods(&events, now);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start, at(10, 0));
    }

    #[test]
    fn test_intervals_beyond_horizon_are_clipped() {
        let now = at(8, 0);
        let calc = GapCalculator::new().with_horizon(Duration::hours(4));
        let events = vec![
            BusyInterval::new(at(9, 0), at(10, 0)),
            BusyInterval::new(at(14, 0), at(15, 0)),
        ];
        let periods = calc.find_free_periods(&events, now);
        assert_eq!(
            periods,
            vec![
                FreePeriod::new(at(8, 0), at(9, 0)).unwrap(),
                FreePeriod::new(at(10, 0), at(12, 0)).unwrap(),
            ]
        );
    }

    #[test]
    fn test_interval_covering_horizon_end_leaves_no_trailing_period() {
        let now = at(8, 0);
        let calc = GapCalculator::new().with_horizon(Duration::hours(2));
        let events = vec![BusyInterval::new(at(9, 0), at(23, 0))];
        let periods = calc.find_free_periods(&events, now);
        assert_eq!(periods, vec![FreePeriod::new(at(8, 0), at(9, 0)).unwrap()]);
    }

    fn arb_disjoint_intervals() -> impl Strategy<Value = Vec<(i64, i64)>> {
        // (gap before, length) pairs in minutes, laid end to end
        prop::collection::vec((0i64..180, 1i64..180), 0..12).prop_map(|pairs| {
            let mut offset = 0;
            pairs
                .into_iter()
                .map(|(gap, len)| {
                    let start = offset + gap;
                    offset = start + len;
                    (start, offset)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn free_periods_cover_horizon_minus_busy_time(intervals in arb_disjoint_intervals()) {
            let now = at(0, 0);
            let calc = GapCalculator::new();
            let horizon_end = now + calc.horizon();
            let busy: Vec<BusyInterval> = intervals
                .iter()
                .map(|&(s, e)| BusyInterval::new(now + Duration::minutes(s), now + Duration::minutes(e)))
                .collect();

            let periods = calc.find_free_periods(&busy, now);

            let mut free_minutes = 0;
            for (i, period) in periods.iter().enumerate() {
                prop_assert!(period.end > period.start);
                prop_assert!(period.start >= now && period.end <= horizon_end);
                if i > 0 {
                    prop_assert!(period.start > periods[i - 1].end);
                }
                for b in &busy {
                    prop_assert!(period.end <= b.start || period.start >= b.end);
                }
                free_minutes += period.duration_minutes();
            }

            let busy_minutes: i64 = busy
                .iter()
                .map(|b| {
                    let s = b.start.min(horizon_end);
                    let e = b.end.min(horizon_end);
                    (e - s).num_minutes()
                })
                .sum();
            prop_assert_eq!(free_minutes + busy_minutes, calc.horizon().num_minutes());
        }
    }
}
