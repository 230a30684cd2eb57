//! Policy deciding which free periods are workable.

use chrono::{Datelike, Local, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use super::gap::FreePeriod;
use crate::error::ValidationError;

/// Thresholds a free period must meet before a task is placed in it.
///
/// Hours are local 24-hour clock values and both bounds are inclusive, so
/// with the defaults a period starting at 14:59 passes and one starting at
/// 15:00 does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsabilityPolicy {
    #[serde(default = "default_min_duration_minutes")]
    pub min_duration_minutes: i64,
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<Weekday>,
    #[serde(default = "default_earliest_hour")]
    pub earliest_hour: u32,
    #[serde(default = "default_latest_hour")]
    pub latest_hour: u32,
}

fn default_min_duration_minutes() -> i64 {
    30
}
fn default_weekdays() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}
fn default_earliest_hour() -> u32 {
    9
}
fn default_latest_hour() -> u32 {
    14
}

impl Default for UsabilityPolicy {
    fn default() -> Self {
        Self {
            min_duration_minutes: default_min_duration_minutes(),
            weekdays: default_weekdays(),
            earliest_hour: default_earliest_hour(),
            latest_hour: default_latest_hour(),
        }
    }
}

impl UsabilityPolicy {
    /// Evaluate `period` against the machine's local timezone.
    pub fn is_usable(&self, period: &FreePeriod) -> bool {
        self.is_usable_in(period, &Local)
    }

    /// Evaluate `period` with weekday and hour taken in `tz`.
    pub fn is_usable_in<Tz: TimeZone>(&self, period: &FreePeriod, tz: &Tz) -> bool {
        if period.duration_minutes() < self.min_duration_minutes {
            return false;
        }

        let start = period.start.with_timezone(tz);
        if !self.weekdays.contains(&start.weekday()) {
            return false;
        }

        let hour = start.hour();
        hour >= self.earliest_hour && hour <= self.latest_hour
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_duration_minutes < 0 {
            return Err(ValidationError::InvalidValue {
                field: "min_duration_minutes".into(),
                message: "must not be negative".into(),
            });
        }
        if self.latest_hour > 23 {
            return Err(ValidationError::InvalidValue {
                field: "latest_hour".into(),
                message: format!("{} is not an hour of the day", self.latest_hour),
            });
        }
        if self.earliest_hour > self.latest_hour {
            return Err(ValidationError::InvalidValue {
                field: "earliest_hour".into(),
                message: format!(
                    "{} is after latest_hour {}",
                    self.earliest_hour, self.latest_hour
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset, Utc};

    // 2023-11-20 is a Monday
    fn monday(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 20, h, m, 0).unwrap()
    }

    fn period(start: DateTime<Utc>, minutes: i64) -> FreePeriod {
        FreePeriod::new(start, start + Duration::minutes(minutes)).unwrap()
    }

    #[test]
    fn test_duration_threshold() {
        let policy = UsabilityPolicy::default();
        assert!(policy.is_usable_in(&period(monday(10, 0), 30), &Utc));
        assert!(!policy.is_usable_in(&period(monday(10, 0), 29), &Utc));
    }

    #[test]
    fn test_weekend_rejected() {
        let policy = UsabilityPolicy::default();
        let saturday = Utc.with_ymd_and_hms(2023, 11, 25, 10, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2023, 11, 26, 10, 0, 0).unwrap();
        assert!(!policy.is_usable_in(&period(saturday, 60), &Utc));
        assert!(!policy.is_usable_in(&period(sunday, 60), &Utc));
    }

    #[test]
    fn test_hour_bounds_inclusive() {
        let policy = UsabilityPolicy::default();
        assert!(!policy.is_usable_in(&period(monday(8, 59), 60), &Utc));
        assert!(policy.is_usable_in(&period(monday(9, 0), 60), &Utc));
        assert!(policy.is_usable_in(&period(monday(14, 59), 60), &Utc));
        assert!(!policy.is_usable_in(&period(monday(15, 0), 60), &Utc));
    }

    #[test]
    fn test_weekday_and_hour_use_local_offset() {
        let policy = UsabilityPolicy::default();
        // Monday 02:00 UTC is Sunday 19:00 at UTC-7
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        assert!(!policy.is_usable_in(&period(monday(2, 0), 60), &tz));
        // Monday 16:00 UTC is 09:00 at UTC-7
        assert!(policy.is_usable_in(&period(monday(16, 0), 60), &tz));
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = UsabilityPolicy {
            min_duration_minutes: 45,
            weekdays: vec![Weekday::Sat],
            earliest_hour: 6,
            latest_hour: 7,
        };
        let saturday = Utc.with_ymd_and_hms(2023, 11, 25, 6, 30, 0).unwrap();
        assert!(policy.is_usable_in(&period(saturday, 45), &Utc));
        assert!(!policy.is_usable_in(&period(saturday, 44), &Utc));
        assert!(!policy.is_usable_in(&period(monday(6, 30), 60), &Utc));
    }

    #[test]
    fn test_validate() {
        assert!(UsabilityPolicy::default().validate().is_ok());

        let inverted = UsabilityPolicy {
            earliest_hour: 15,
            latest_hour: 9,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let out_of_range = UsabilityPolicy {
            latest_hour: 24,
            ..Default::default()
        };
        assert!(out_of_range.validate().is_err());
    }
}
