// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use tally_config::model::ScheduleConfig;
use tally_core::TallyError;

/// When a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every `period`, first run one period after start.
    Every(Duration),
    /// Once a week at a local wall-clock time.
    WeeklyAt { weekday: Weekday, time: NaiveTime },
}

impl Schedule {
    pub fn every_minutes(minutes: u64) -> Self {
        Schedule::Every(Duration::from_secs(minutes * 60))
    }

    /// The weekly digest slot from `[schedule]`.
    pub fn weekly_digest(config: &ScheduleConfig) -> Result<Self, TallyError> {
        Ok(Schedule::WeeklyAt {
            weekday: config.parsed_weekday().map_err(TallyError::Config)?,
            time: config.parsed_time().map_err(TallyError::Config)?,
        })
    }

    /// Delay from `now` (local time) until the next run.
    pub fn delay_from(&self, now: NaiveDateTime) -> Duration {
        match *self {
            Schedule::Every(period) => period,
            Schedule::WeeklyAt { weekday, time } => (next_weekly(now, weekday, time) - now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// First `weekday` at `time` strictly after `now`.
pub fn next_weekly(now: NaiveDateTime, weekday: Weekday, time: NaiveTime) -> NaiveDateTime {
    let days_ahead =
        (7 + weekday.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let candidate = (now.date() + Days::new(u64::from(days_ahead))).and_time(time);
    if candidate > now {
        candidate
    } else {
        candidate + TimeDelta::days(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn eight_pm() -> NaiveTime {
        NaiveTime::from_hms_opt(20, 0, 0).unwrap()
    }

    #[test]
    fn next_sunday_from_midweek() {
        // 2026-10-14 is a Wednesday.
        let next = next_weekly(at(2026, 10, 14, 9, 0), Weekday::Sun, eight_pm());
        assert_eq!(next, at(2026, 10, 18, 20, 0));
    }

    #[test]
    fn same_day_before_slot() {
        let next = next_weekly(at(2026, 10, 18, 19, 59), Weekday::Sun, eight_pm());
        assert_eq!(next, at(2026, 10, 18, 20, 0));
    }

    #[test]
    fn same_day_at_or_after_slot_rolls_a_week() {
        assert_eq!(
            next_weekly(at(2026, 10, 18, 20, 0), Weekday::Sun, eight_pm()),
            at(2026, 10, 25, 20, 0)
        );
        assert_eq!(
            next_weekly(at(2026, 10, 18, 23, 0), Weekday::Sun, eight_pm()),
            at(2026, 10, 25, 20, 0)
        );
    }

    #[test]
    fn weekly_delay_is_exact() {
        let schedule = Schedule::WeeklyAt {
            weekday: Weekday::Sun,
            time: eight_pm(),
        };
        let delay = schedule.delay_from(at(2026, 10, 18, 18, 0));
        assert_eq!(delay, Duration::from_secs(2 * 3600));
    }

    #[test]
    fn every_minutes_converts() {
        assert_eq!(
            Schedule::every_minutes(20).delay_from(at(2026, 1, 1, 0, 0)),
            Duration::from_secs(1200)
        );
    }

    #[test]
    fn weekly_digest_from_config() {
        let config = ScheduleConfig::default();
        assert_eq!(
            Schedule::weekly_digest(&config).unwrap(),
            Schedule::WeeklyAt {
                weekday: Weekday::Sun,
                time: eight_pm(),
            }
        );

        let bad = ScheduleConfig {
            digest_weekday: "someday".into(),
            ..ScheduleConfig::default()
        };
        assert!(matches!(
            Schedule::weekly_digest(&bad),
            Err(TallyError::Config(_))
        ));
    }
}
