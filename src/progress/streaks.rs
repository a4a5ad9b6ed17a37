//! Streak tracking system
//!
//! Tracks daily and weekly continuation streaks. Each period is identified
//! by a token: the local calendar date for daily streaks, the Monday that
//! starts the ISO week for weekly streaks.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::calendar::Calendar;
use super::history::push_capped;
use crate::config::StreakSettings;

/// Type of streak being tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakPeriod {
    /// Consecutive local calendar days with at least one session
    Daily,
    /// Consecutive ISO weeks with at least one session
    Weekly,
}

impl StreakPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily Streak",
            Self::Weekly => "Weekly Streak",
        }
    }

    pub fn all() -> &'static [StreakPeriod] {
        &[Self::Daily, Self::Weekly]
    }

    /// Period token for a timestamp
    pub fn token(&self, calendar: &Calendar, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Daily => calendar.local_date(at),
            Self::Weekly => calendar.week_start(at),
        }
    }

    /// Distance in days between two consecutive tokens
    pub fn step_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
        }
    }
}

/// Why a streak counter moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First counted period
    Start,
    /// Session in the period right after the last one
    Increment,
    /// Session after one or more missed periods
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakHistoryEntry {
    pub date: NaiveDate,
    pub delta: i64,
    pub reason: StreakChange,
}

/// Counter state for one period type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakStats {
    pub current: u32,
    pub longest: u32,
    pub last_completed: Option<NaiveDate>,
    pub history: Vec<StreakHistoryEntry>,
}

impl StreakStats {
    /// Count a session whose period token is `token`.
    ///
    /// Returns `None` when nothing changed: the period was already counted
    /// or the token is older than the last counted one.
    pub fn record(
        &mut self,
        token: NaiveDate,
        period: StreakPeriod,
        history_limit: usize,
    ) -> Option<StreakChange> {
        let change = match self.last_completed {
            None => StreakChange::Start,
            Some(last) => {
                let gap = (token - last).num_days();
                if gap < period.step_days() {
                    return None;
                }
                if gap == period.step_days() {
                    StreakChange::Increment
                } else {
                    StreakChange::Reset
                }
            }
        };

        let before = self.current;
        self.current = match change {
            StreakChange::Start => self.current.max(1),
            StreakChange::Increment => self.current.saturating_add(1),
            StreakChange::Reset => 1,
        };
        self.longest = self.longest.max(self.current);
        self.last_completed = Some(token);

        push_capped(
            &mut self.history,
            StreakHistoryEntry {
                date: token,
                delta: i64::from(self.current) - i64::from(before),
                reason: change,
            },
            history_limit,
        );

        Some(change)
    }

    /// Streak is alive if the current or the previous period was counted
    pub fn is_active(&self, today: NaiveDate, period: StreakPeriod) -> bool {
        match self.last_completed {
            Some(last) => (today - last).num_days() <= period.step_days(),
            None => false,
        }
    }

    /// Instant at which the streak breaks unless a session happens first
    pub fn deadline(&self, period: StreakPeriod, calendar: &Calendar) -> Option<DateTime<Utc>> {
        self.last_completed
            .map(|last| calendar.start_of_day(last + Duration::days(period.step_days())))
    }
}

/// A daily streak length reached at a configured milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub value: u32,
    pub date: NaiveDate,
    pub reached_at: DateTime<Utc>,
}

/// Streak data for both periods plus the milestone log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakState {
    pub daily: StreakStats,
    pub weekly: StreakStats,
    pub milestones: Vec<StreakMilestone>,
}

impl StreakState {
    pub fn get(&self, period: StreakPeriod) -> &StreakStats {
        match period {
            StreakPeriod::Daily => &self.daily,
            StreakPeriod::Weekly => &self.weekly,
        }
    }

    pub fn get_mut(&mut self, period: StreakPeriod) -> &mut StreakStats {
        match period {
            StreakPeriod::Daily => &mut self.daily,
            StreakPeriod::Weekly => &mut self.weekly,
        }
    }
}

/// Deadlines after which each streak breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakDeadlines {
    pub daily: DateTime<Utc>,
    pub weekly: DateTime<Utc>,
}

impl StreakDeadlines {
    pub fn get(&self, period: StreakPeriod) -> DateTime<Utc> {
        match period {
            StreakPeriod::Daily => self.daily,
            StreakPeriod::Weekly => self.weekly,
        }
    }
}

/// Outcome of counting one session against both streaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub daily: Option<StreakChange>,
    pub weekly: Option<StreakChange>,
    pub daily_current: u32,
    pub weekly_current: u32,
    /// Milestone value reached by this session, if any
    pub milestone: Option<u32>,
    pub deadlines: StreakDeadlines,
}

/// Count a session at `at` against the daily and weekly streaks.
pub fn update_streaks(
    streaks: &mut StreakState,
    at: DateTime<Utc>,
    calendar: &Calendar,
    settings: &StreakSettings,
) -> StreakUpdate {
    let daily_token = StreakPeriod::Daily.token(calendar, at);
    let weekly_token = StreakPeriod::Weekly.token(calendar, at);

    let daily_before = streaks.daily.current;
    let daily = streaks
        .daily
        .record(daily_token, StreakPeriod::Daily, settings.history_limit);
    let weekly = streaks
        .weekly
        .record(weekly_token, StreakPeriod::Weekly, settings.history_limit);

    debug!(
        daily = ?daily,
        weekly = ?weekly,
        daily_current = streaks.daily.current,
        weekly_current = streaks.weekly.current,
        "Updated streaks"
    );

    let milestone = if daily.is_some() && streaks.daily.current != daily_before {
        detect_milestone(streaks.daily.current, &settings.milestones)
    } else {
        None
    };

    if let Some(value) = milestone {
        info!(value, "Daily streak milestone reached");
        push_capped(
            &mut streaks.milestones,
            StreakMilestone {
                value,
                date: daily_token,
                reached_at: at,
            },
            settings.history_limit,
        );
    }

    // Deadlines follow the latest counted period, so an out-of-order
    // session cannot move them backwards.
    let deadlines = StreakDeadlines {
        daily: streaks
            .daily
            .deadline(StreakPeriod::Daily, calendar)
            .unwrap_or_else(|| calendar.next_day_start(at)),
        weekly: streaks
            .weekly
            .deadline(StreakPeriod::Weekly, calendar)
            .unwrap_or_else(|| calendar.next_week_start(at)),
    };

    StreakUpdate {
        daily,
        weekly,
        daily_current: streaks.daily.current,
        weekly_current: streaks.weekly.current,
        milestone,
        deadlines,
    }
}

/// Milestone matching `current` exactly
pub fn detect_milestone(current: u32, milestones: &[u32]) -> Option<u32> {
    milestones.iter().copied().find(|&m| m == current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seven_consecutive_days() {
        let cal = Calendar::utc();
        let settings = StreakSettings::default();
        let mut streaks = StreakState::default();
        let mut milestones = Vec::new();

        for day in 1..=7 {
            let update = update_streaks(&mut streaks, at(2024, 4, day, 9), &cal, &settings);
            milestones.extend(update.milestone);
        }

        assert_eq!(streaks.daily.current, 7);
        assert_eq!(streaks.daily.longest, 7);
        assert_eq!(milestones, vec![7]);
        assert_eq!(streaks.milestones.len(), 1);

        // Second session the same day changes nothing
        let again = update_streaks(&mut streaks, at(2024, 4, 7, 21), &cal, &settings);
        assert_eq!(again.daily, None);
        assert_eq!(again.milestone, None);
        assert_eq!(streaks.daily.current, 7);
    }

    #[test]
    fn test_gap_resets_but_keeps_longest() {
        let cal = Calendar::utc();
        let settings = StreakSettings::default();
        let mut streaks = StreakState::default();

        for day in 1..=4 {
            update_streaks(&mut streaks, at(2024, 4, day, 9), &cal, &settings);
        }
        // Skip the 5th and 6th
        let update = update_streaks(&mut streaks, at(2024, 4, 7, 9), &cal, &settings);

        assert_eq!(update.daily, Some(StreakChange::Reset));
        assert_eq!(streaks.daily.current, 1);
        assert_eq!(streaks.daily.longest, 4);
        let last = streaks.daily.history.last().unwrap();
        assert_eq!(last.reason, StreakChange::Reset);
        assert_eq!(last.delta, -3);
    }

    #[test]
    fn test_out_of_order_session_is_ignored() {
        let mut stats = StreakStats::default();
        stats.record(date(2024, 4, 10), StreakPeriod::Daily, 10);
        stats.record(date(2024, 4, 11), StreakPeriod::Daily, 10);
        let snapshot = stats.clone();

        assert_eq!(stats.record(date(2024, 4, 9), StreakPeriod::Daily, 10), None);
        assert_eq!(stats, snapshot);
    }

    #[test]
    fn test_weekly_streak_across_weeks() {
        let cal = Calendar::utc();
        let settings = StreakSettings::default();
        let mut streaks = StreakState::default();

        // Monday and Sunday of the same ISO week
        update_streaks(&mut streaks, at(2024, 1, 1, 9), &cal, &settings);
        let same_week = update_streaks(&mut streaks, at(2024, 1, 7, 9), &cal, &settings);
        assert_eq!(same_week.weekly, None);
        assert_eq!(streaks.weekly.current, 1);

        // Following Wednesday
        let next_week = update_streaks(&mut streaks, at(2024, 1, 10, 9), &cal, &settings);
        assert_eq!(next_week.weekly, Some(StreakChange::Increment));
        assert_eq!(streaks.weekly.current, 2);

        // Skip a full week
        let gap = update_streaks(&mut streaks, at(2024, 1, 24, 9), &cal, &settings);
        assert_eq!(gap.weekly, Some(StreakChange::Reset));
        assert_eq!(streaks.weekly.current, 1);
        assert_eq!(streaks.weekly.longest, 2);
    }

    #[test]
    fn test_start_keeps_existing_count() {
        let mut stats = StreakStats {
            current: 3,
            longest: 3,
            ..Default::default()
        };
        let change = stats.record(date(2024, 5, 1), StreakPeriod::Daily, 10);
        assert_eq!(change, Some(StreakChange::Start));
        assert_eq!(stats.current, 3);
    }

    #[test]
    fn test_deadlines() {
        let cal = Calendar::utc();
        let mut streaks = StreakState::default();
        // Thursday
        let update = update_streaks(
            &mut streaks,
            at(2024, 2, 29, 18),
            &cal,
            &StreakSettings::default(),
        );
        assert_eq!(update.deadlines.daily, at(2024, 3, 1, 0));
        assert_eq!(update.deadlines.weekly, at(2024, 3, 4, 0));
    }

    #[test]
    fn test_local_midnight_boundary() {
        // 22:30 and 00:30 UTC fall on the same local day at UTC+2
        let cal = Calendar::from_offset_minutes(Some(120));
        let settings = StreakSettings::default();
        let mut streaks = StreakState::default();
        update_streaks(
            &mut streaks,
            Utc.with_ymd_and_hms(2024, 6, 1, 22, 30, 0).unwrap(),
            &cal,
            &settings,
        );
        let update = update_streaks(
            &mut streaks,
            Utc.with_ymd_and_hms(2024, 6, 2, 0, 30, 0).unwrap(),
            &cal,
            &settings,
        );
        assert_eq!(update.daily, None);
        assert_eq!(streaks.daily.current, 1);
    }

    #[test]
    fn test_is_active() {
        let mut stats = StreakStats::default();
        assert!(!stats.is_active(date(2024, 5, 2), StreakPeriod::Daily));
        stats.record(date(2024, 5, 1), StreakPeriod::Daily, 10);
        assert!(stats.is_active(date(2024, 5, 1), StreakPeriod::Daily));
        assert!(stats.is_active(date(2024, 5, 2), StreakPeriod::Daily));
        assert!(!stats.is_active(date(2024, 5, 3), StreakPeriod::Daily));
    }
}
