//! Configuration loading and management

mod io;

pub use io::DEFAULT_CONFIG;

use anyhow::{Result, bail};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::progress::{Calendar, LevelCurve, MAX_LEVEL_CAP};

/// Longest accepted mission lifetime or reminder lead (one leap year)
pub const MAX_WINDOW_HOURS: i64 = 366 * 24;

/// Longest accepted reminder delay or topic TTL
pub const MAX_WINDOW_MINUTES: i64 = MAX_WINDOW_HOURS * 60;

/// Engine configuration (`~/.fluency/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed UTC offset (minutes east) for day/week boundaries.
    /// Unset uses the system time zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    /// Level curve
    #[serde(default)]
    pub levels: LevelSettings,

    /// XP rewards and history retention
    #[serde(default)]
    pub xp: XpSettings,

    /// Streak milestones and history retention
    #[serde(default)]
    pub streaks: StreakSettings,

    /// Daily mission pool
    #[serde(default)]
    pub missions: MissionSettings,

    /// Streak reminder scheduling
    #[serde(default)]
    pub reminders: ReminderSettings,

    /// Seasonal event behavior
    #[serde(default)]
    pub seasonal: SeasonalSettings,

    /// Minigame result retention
    #[serde(default)]
    pub minigames: MinigameSettings,

    /// Topic cache
    #[serde(default)]
    pub cache: CacheSettings,
}

impl EngineConfig {
    pub fn calendar(&self) -> Calendar {
        Calendar::from_offset_minutes(self.utc_offset_minutes)
    }

    pub fn level_curve(&self) -> LevelCurve {
        LevelCurve::from_settings(&self.levels)
    }

    /// Reject values the engine cannot turn into levels or durations
    pub fn validate(&self) -> Result<()> {
        check_range("levels.max_level", i64::from(self.levels.max_level), 1, i64::from(MAX_LEVEL_CAP))?;
        check_range("missions.expiry_hours", self.missions.expiry_hours, 1, MAX_WINDOW_HOURS)?;
        check_range("reminders.daily_lead_hours", self.reminders.daily_lead_hours, 0, MAX_WINDOW_HOURS)?;
        check_range("reminders.weekly_lead_hours", self.reminders.weekly_lead_hours, 0, MAX_WINDOW_HOURS)?;
        check_range(
            "reminders.min_delay_minutes",
            self.reminders.min_delay_minutes,
            0,
            MAX_WINDOW_MINUTES,
        )?;
        check_range("cache.topic_ttl_minutes", self.cache.topic_ttl_minutes, 0, MAX_WINDOW_MINUTES)?;
        Ok(())
    }
}

fn check_range(key: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if !(min..=max).contains(&value) {
        bail!("{} must be between {} and {}, got {}", key, min, max, value);
    }
    Ok(())
}

/// `value` as a duration when it lies in `min..=max`
fn bounded(value: i64, min: i64, max: i64, unit: fn(i64) -> Option<Duration>) -> Option<Duration> {
    (min..=max).contains(&value).then_some(value).and_then(unit)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    /// XP needed to go from level 1 to level 2
    #[serde(default = "default_base_xp")]
    pub base_xp: u64,

    /// Extra XP each following level costs
    #[serde(default = "default_growth_xp")]
    pub growth_xp: u64,

    #[serde(default = "default_max_level")]
    pub max_level: u32,
}

fn default_base_xp() -> u64 {
    100
}

fn default_growth_xp() -> u64 {
    50
}

fn default_max_level() -> u32 {
    50
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            growth_xp: default_growth_xp(),
            max_level: default_max_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpSettings {
    /// Number of grants kept in the XP history
    #[serde(default = "default_xp_history_limit")]
    pub history_limit: usize,

    /// Base XP for a completed session
    #[serde(default = "default_session_xp")]
    pub session_xp: u64,

    /// Bonus XP per day of the current daily streak
    #[serde(default = "default_streak_bonus_per_day")]
    pub streak_bonus_per_day: u64,

    #[serde(default = "default_streak_bonus_cap")]
    pub streak_bonus_cap: u64,

    /// XP for a minigame with a non-zero score
    #[serde(default = "default_minigame_xp")]
    pub minigame_xp: u64,
}

fn default_xp_history_limit() -> usize {
    100
}

fn default_session_xp() -> u64 {
    10
}

fn default_streak_bonus_per_day() -> u64 {
    2
}

fn default_streak_bonus_cap() -> u64 {
    20
}

fn default_minigame_xp() -> u64 {
    5
}

impl Default for XpSettings {
    fn default() -> Self {
        Self {
            history_limit: default_xp_history_limit(),
            session_xp: default_session_xp(),
            streak_bonus_per_day: default_streak_bonus_per_day(),
            streak_bonus_cap: default_streak_bonus_cap(),
            minigame_xp: default_minigame_xp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakSettings {
    /// Daily streak lengths reported as milestones
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,

    /// Entries kept per streak history and in the milestone log
    #[serde(default = "default_streak_history_limit")]
    pub history_limit: usize,
}

fn default_milestones() -> Vec<u32> {
    vec![7, 14, 30, 60, 100, 365]
}

fn default_streak_history_limit() -> usize {
    60
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
            history_limit: default_streak_history_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSettings {
    /// Active missions kept in the pool
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Lifetime of a freshly assigned mission
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,
}

fn default_pool_size() -> usize {
    3
}

fn default_expiry_hours() -> i64 {
    24
}

impl MissionSettings {
    /// Lifetime of a new mission. Out-of-range values use the default.
    pub fn expiry(&self) -> Duration {
        bounded(self.expiry_hours, 1, MAX_WINDOW_HOURS, Duration::try_hours)
            .unwrap_or_else(|| Duration::hours(default_expiry_hours()))
    }
}

impl Default for MissionSettings {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            expiry_hours: default_expiry_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Schedule streak reminders after each session
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours before the daily deadline
    #[serde(default = "default_daily_lead_hours")]
    pub daily_lead_hours: i64,

    /// Hours before the weekly deadline
    #[serde(default = "default_weekly_lead_hours")]
    pub weekly_lead_hours: i64,

    /// A reminder whose time already passed fires this many minutes from now
    #[serde(default = "default_min_delay_minutes")]
    pub min_delay_minutes: i64,

    /// Delivered reminders kept for history
    #[serde(default = "default_retained")]
    pub retained: usize,
}

fn default_true() -> bool {
    true
}

fn default_daily_lead_hours() -> i64 {
    4
}

fn default_weekly_lead_hours() -> i64 {
    24
}

fn default_min_delay_minutes() -> i64 {
    5
}

fn default_retained() -> usize {
    20
}

impl ReminderSettings {
    /// Out-of-range values use the default
    pub fn min_delay(&self) -> Duration {
        bounded(self.min_delay_minutes, 0, MAX_WINDOW_MINUTES, Duration::try_minutes)
            .unwrap_or_else(|| Duration::minutes(default_min_delay_minutes()))
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_lead_hours: default_daily_lead_hours(),
            weekly_lead_hours: default_weekly_lead_hours(),
            min_delay_minutes: default_min_delay_minutes(),
            retained: default_retained(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalSettings {
    /// Reset a completed event when its next yearly occurrence is computed.
    /// Off by default: a completed event stays completed for good.
    #[serde(default)]
    pub reopen_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinigameSettings {
    #[serde(default = "default_minigame_history_limit")]
    pub history_limit: usize,
}

fn default_minigame_history_limit() -> usize {
    50
}

impl Default for MinigameSettings {
    fn default() -> Self {
        Self {
            history_limit: default_minigame_history_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_topic_ttl_minutes")]
    pub topic_ttl_minutes: i64,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_topic_ttl_minutes() -> i64 {
    60
}

fn default_max_entries() -> usize {
    64
}

impl CacheSettings {
    /// Out-of-range values use the default
    pub fn ttl(&self) -> Duration {
        bounded(self.topic_ttl_minutes, 0, MAX_WINDOW_MINUTES, Duration::try_minutes)
            .unwrap_or_else(|| Duration::minutes(default_topic_ttl_minutes()))
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            topic_ttl_minutes: default_topic_ttl_minutes(),
            max_entries: default_max_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            utc_offset_minutes = 60

            [missions]
            pool_size = 4

            [seasonal]
            reopen_completed = true
            "#,
        )
        .unwrap();

        assert_eq!(config.missions.pool_size, 4);
        assert_eq!(config.missions.expiry_hours, 24);
        assert!(config.seasonal.reopen_completed);
        assert_eq!(config.levels, LevelSettings::default());
        assert_eq!(config.streaks.milestones, vec![7, 14, 30, 60, 100, 365]);
        assert!(matches!(config.calendar(), Calendar::Fixed(_)));
    }

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_out_of_range_durations_fall_back() {
        let mut config = EngineConfig::default();
        config.missions.expiry_hours = i64::MAX / 1000;
        config.reminders.min_delay_minutes = i64::MIN;
        config.cache.topic_ttl_minutes = i64::MAX;

        assert!(config.validate().is_err());
        assert_eq!(config.missions.expiry(), Duration::hours(24));
        assert_eq!(config.reminders.min_delay(), Duration::minutes(5));
        assert_eq!(config.cache.ttl(), Duration::minutes(60));
    }

    #[test]
    fn test_in_range_durations_kept() {
        let mut config = EngineConfig::default();
        config.missions.expiry_hours = 48;
        config.reminders.min_delay_minutes = 0;
        assert_eq!(config.missions.expiry(), Duration::hours(48));
        assert_eq!(config.reminders.min_delay(), Duration::zero());
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config: EngineConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
