//! Persisted progression state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::badges::BadgeProgress;
use super::levels::XpState;
use super::minigames::MinigameResult;
use super::missions::{MissionProgress, MissionStatus};
use super::reminders::NotificationReminder;
use super::seasonal::SeasonalEventProgress;
use super::streaks::StreakState;

/// Schema version written by this build
pub const STATE_VERSION: u32 = 1;

/// Lifetime counters feeding the badge context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTotals {
    pub sessions: u64,
    pub missions_completed: u64,
    pub minigames: u64,
}

/// Everything the engine persists for one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub version: u32,
    pub xp: XpState,
    pub streaks: StreakState,
    pub missions: Vec<MissionProgress>,
    pub badges: Vec<BadgeProgress>,
    pub seasonal_events: Vec<SeasonalEventProgress>,
    pub reminders: Vec<NotificationReminder>,
    pub minigames: Vec<MinigameResult>,
    pub totals: SessionTotals,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            xp: XpState::default(),
            streaks: StreakState::default(),
            missions: Vec::new(),
            badges: Vec::new(),
            seasonal_events: Vec::new(),
            reminders: Vec::new(),
            minigames: Vec::new(),
            totals: SessionTotals::default(),
            updated_at: None,
        }
    }
}

impl ProgressState {
    pub fn active_missions(&self) -> impl Iterator<Item = &MissionProgress> {
        self.missions
            .iter()
            .filter(|m| m.status == MissionStatus::Active)
    }

    pub fn pending_reminders(&self) -> impl Iterator<Item = &NotificationReminder> {
        self.reminders.iter().filter(|r| r.is_pending())
    }
}
