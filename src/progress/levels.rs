//! XP and Level system
//!
//! Level 1 starts at 0 XP. Going from level `n` to `n + 1` costs
//! `base_xp + growth_xp * (n - 1)`; cumulative thresholds are precomputed up
//! to the level cap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::history::push_capped;
use crate::config::LevelSettings;

/// Highest level a curve will precompute
pub const MAX_LEVEL_CAP: u32 = 1000;

/// Cumulative XP thresholds per level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCurve {
    /// `thresholds[i]` is the total XP at which level `i + 1` starts
    thresholds: Vec<u64>,
}

impl LevelCurve {
    pub fn new(base_xp: u64, growth_xp: u64, max_level: u32) -> Self {
        let base_xp = base_xp.max(1);
        let max_level = max_level.clamp(1, MAX_LEVEL_CAP);
        let mut thresholds = Vec::with_capacity(max_level as usize);
        let mut cumulative = 0u64;
        thresholds.push(0);
        for level in 1..u64::from(max_level) {
            let step = base_xp.saturating_add(growth_xp.saturating_mul(level - 1));
            cumulative = cumulative.saturating_add(step);
            thresholds.push(cumulative);
        }
        Self { thresholds }
    }

    pub fn from_settings(settings: &LevelSettings) -> Self {
        Self::new(settings.base_xp, settings.growth_xp, settings.max_level)
    }

    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Total XP at which `level` starts (None above the cap)
    pub fn threshold(&self, level: u32) -> Option<u64> {
        level
            .checked_sub(1)
            .and_then(|idx| self.thresholds.get(idx as usize))
            .copied()
    }

    /// Map a total to its level and the progress inside it
    pub fn resolve(&self, total: u64) -> LevelInfo {
        // thresholds[0] == 0, so at least one entry is <= total
        let reached = self.thresholds.partition_point(|&t| t <= total).max(1);
        let level = reached as u32;
        let floor = self.thresholds[reached - 1];
        let xp_into_level = total - floor;

        match self.thresholds.get(reached) {
            Some(&next) => {
                let span = next - floor;
                LevelInfo {
                    level,
                    level_floor: floor,
                    xp_into_level,
                    xp_for_next_level: span,
                    progress: if span == 0 {
                        1.0
                    } else {
                        xp_into_level as f64 / span as f64
                    },
                }
            }
            None => LevelInfo {
                level,
                level_floor: floor,
                xp_into_level,
                xp_for_next_level: 0,
                progress: 1.0,
            },
        }
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::from_settings(&LevelSettings::default())
    }
}

/// Level snapshot derived from a total
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    pub level: u32,
    /// Total XP at which the current level started
    pub level_floor: u64,
    pub xp_into_level: u64,
    /// XP span of the current level (0 at the cap)
    pub xp_for_next_level: u64,
    /// 0.0 - 1.0, pinned to 1.0 at the cap
    pub progress: f64,
}

impl LevelInfo {
    pub fn is_max_level(&self) -> bool {
        self.xp_for_next_level == 0
    }
}

/// What produced an XP grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    Session,
    StreakBonus,
    Mission,
    Badge,
    SeasonalEvent,
    Minigame,
    Manual,
}

impl XpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::StreakBonus => "streak_bonus",
            Self::Mission => "mission",
            Self::Badge => "badge",
            Self::SeasonalEvent => "seasonal_event",
            Self::Minigame => "minigame",
            Self::Manual => "manual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "session" => Some(Self::Session),
            "streak_bonus" => Some(Self::StreakBonus),
            "mission" => Some(Self::Mission),
            "badge" => Some(Self::Badge),
            "seasonal_event" => Some(Self::SeasonalEvent),
            "minigame" => Some(Self::Minigame),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// One recorded XP grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpHistoryEntry {
    pub amount: u64,
    pub source: XpSource,
    pub total_after: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub granted_at: DateTime<Utc>,
}

/// Persisted XP state. `level` and `level_progress` are derived from `total`
/// and only ever written by [`XpState::refresh_level`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpState {
    pub total: u64,
    pub level: u32,
    pub level_progress: f64,
    pub history: Vec<XpHistoryEntry>,
}

impl Default for XpState {
    fn default() -> Self {
        Self {
            total: 0,
            level: 1,
            level_progress: 0.0,
            history: Vec::new(),
        }
    }
}

impl XpState {
    pub fn refresh_level(&mut self, curve: &LevelCurve) -> LevelInfo {
        let info = curve.resolve(self.total);
        self.level = info.level;
        self.level_progress = info.progress;
        info
    }
}

/// Result of a grant, returned even when nothing was added
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpGrant {
    pub amount: u64,
    pub source: XpSource,
    pub total: u64,
    pub previous_level: u32,
    pub new_level: u32,
    pub xp_into_level: u64,
    pub xp_for_next_level: u64,
    pub progress: f64,
}

impl XpGrant {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

/// Add XP to the state.
///
/// `amount` is rounded; NaN, infinite, zero or negative amounts leave the
/// total untouched and still return a consistent snapshot.
pub fn grant_xp(
    xp: &mut XpState,
    curve: &LevelCurve,
    amount: f64,
    source: XpSource,
    metadata: Option<serde_json::Value>,
    now: DateTime<Utc>,
    history_limit: usize,
) -> XpGrant {
    let previous_level = curve.resolve(xp.total).level;
    let rounded = amount.round();
    let granted = if rounded.is_finite() && rounded > 0.0 {
        // saturating float-to-int cast
        rounded as u64
    } else {
        0
    };

    if granted > 0 {
        xp.total = xp.total.saturating_add(granted);
        push_capped(
            &mut xp.history,
            XpHistoryEntry {
                amount: granted,
                source,
                total_after: xp.total,
                metadata,
                granted_at: now,
            },
            history_limit,
        );
    } else {
        debug!(amount, source = source.as_str(), "Ignoring non-positive XP grant");
    }

    let info = xp.refresh_level(curve);
    if info.level > previous_level {
        info!(
            from = previous_level,
            to = info.level,
            total = xp.total,
            "Level up"
        );
    }

    XpGrant {
        amount: granted,
        source,
        total: xp.total,
        previous_level,
        new_level: info.level,
        xp_into_level: info.xp_into_level,
        xp_for_next_level: info.xp_for_next_level,
        progress: info.progress,
    }
}

/// Streak bonus for a session: `per_day` XP per streak day, capped
pub fn streak_bonus(streak_days: u32, per_day: u64, cap: u64) -> u64 {
    u64::from(streak_days).saturating_mul(per_day).min(cap)
}
