//! Badge definitions and the unlock ledger
//!
//! Badges are defined statically with their unlock requirement and reward.
//! The persisted ledger only ever grows: each badge is unlocked at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::state::ProgressState;

/// Unique identifier for each badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeId {
    // Level badges
    Level5,
    Level10,
    Level25,

    // Session badges
    FirstSession,
    TenSessions,
    FiftySessions,
    HundredSessions,

    // Streak badges
    Streak3,
    Streak7,
    Streak30,
    Streak100,

    // Mission badges
    FirstMission,
    TenMissions,
    FiftyMissions,
}

impl BadgeId {
    /// Stable ID stored in the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Level5 => "level_5",
            Self::Level10 => "level_10",
            Self::Level25 => "level_25",
            Self::FirstSession => "first_session",
            Self::TenSessions => "ten_sessions",
            Self::FiftySessions => "fifty_sessions",
            Self::HundredSessions => "hundred_sessions",
            Self::Streak3 => "streak_3",
            Self::Streak7 => "streak_7",
            Self::Streak30 => "streak_30",
            Self::Streak100 => "streak_100",
            Self::FirstMission => "first_mission",
            Self::TenMissions => "ten_missions",
            Self::FiftyMissions => "fifty_missions",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    pub fn all() -> &'static [BadgeId] {
        &[
            Self::Level5,
            Self::Level10,
            Self::Level25,
            Self::FirstSession,
            Self::TenSessions,
            Self::FiftySessions,
            Self::HundredSessions,
            Self::Streak3,
            Self::Streak7,
            Self::Streak30,
            Self::Streak100,
            Self::FirstMission,
            Self::TenMissions,
            Self::FiftyMissions,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeCategory {
    Level,
    Sessions,
    Streak,
    Missions,
}

impl BadgeCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Level => "Levels",
            Self::Sessions => "Sessions",
            Self::Streak => "Streaks",
            Self::Missions => "Missions",
        }
    }
}

/// Unlock condition, each a lower bound on one context value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRequirement {
    Level(u32),
    TotalSessions(u64),
    DailyStreak(u32),
    MissionsCompleted(u64),
}

impl BadgeRequirement {
    pub fn is_met(&self, context: &BadgeContext) -> bool {
        match *self {
            Self::Level(level) => context.level >= level,
            Self::TotalSessions(n) => context.total_sessions >= n,
            Self::DailyStreak(days) => context.daily_streak >= days,
            Self::MissionsCompleted(n) => context.missions_completed >= n,
        }
    }
}

/// Badge definition with all metadata
#[derive(Debug, Clone)]
pub struct Badge {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: BadgeCategory,
    pub requirement: BadgeRequirement,
    pub xp_reward: u64,
}

impl Badge {
    pub fn get(id: BadgeId) -> Option<&'static Badge> {
        BADGES.iter().find(|b| b.id == id)
    }
}

/// All badge definitions, in evaluation order
pub static BADGES: &[Badge] = &[
    // === LEVEL ===
    Badge {
        id: BadgeId::Level5,
        name: "Finding Your Voice",
        description: "Reach level 5",
        icon: "🌱",
        category: BadgeCategory::Level,
        requirement: BadgeRequirement::Level(5),
        xp_reward: 25,
    },
    Badge {
        id: BadgeId::Level10,
        name: "Conversationalist",
        description: "Reach level 10",
        icon: "🌿",
        category: BadgeCategory::Level,
        requirement: BadgeRequirement::Level(10),
        xp_reward: 50,
    },
    Badge {
        id: BadgeId::Level25,
        name: "Silver Tongue",
        description: "Reach level 25",
        icon: "🌳",
        category: BadgeCategory::Level,
        requirement: BadgeRequirement::Level(25),
        xp_reward: 150,
    },
    // === SESSIONS ===
    Badge {
        id: BadgeId::FirstSession,
        name: "First Words",
        description: "Complete your first session",
        icon: "💬",
        category: BadgeCategory::Sessions,
        requirement: BadgeRequirement::TotalSessions(1),
        xp_reward: 10,
    },
    Badge {
        id: BadgeId::TenSessions,
        name: "Regular",
        description: "Complete 10 sessions",
        icon: "📚",
        category: BadgeCategory::Sessions,
        requirement: BadgeRequirement::TotalSessions(10),
        xp_reward: 25,
    },
    Badge {
        id: BadgeId::FiftySessions,
        name: "Dedicated Learner",
        description: "Complete 50 sessions",
        icon: "🎓",
        category: BadgeCategory::Sessions,
        requirement: BadgeRequirement::TotalSessions(50),
        xp_reward: 75,
    },
    Badge {
        id: BadgeId::HundredSessions,
        name: "Centurion",
        description: "Complete 100 sessions",
        icon: "🏛️",
        category: BadgeCategory::Sessions,
        requirement: BadgeRequirement::TotalSessions(100),
        xp_reward: 150,
    },
    // === STREAK ===
    Badge {
        id: BadgeId::Streak3,
        name: "Warming Up",
        description: "Practice 3 days in a row",
        icon: "🔥",
        category: BadgeCategory::Streak,
        requirement: BadgeRequirement::DailyStreak(3),
        xp_reward: 15,
    },
    Badge {
        id: BadgeId::Streak7,
        name: "Week Streak",
        description: "Practice 7 days in a row",
        icon: "📅",
        category: BadgeCategory::Streak,
        requirement: BadgeRequirement::DailyStreak(7),
        xp_reward: 40,
    },
    Badge {
        id: BadgeId::Streak30,
        name: "Habit Formed",
        description: "Practice 30 days in a row",
        icon: "🗓️",
        category: BadgeCategory::Streak,
        requirement: BadgeRequirement::DailyStreak(30),
        xp_reward: 120,
    },
    Badge {
        id: BadgeId::Streak100,
        name: "Unstoppable",
        description: "Practice 100 days in a row",
        icon: "💎",
        category: BadgeCategory::Streak,
        requirement: BadgeRequirement::DailyStreak(100),
        xp_reward: 300,
    },
    // === MISSIONS ===
    Badge {
        id: BadgeId::FirstMission,
        name: "On a Mission",
        description: "Complete your first mission",
        icon: "🎯",
        category: BadgeCategory::Missions,
        requirement: BadgeRequirement::MissionsCompleted(1),
        xp_reward: 10,
    },
    Badge {
        id: BadgeId::TenMissions,
        name: "Mission Runner",
        description: "Complete 10 missions",
        icon: "🏃",
        category: BadgeCategory::Missions,
        requirement: BadgeRequirement::MissionsCompleted(10),
        xp_reward: 40,
    },
    Badge {
        id: BadgeId::FiftyMissions,
        name: "Mission Control",
        description: "Complete 50 missions",
        icon: "🚀",
        category: BadgeCategory::Missions,
        requirement: BadgeRequirement::MissionsCompleted(50),
        xp_reward: 120,
    },
];

/// Ledger entry. Persisted entries are always unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub id: String,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Values the badge requirements are checked against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeContext {
    pub level: u32,
    pub total_sessions: u64,
    pub daily_streak: u32,
    pub missions_completed: u64,
}

impl BadgeContext {
    pub fn from_state(state: &ProgressState) -> Self {
        Self {
            level: state.xp.level,
            total_sessions: state.totals.sessions,
            daily_streak: state.streaks.daily.current,
            missions_completed: state.totals.missions_completed,
        }
    }
}

/// A badge unlocked by the latest evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedBadge {
    pub id: BadgeId,
    pub name: &'static str,
    pub icon: &'static str,
    pub xp_reward: u64,
    pub unlocked_at: DateTime<Utc>,
}

/// Append every badge whose requirement is met and that is not yet in the ledger.
///
/// Catalog order decides the order of the returned badges.
pub fn evaluate_badges(
    ledger: &mut Vec<BadgeProgress>,
    context: &BadgeContext,
    now: DateTime<Utc>,
) -> Vec<UnlockedBadge> {
    let mut newly_unlocked = Vec::new();

    for badge in BADGES {
        if ledger.iter().any(|entry| entry.id == badge.id.as_str()) {
            continue;
        }
        if !badge.requirement.is_met(context) {
            continue;
        }

        ledger.push(BadgeProgress {
            id: badge.id.as_str().to_string(),
            unlocked_at: Some(now),
        });
        info!(badge = badge.id.as_str(), name = badge.name, "Badge unlocked");
        newly_unlocked.push(UnlockedBadge {
            id: badge.id,
            name: badge.name,
            icon: badge.icon,
            xp_reward: badge.xp_reward,
            unlocked_at: now,
        });
    }

    newly_unlocked
}

/// Catalog entry merged with the learner's ledger
#[derive(Debug, Clone)]
pub struct BadgeView {
    pub badge: &'static Badge,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl BadgeView {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Every catalog badge with its unlock time, if any
pub fn catalog(state: &ProgressState) -> Vec<BadgeView> {
    BADGES
        .iter()
        .map(|badge| BadgeView {
            badge,
            unlocked_at: state
                .badges
                .iter()
                .find(|entry| entry.id == badge.id.as_str())
                .and_then(|entry| entry.unlocked_at),
        })
        .collect()
}
