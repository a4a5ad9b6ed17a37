//! Progression engine: XP and levels, streaks, missions, badges, seasonal
//! events and streak reminders.
//!
//! Each submodule holds the rules for one concern as plain functions over
//! the state it owns. [`ProgressEngine`] sequences them into transactions
//! against a [`StateStore`](crate::store::StateStore).

mod badges;
mod cache;
mod calendar;
mod engine;
mod history;
mod levels;
mod minigames;
mod missions;
mod reminders;
pub mod sanitize;
mod seasonal;
mod session;
mod state;
mod streaks;

pub use badges::{
    BADGES, Badge, BadgeCategory, BadgeContext, BadgeId, BadgeProgress, BadgeRequirement,
    BadgeView, UnlockedBadge, catalog, evaluate_badges,
};
pub use cache::TopicCache;
pub use calendar::{Calendar, Clock, ManualClock, SystemClock, date_clamped, week_start_of};
pub use engine::{
    EngineContext, LevelUp, MinigameOutcome, ProgressEngine, ProgressEvent, SessionOutcome,
    apply_session,
};
pub use history::{push_capped, truncate_oldest};
pub use levels::{
    LevelCurve, LevelInfo, MAX_LEVEL_CAP, XpGrant, XpHistoryEntry, XpSource, XpState, grant_xp, streak_bonus,
};
pub use minigames::{MinigameResult, record_minigame_result};
pub use missions::{
    MISSION_TEMPLATES, MissionMetric, MissionObjective, MissionProgress, MissionReward,
    MissionStatus, MissionTemplate, apply_minigame_to_missions, apply_session_to_missions,
    ensure_daily_missions,
};
pub use reminders::{
    Notification, NotificationReminder, NotificationSink, ReminderKind, ReminderPayload,
    deliver_due, due_reminders, notification_for, schedule_streak_reminder,
};
pub use seasonal::{
    Occurrence, SEASONAL_EVENTS, SeasonalEventDef, SeasonalEventProgress, SeasonalMetadata,
    SeasonalStatus, apply_seasonal_progress, ensure_seasonal_events, occurrence_for,
};
pub use session::{CefrLevel, Session};
pub use state::{ProgressState, STATE_VERSION, SessionTotals};
pub use streaks::{
    StreakChange, StreakDeadlines, StreakHistoryEntry, StreakMilestone, StreakPeriod,
    StreakState, StreakStats, StreakUpdate, detect_milestone, update_streaks,
};
