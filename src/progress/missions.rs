//! Daily missions
//!
//! A pool of time-boxed objectives drawn at random from a static template
//! catalog. Sessions (and minigames) advance matching objectives; a mission
//! completes once every objective reaches its target.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::session::{CefrLevel, Session};
use crate::config::MissionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Active,
    Completed,
    Expired,
}

/// What an objective counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionMetric {
    /// Completed learning sessions
    Sessions,
    /// Finished minigames
    Minigames,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionObjective {
    pub metric: MissionMetric,
    #[serde(default)]
    pub progress: u32,
    pub target: u32,
}

impl MissionObjective {
    pub fn is_done(&self) -> bool {
        self.progress >= self.target
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionReward {
    #[serde(default)]
    pub xp: u64,
}

/// A mission instance in the learner's pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    pub id: String,
    pub template_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Filters; `None` matches anything
    #[serde(default)]
    pub level: Option<CefrLevel>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    pub status: MissionStatus,
    pub objectives: Vec<MissionObjective>,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reward: MissionReward,
}

impl MissionProgress {
    /// Deadline passed without completion
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status != MissionStatus::Completed && self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(MissionObjective::is_done)
    }

    /// Session passes the level/activity/goal filters
    pub fn matches(&self, session: &Session) -> bool {
        self.level.is_none_or(|level| level == session.level)
            && self
                .activity
                .as_deref()
                .is_none_or(|activity| activity == session.activity)
            && self.goal.as_deref().is_none_or(|goal| goal == session.goal)
    }

    fn is_unfiltered(&self) -> bool {
        self.level.is_none() && self.activity.is_none() && self.goal.is_none()
    }

    /// Advance objectives using `metric`. Returns true if this completed the mission.
    fn advance(&mut self, metric: MissionMetric, now: DateTime<Utc>) -> bool {
        if self.status != MissionStatus::Active {
            return false;
        }

        let mut touched = false;
        for objective in self.objectives.iter_mut().filter(|o| o.metric == metric) {
            objective.progress = (objective.progress + 1).min(objective.target);
            touched = true;
        }

        if touched && self.is_complete() {
            self.status = MissionStatus::Completed;
            self.completed_at = Some(now);
            return true;
        }
        false
    }

    /// Combined progress over all objectives (0.0 - 1.0)
    pub fn progress_percent(&self) -> f32 {
        let (done, total) = self
            .objectives
            .iter()
            .fold((0u64, 0u64), |(done, total), o| {
                (
                    done + u64::from(o.progress.min(o.target)),
                    total + u64::from(o.target),
                )
            });
        if total == 0 {
            1.0
        } else {
            done as f32 / total as f32
        }
    }
}

/// Static mission definition
#[derive(Debug, Clone)]
pub struct MissionTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Only offered to learners at this level
    pub level: Option<CefrLevel>,
    pub activity: Option<&'static str>,
    pub goal: Option<&'static str>,
    pub objectives: &'static [(MissionMetric, u32)],
    pub reward_xp: u64,
}

impl MissionTemplate {
    pub fn get(id: &str) -> Option<&'static MissionTemplate> {
        MISSION_TEMPLATES.iter().find(|t| t.id == id)
    }

    fn offered_to(&self, level: CefrLevel) -> bool {
        self.level.is_none_or(|l| l == level)
    }

    /// Fresh mission from this template
    pub fn instantiate(
        &'static self,
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
        settings: &MissionSettings,
    ) -> MissionProgress {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        let suffix = uuid::Builder::from_random_bytes(bytes).into_uuid();

        MissionProgress {
            id: format!("{}-{}", self.id, suffix.simple()),
            template_id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            level: self.level,
            activity: self.activity.map(str::to_string),
            goal: self.goal.map(str::to_string),
            status: MissionStatus::Active,
            objectives: self
                .objectives
                .iter()
                .map(|&(metric, target)| MissionObjective {
                    metric,
                    progress: 0,
                    target,
                })
                .collect(),
            assigned_at: now,
            expires_at: now.checked_add_signed(settings.expiry()),
            completed_at: None,
            reward: MissionReward { xp: self.reward_xp },
        }
    }
}

/// All mission templates
pub static MISSION_TEMPLATES: &[MissionTemplate] = &[
    MissionTemplate {
        id: "warm_up",
        title: "Warm Up",
        description: "Finish one session of any kind",
        level: None,
        activity: None,
        goal: None,
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 20,
    },
    MissionTemplate {
        id: "triple_practice",
        title: "Triple Practice",
        description: "Finish three sessions today",
        level: None,
        activity: None,
        goal: None,
        objectives: &[(MissionMetric::Sessions, 3)],
        reward_xp: 50,
    },
    MissionTemplate {
        id: "chatterbox",
        title: "Chatterbox",
        description: "Hold two conversation sessions",
        level: None,
        activity: Some("conversation"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 2)],
        reward_xp: 40,
    },
    MissionTemplate {
        id: "role_player",
        title: "Role Player",
        description: "Play through a role-play scenario",
        level: None,
        activity: Some("roleplay"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 30,
    },
    MissionTemplate {
        id: "word_collector",
        title: "Word Collector",
        description: "Complete two vocabulary sessions",
        level: None,
        activity: Some("vocabulary"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 2)],
        reward_xp: 35,
    },
    MissionTemplate {
        id: "clear_speaker",
        title: "Clear Speaker",
        description: "Practice pronunciation once",
        level: None,
        activity: Some("pronunciation"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 30,
    },
    MissionTemplate {
        id: "grammar_check",
        title: "Grammar Check",
        description: "Complete two grammar sessions",
        level: None,
        activity: Some("grammar"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 2)],
        reward_xp: 35,
    },
    MissionTemplate {
        id: "globetrotter",
        title: "Globetrotter",
        description: "Finish a session toward your travel goal",
        level: None,
        activity: None,
        goal: Some("travel"),
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 30,
    },
    MissionTemplate {
        id: "career_move",
        title: "Career Move",
        description: "Finish a session toward your work goal",
        level: None,
        activity: None,
        goal: Some("work"),
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 30,
    },
    MissionTemplate {
        id: "game_on",
        title: "Game On",
        description: "Play two minigames",
        level: None,
        activity: None,
        goal: None,
        objectives: &[(MissionMetric::Minigames, 2)],
        reward_xp: 30,
    },
    MissionTemplate {
        id: "all_rounder",
        title: "All-Rounder",
        description: "Finish two sessions and one minigame",
        level: None,
        activity: None,
        goal: None,
        objectives: &[(MissionMetric::Sessions, 2), (MissionMetric::Minigames, 1)],
        reward_xp: 60,
    },
    MissionTemplate {
        id: "first_words",
        title: "First Words",
        description: "Learn new vocabulary as a beginner",
        level: Some(CefrLevel::A1),
        activity: Some("vocabulary"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 25,
    },
    MissionTemplate {
        id: "debate_club",
        title: "Debate Club",
        description: "Argue a position in an advanced conversation",
        level: Some(CefrLevel::C1),
        activity: Some("conversation"),
        goal: None,
        objectives: &[(MissionMetric::Sessions, 1)],
        reward_xp: 45,
    },
];

/// Drop stale missions and top the active pool back up to `pool_size`.
///
/// Returns the newly assigned missions. Template choice is random; pass a
/// seeded generator for reproducible picks.
pub fn ensure_daily_missions(
    missions: &mut Vec<MissionProgress>,
    level: CefrLevel,
    now: DateTime<Utc>,
    rng: &mut dyn RngCore,
    settings: &MissionSettings,
) -> Vec<MissionProgress> {
    let before = missions.len();
    missions.retain(|m| match m.status {
        MissionStatus::Active => !m.is_expired_at(now),
        // Completed missions stay visible until their own window closes
        MissionStatus::Completed => m.expires_at.is_none_or(|at| at > now),
        MissionStatus::Expired => false,
    });
    if missions.len() != before {
        debug!(dropped = before - missions.len(), "Dropped stale missions");
    }

    let active = missions
        .iter()
        .filter(|m| m.status == MissionStatus::Active)
        .count();
    if active >= settings.pool_size {
        return Vec::new();
    }
    let needed = settings.pool_size - active;

    let active_templates: HashSet<&str> = missions
        .iter()
        .filter(|m| m.status == MissionStatus::Active)
        .map(|m| m.template_id.as_str())
        .collect();
    let present_templates: HashSet<&str> =
        missions.iter().map(|m| m.template_id.as_str()).collect();

    // Prefer templates not seen today; fall back to ones only completed today
    let fresh: Vec<&'static MissionTemplate> = MISSION_TEMPLATES
        .iter()
        .filter(|t| t.offered_to(level) && !present_templates.contains(t.id))
        .collect();
    let mut picks: Vec<&'static MissionTemplate> =
        fresh.choose_multiple(&mut *rng, needed).copied().collect();

    if picks.len() < needed {
        let repeats: Vec<&'static MissionTemplate> = MISSION_TEMPLATES
            .iter()
            .filter(|t| {
                t.offered_to(level)
                    && present_templates.contains(t.id)
                    && !active_templates.contains(t.id)
            })
            .collect();
        picks.extend(repeats.choose_multiple(&mut *rng, needed - picks.len()).copied());
    }

    if picks.len() < needed {
        warn!(
            needed,
            available = picks.len(),
            "Not enough mission templates to fill the pool"
        );
    }

    let assigned: Vec<MissionProgress> = picks
        .into_iter()
        .map(|template| template.instantiate(now, &mut *rng, settings))
        .collect();
    for mission in &assigned {
        debug!(id = %mission.id, "Assigned mission");
    }
    missions.extend(assigned.iter().cloned());
    assigned
}

/// Count a session toward every matching active mission.
///
/// Active missions past their deadline are flipped to expired instead.
/// Returns missions completed by this session.
pub fn apply_session_to_missions(
    missions: &mut [MissionProgress],
    session: &Session,
    now: DateTime<Utc>,
) -> Vec<MissionProgress> {
    apply_metric(missions, MissionMetric::Sessions, Some(session), now)
}

/// Count a minigame toward active missions without level/activity/goal filters.
pub fn apply_minigame_to_missions(
    missions: &mut [MissionProgress],
    now: DateTime<Utc>,
) -> Vec<MissionProgress> {
    apply_metric(missions, MissionMetric::Minigames, None, now)
}

fn apply_metric(
    missions: &mut [MissionProgress],
    metric: MissionMetric,
    session: Option<&Session>,
    now: DateTime<Utc>,
) -> Vec<MissionProgress> {
    let mut completed = Vec::new();

    for mission in missions
        .iter_mut()
        .filter(|m| m.status == MissionStatus::Active)
    {
        if mission.is_expired_at(now) {
            debug!(id = %mission.id, "Mission expired");
            mission.status = MissionStatus::Expired;
            continue;
        }

        let eligible = match session {
            Some(session) => mission.matches(session),
            None => mission.is_unfiltered(),
        };
        if eligible && mission.advance(metric, now) {
            info!(id = %mission.id, title = %mission.title, "Mission completed");
            completed.push(mission.clone());
        }
    }

    completed
}
