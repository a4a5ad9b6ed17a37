//! Seasonal events
//!
//! Yearly windows defined by month/day pairs. A window whose end falls
//! before its start in the calendar year (e.g. mid-November to mid-January)
//! runs across New Year.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::calendar::{Calendar, date_clamped};
use super::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalStatus {
    Upcoming,
    Active,
    Completed,
}

/// Static event definition
#[derive(Debug, Clone)]
pub struct SeasonalEventDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// (month, day) of the first day
    pub start: (u32, u32),
    /// (month, day) of the last day
    pub end: (u32, u32),
    /// Only sessions with this activity count; `None` counts all sessions
    pub focus_activity: Option<&'static str>,
    pub target_sessions: u32,
    pub reward_xp: u64,
}

impl SeasonalEventDef {
    pub fn get(id: &str) -> Option<&'static SeasonalEventDef> {
        SEASONAL_EVENTS.iter().find(|e| e.id == id)
    }

    pub fn wraps_year(&self) -> bool {
        self.end < self.start
    }
}

/// All seasonal event definitions
pub static SEASONAL_EVENTS: &[SeasonalEventDef] = &[
    SeasonalEventDef {
        id: "winter-festival",
        name: "Winter Festival",
        description: "Keep practicing through the holidays",
        start: (11, 15),
        end: (1, 15),
        focus_activity: None,
        target_sessions: 15,
        reward_xp: 150,
    },
    SeasonalEventDef {
        id: "spring-bloom",
        name: "Spring Bloom",
        description: "Grow your vocabulary this spring",
        start: (3, 20),
        end: (4, 30),
        focus_activity: Some("vocabulary"),
        target_sessions: 12,
        reward_xp: 120,
    },
    SeasonalEventDef {
        id: "summer-voyage",
        name: "Summer Voyage",
        description: "Talk your way through the summer",
        start: (6, 21),
        end: (8, 31),
        focus_activity: Some("conversation"),
        target_sessions: 20,
        reward_xp: 200,
    },
    SeasonalEventDef {
        id: "autumn-harvest",
        name: "Autumn Harvest",
        description: "Gather sessions before the leaves fall",
        start: (9, 22),
        end: (10, 31),
        focus_activity: None,
        target_sessions: 10,
        reward_xp: 100,
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalMetadata {
    pub target_sessions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_activity: Option<String>,
}

/// Learner progress on one event's current occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalEventProgress {
    pub id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SeasonalStatus,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub metadata: SeasonalMetadata,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One dated window of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Occurrence {
    pub fn status_at(&self, now: DateTime<Utc>) -> SeasonalStatus {
        if now < self.starts_at {
            SeasonalStatus::Upcoming
        } else {
            SeasonalStatus::Active
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

/// Occurrence that contains `now`, or the next one to open.
///
/// A wrapping window that started last year is still current until its end
/// passes; after this year's end the following year's window is used.
pub fn occurrence_for(
    def: &SeasonalEventDef,
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> Option<Occurrence> {
    let year = calendar.local_date(now).year();
    let end_offset = i32::from(def.wraps_year());

    (year - 1..=year + 1).find_map(|start_year| {
        let start = date_clamped(start_year, def.start.0, def.start.1)?;
        let end = date_clamped(start_year + end_offset, def.end.0, def.end.1)?;
        let occurrence = Occurrence {
            starts_at: calendar.start_of_day(start),
            ends_at: calendar.end_of_day(end),
        };
        (now <= occurrence.ends_at).then_some(occurrence)
    })
}

/// Insert or refresh one record per defined event.
///
/// Windows always move to the current occurrence. A completed event keeps
/// its status and progress unless `reopen_completed` is set, in which case
/// every event starts over when a new occurrence is computed.
pub fn ensure_seasonal_events(
    events: &mut Vec<SeasonalEventProgress>,
    now: DateTime<Utc>,
    calendar: &Calendar,
    reopen_completed: bool,
) {
    for def in SEASONAL_EVENTS {
        let Some(occurrence) = occurrence_for(def, now, calendar) else {
            continue;
        };
        let metadata = SeasonalMetadata {
            target_sessions: def.target_sessions,
            focus_activity: def.focus_activity.map(str::to_string),
        };

        let Some(index) = events.iter().position(|e| e.id == def.id) else {
            debug!(id = def.id, starts_at = %occurrence.starts_at, "Tracking seasonal event");
            events.push(SeasonalEventProgress {
                id: def.id.to_string(),
                starts_at: occurrence.starts_at,
                ends_at: occurrence.ends_at,
                status: occurrence.status_at(now),
                progress: 0,
                metadata,
                completed_at: None,
            });
            continue;
        };
        let event = &mut events[index];

        let new_window = event.starts_at != occurrence.starts_at;
        if new_window && reopen_completed {
            debug!(id = def.id, starts_at = %occurrence.starts_at, "Seasonal event reopened");
            event.progress = 0;
            event.completed_at = None;
            event.status = SeasonalStatus::Upcoming;
        }

        event.starts_at = occurrence.starts_at;
        event.ends_at = occurrence.ends_at;
        event.metadata = metadata;
        event.progress = event.progress.min(def.target_sessions);
        if event.status != SeasonalStatus::Completed {
            event.status = occurrence.status_at(now);
        }
    }
}

/// Count a session toward every active event whose focus matches.
/// Returns events completed by this session.
pub fn apply_seasonal_progress(
    events: &mut Vec<SeasonalEventProgress>,
    session: &Session,
    now: DateTime<Utc>,
    calendar: &Calendar,
    reopen_completed: bool,
) -> Vec<SeasonalEventProgress> {
    ensure_seasonal_events(events, now, calendar, reopen_completed);

    let mut completed = Vec::new();
    for event in events
        .iter_mut()
        .filter(|e| e.status == SeasonalStatus::Active)
    {
        let matches = event
            .metadata
            .focus_activity
            .as_deref()
            .is_none_or(|focus| focus == session.activity);
        if !matches {
            continue;
        }

        let target = event.metadata.target_sessions;
        event.progress = (event.progress + 1).min(target);
        if event.progress >= target {
            event.status = SeasonalStatus::Completed;
            event.completed_at = Some(now);
            info!(id = %event.id, "Seasonal event completed");
            completed.push(event.clone());
        }
    }

    completed
}
