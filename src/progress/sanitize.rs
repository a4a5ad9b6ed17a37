//! State sanitizer
//!
//! Turns whatever was persisted into a valid [`ProgressState`]. Sections are
//! decoded independently so one corrupt field never costs the whole state;
//! list sections are decoded element by element.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::badges::BadgeId;
use super::history::truncate_oldest;
use super::levels::XpState;
use super::reminders::{cap_delivered, dedupe_pending};
use super::seasonal::SeasonalEventDef;
use super::state::{ProgressState, STATE_VERSION};
use super::streaks::StreakStats;
use crate::config::EngineConfig;

/// Decode a persisted blob. Never fails: anything unusable becomes a default.
pub fn ensure(raw: Option<Value>, config: &EngineConfig) -> ProgressState {
    let mut state = match raw {
        None => ProgressState::default(),
        Some(Value::Object(obj)) => decode_state(&obj),
        Some(other) => {
            warn!(kind = json_kind(&other), "Persisted state is not an object, using defaults");
            ProgressState::default()
        }
    };
    repair(&mut state, config);
    state
}

fn decode_state(obj: &Map<String, Value>) -> ProgressState {
    match obj.get("version") {
        None => debug!("Persisted state has no version, reading as legacy"),
        Some(version) => match version.as_u64() {
            Some(v) if v > u64::from(STATE_VERSION) => {
                warn!(
                    version = v,
                    supported = STATE_VERSION,
                    "Persisted state is newer than supported, using defaults"
                );
                return ProgressState::default();
            }
            Some(_) => {}
            None => warn!("Persisted state version is not an integer, reading as legacy"),
        },
    }

    let streaks = obj.get("streaks").and_then(Value::as_object);

    let mut state = ProgressState::default();
    state.xp = decode_xp(obj.get("xp"));
    state.streaks.daily = decode_streak(streaks.and_then(|s| s.get("daily")), "streaks.daily");
    state.streaks.weekly = decode_streak(streaks.and_then(|s| s.get("weekly")), "streaks.weekly");
    state.streaks.milestones =
        decode_list(streaks.and_then(|s| s.get("milestones")), "streaks.milestones");
    state.missions = decode_list(obj.get("missions"), "missions");
    state.badges = decode_list(obj.get("badges"), "badges");
    state.seasonal_events = decode_list(obj.get("seasonal_events"), "seasonal_events");
    state.reminders = decode_list(obj.get("reminders"), "reminders");
    state.minigames = decode_list(obj.get("minigames"), "minigames");
    state.totals = decode(obj.get("totals"), "totals");
    state.updated_at = decode(obj.get("updated_at"), "updated_at");
    state
}

fn decode<T: DeserializeOwned + Default>(value: Option<&Value>, section: &str) -> T {
    match value {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(section, "Malformed state section, using default: {}", e);
            T::default()
        }),
    }
}

fn decode_list<T: DeserializeOwned>(value: Option<&Value>, section: &str) -> Vec<T> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(section, kind = json_kind(other), "Expected a list, using empty");
            return Vec::new();
        }
    };

    let mut dropped = 0usize;
    let decoded: Vec<T> = items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(section, "Dropping malformed entry: {}", e);
                dropped += 1;
                None
            }
        })
        .collect();
    if dropped > 0 {
        warn!(section, dropped, "Dropped malformed entries");
    }
    decoded
}

/// Decode an object section whose `history` list is decoded element-wise
fn decode_with_history<T: DeserializeOwned + Default>(
    value: Option<&Value>,
    section: &str,
) -> (T, Option<Value>) {
    match value {
        Some(Value::Object(obj)) => {
            let mut obj = obj.clone();
            let history = obj.remove("history");
            (decode(Some(&Value::Object(obj)), section), history)
        }
        other => (decode(other, section), None),
    }
}

fn decode_xp(value: Option<&Value>) -> XpState {
    let (mut xp, history): (XpState, _) = decode_with_history(value, "xp");
    xp.history = decode_list(history.as_ref(), "xp.history");
    xp
}

fn decode_streak(value: Option<&Value>, section: &str) -> StreakStats {
    let (mut stats, history): (StreakStats, _) = decode_with_history(value, section);
    stats.history = decode_list(history.as_ref(), section);
    stats
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Restore every cross-field invariant of a decoded or mutated state.
pub fn repair(state: &mut ProgressState, config: &EngineConfig) {
    state.version = STATE_VERSION;

    state.xp.refresh_level(&config.level_curve());
    truncate_oldest(&mut state.xp.history, config.xp.history_limit);

    for stats in [&mut state.streaks.daily, &mut state.streaks.weekly] {
        if stats.longest < stats.current {
            warn!(
                current = stats.current,
                longest = stats.longest,
                "Streak longest below current, raising"
            );
            stats.longest = stats.current;
        }
        truncate_oldest(&mut stats.history, config.streaks.history_limit);
    }
    truncate_oldest(&mut state.streaks.milestones, config.streaks.history_limit);

    let mut mission_ids = HashSet::new();
    state.missions.retain(|m| mission_ids.insert(m.id.clone()));
    for mission in &mut state.missions {
        for objective in &mut mission.objectives {
            objective.progress = objective.progress.min(objective.target);
        }
    }

    let mut badge_ids = HashSet::new();
    let before = state.badges.len();
    state.badges.retain(|b| {
        b.unlocked_at.is_some() && BadgeId::from_str(&b.id).is_some() && badge_ids.insert(b.id.clone())
    });
    if state.badges.len() != before {
        warn!(dropped = before - state.badges.len(), "Dropped invalid badge ledger entries");
    }

    let mut event_ids = HashSet::new();
    let before = state.seasonal_events.len();
    state.seasonal_events.retain(|e| {
        SeasonalEventDef::get(&e.id).is_some() && event_ids.insert(e.id.clone())
    });
    if state.seasonal_events.len() != before {
        warn!(
            dropped = before - state.seasonal_events.len(),
            "Dropped unknown seasonal events"
        );
    }
    for event in &mut state.seasonal_events {
        if let Some(def) = SeasonalEventDef::get(&event.id) {
            event.metadata.target_sessions = def.target_sessions;
        }
        event.progress = event.progress.min(event.metadata.target_sessions);
    }

    let duplicates = dedupe_pending(&mut state.reminders);
    if duplicates > 0 {
        warn!(dropped = duplicates, "Dropped duplicate pending reminders");
    }
    cap_delivered(&mut state.reminders, config.reminders.retained);

    truncate_oldest(&mut state.minigames, config.minigames.history_limit);
}
