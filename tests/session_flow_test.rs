//! End-to-end session flows through the engine

mod common;

use chrono::Duration;

use common::{at, memory_engine, session};
use fluency_progress::progress::{
    BadgeId, MissionStatus, SeasonalStatus, StreakChange, XpSource,
};

#[test]
fn test_week_of_daily_sessions() {
    let (mut engine, clock) = memory_engine(at(2024, 3, 4, 9));
    let mut milestones = Vec::new();

    for day in 0..7 {
        if day > 0 {
            clock.advance(Duration::days(1));
        }
        let outcome = engine.complete_session(&session("vocabulary")).unwrap();
        milestones.extend(outcome.streaks.milestone);
    }

    let state = engine.state().unwrap();
    assert_eq!(state.streaks.daily.current, 7);
    assert_eq!(state.streaks.daily.longest, 7);
    assert_eq!(state.streaks.weekly.current, 1);
    assert_eq!(milestones, vec![7]);
    assert_eq!(state.streaks.milestones.len(), 1);
    assert!(state.badges.iter().any(|b| b.id == BadgeId::Streak7.as_str()));

    // A second session the same day leaves the count alone
    clock.advance(Duration::hours(2));
    let again = engine.complete_session(&session("vocabulary")).unwrap();
    assert_eq!(again.streaks.daily, None);
    assert!(again.streaks.milestone.is_none());
    assert_eq!(again.state.streaks.daily.current, 7);
}

#[test]
fn test_gap_resets_daily_streak() {
    let (mut engine, clock) = memory_engine(at(2024, 3, 4, 9));
    for _ in 0..4 {
        engine.complete_session(&session("grammar")).unwrap();
        clock.advance(Duration::days(1));
    }

    // Skip a day
    clock.advance(Duration::days(1));
    let outcome = engine.complete_session(&session("grammar")).unwrap();

    assert_eq!(outcome.streaks.daily, Some(StreakChange::Reset));
    assert_eq!(outcome.state.streaks.daily.current, 1);
    assert_eq!(outcome.state.streaks.daily.longest, 4);
}

#[test]
fn test_mission_pool_stays_full() {
    let (mut engine, clock) = memory_engine(at(2024, 5, 6, 8));
    let activities = ["conversation", "roleplay", "vocabulary", "grammar", "pronunciation"];

    for (i, activity) in activities.iter().cycle().take(20).enumerate() {
        let outcome = engine.complete_session(&session(activity)).unwrap();
        let active = outcome
            .state
            .missions
            .iter()
            .filter(|m| m.status == MissionStatus::Active)
            .count();
        assert_eq!(
            active + outcome.completed_missions.len(),
            3,
            "session {}",
            i
        );

        for mission in &outcome.state.missions {
            for objective in &mission.objectives {
                assert!(objective.progress <= objective.target);
            }
        }
        clock.advance(Duration::hours(7));
    }

    let state = engine.state().unwrap();
    let completed_xp: u64 = state
        .xp
        .history
        .iter()
        .filter(|e| e.source == XpSource::Mission)
        .map(|e| e.amount)
        .sum();
    assert!(state.totals.missions_completed > 0);
    assert!(completed_xp > 0);
}

#[test]
fn test_seasonal_event_completes_once() {
    let (mut engine, clock) = memory_engine(at(2024, 6, 20, 12));

    let events = engine.ensure_seasonal_events().unwrap();
    let summer = events.iter().find(|e| e.id == "summer-voyage").unwrap();
    assert_eq!(summer.status, SeasonalStatus::Upcoming);

    clock.set(at(2024, 6, 21, 8));
    let mut completions = 0;
    for _ in 0..25 {
        let outcome = engine.complete_session(&session("conversation")).unwrap();
        completions += outcome
            .completed_events
            .iter()
            .filter(|e| e.id == "summer-voyage")
            .count();
        clock.advance(Duration::minutes(20));
    }

    let state = engine.state().unwrap();
    let summer = state
        .seasonal_events
        .iter()
        .find(|e| e.id == "summer-voyage")
        .unwrap();
    assert_eq!(completions, 1);
    assert_eq!(summer.status, SeasonalStatus::Completed);
    assert_eq!(summer.progress, 20);
    assert!(
        state
            .xp
            .history
            .iter()
            .any(|e| e.source == XpSource::SeasonalEvent && e.amount == 200)
    );
}

#[test]
fn test_xp_total_matches_grants() {
    let (mut engine, clock) = memory_engine(at(2024, 9, 2, 18));
    let mut gained = 0;
    for _ in 0..10 {
        gained += engine.complete_session(&session("roleplay")).unwrap().xp_gained();
        clock.advance(Duration::hours(20));
    }

    let state = engine.state().unwrap();
    assert_eq!(state.xp.total, gained);
    let info = engine.level_curve().resolve(state.xp.total);
    assert_eq!(state.xp.level, info.level);
}
