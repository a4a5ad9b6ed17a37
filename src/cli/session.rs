//! Session command implementation

use anyhow::{Context, Result};

use fluency_progress::progress::{CefrLevel, Session, StreakChange};

use super::{EngineOptions, print_events};

/// Record a finished session and print what it earned
pub fn session_command(
    opts: &EngineOptions,
    level: CefrLevel,
    activity: String,
    goal: String,
) -> Result<()> {
    let mut engine = opts.open()?;
    let session = Session::new(level, activity, goal);
    let outcome = engine
        .complete_session(&session)
        .context("Failed to record session")?;

    let state = &outcome.state;
    println!(
        "Session recorded: +{} XP (total {}, level {})",
        outcome.xp_gained(),
        state.xp.total,
        state.xp.level
    );

    let daily = match outcome.streaks.daily {
        Some(StreakChange::Reset) => " (streak restarted)",
        None => " (already counted today)",
        _ => "",
    };
    println!(
        "Streaks: {} day(s){}, {} week(s)",
        state.streaks.daily.current, daily, state.streaks.weekly.current
    );

    if !outcome.assigned_missions.is_empty() {
        println!("New missions:");
        for mission in &outcome.assigned_missions {
            println!("  - {} ({})", mission.title, mission.description);
        }
    }

    print_events(&outcome.events());
    Ok(())
}
