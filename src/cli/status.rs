//! Status command implementation

use anyhow::Result;

use fluency_progress::progress::StreakPeriod;

use super::EngineOptions;

/// Show XP, level progress and streaks
pub fn status_command(opts: &EngineOptions) -> Result<()> {
    let engine = opts.open()?;
    let state = engine.state()?;
    let info = engine.level_curve().resolve(state.xp.total);
    let today = engine.calendar().local_date(engine.now());

    println!("Learner: {}", engine.key());
    if info.is_max_level() {
        println!("Level {} (max) - {} XP", info.level, state.xp.total);
    } else {
        println!(
            "Level {} - {} XP ({}/{} to next, {:.0}%)",
            info.level,
            state.xp.total,
            info.xp_into_level,
            info.xp_for_next_level,
            info.progress * 100.0
        );
    }

    for period in StreakPeriod::all() {
        let stats = state.streaks.get(*period);
        let marker = if stats.is_active(today, *period) {
            ""
        } else {
            " (inactive)"
        };
        println!(
            "{} streak: {} (best {}){}",
            period.label(),
            stats.current,
            stats.longest,
            marker
        );
    }

    println!(
        "Sessions: {}  Missions completed: {}  Minigames: {}",
        state.totals.sessions, state.totals.missions_completed, state.totals.minigames
    );
    println!(
        "Badges: {}  Pending reminders: {}",
        state.badges.len(),
        state.pending_reminders().count()
    );

    if let Some(updated) = state.updated_at {
        println!("Last update: {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }

    Ok(())
}
