//! Missions command implementation

use anyhow::Result;

use fluency_progress::progress::{CefrLevel, MissionStatus};

use super::EngineOptions;

/// Top up the mission pool and list it
pub fn missions_command(opts: &EngineOptions, level: CefrLevel) -> Result<()> {
    let mut engine = opts.open()?;
    let assigned = engine.ensure_daily_missions(level)?;
    let state = engine.state()?;

    if state.missions.is_empty() {
        println!("No missions available.");
        return Ok(());
    }

    println!("Missions ({} new):\n", assigned.len());
    for mission in &state.missions {
        let status = match mission.status {
            MissionStatus::Active => "active",
            MissionStatus::Completed => "done",
            MissionStatus::Expired => "expired",
        };
        println!(
            "  [{}] {} - {} ({:.0}%, +{} XP)",
            status,
            mission.title,
            mission.description,
            mission.progress_percent() * 100.0,
            mission.reward.xp
        );
        if let Some(expires) = mission.expires_at {
            println!("    Expires: {}", expires.format("%Y-%m-%d %H:%M UTC"));
        }
    }

    Ok(())
}
