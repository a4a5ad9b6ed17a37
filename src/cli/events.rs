//! Events command implementation

use anyhow::Result;

use fluency_progress::progress::{SeasonalEventDef, SeasonalStatus};

use super::EngineOptions;

/// Refresh and list seasonal events
pub fn events_command(opts: &EngineOptions) -> Result<()> {
    let mut engine = opts.open()?;
    let events = engine.ensure_seasonal_events()?;

    println!("Seasonal events:\n");
    for event in &events {
        let Some(def) = SeasonalEventDef::get(&event.id) else {
            continue;
        };
        let status = match event.status {
            SeasonalStatus::Upcoming => "upcoming",
            SeasonalStatus::Active => "active",
            SeasonalStatus::Completed => "completed",
        };
        println!("  {} [{}] {}/{}", def.name, status, event.progress, event.metadata.target_sessions);
        println!(
            "    {} to {}",
            event.starts_at.format("%Y-%m-%d"),
            event.ends_at.format("%Y-%m-%d")
        );
        if let Some(focus) = &event.metadata.focus_activity {
            println!("    Counts {} sessions only", focus);
        }
    }

    Ok(())
}
