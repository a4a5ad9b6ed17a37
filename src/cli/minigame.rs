//! Minigame command implementation

use anyhow::Result;

use super::{EngineOptions, print_events};

pub fn minigame_command(
    opts: &EngineOptions,
    game: &str,
    score: u32,
    max_score: u32,
) -> Result<()> {
    let mut engine = opts.open()?;
    let outcome = engine.record_minigame_result(game, score, max_score)?;
    let xp: u64 = outcome.xp_grants.iter().map(|g| g.amount).sum();

    println!(
        "{}: {}/{} ({:.0}%), +{} XP",
        outcome.result.game,
        outcome.result.score,
        outcome.result.max_score,
        outcome.result.accuracy() * 100.0,
        xp
    );
    print_events(&outcome.events());
    Ok(())
}
