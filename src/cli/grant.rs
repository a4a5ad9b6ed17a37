//! Grant command implementation

use anyhow::{Result, anyhow};

use fluency_progress::progress::XpSource;

use super::EngineOptions;

pub fn grant_command(opts: &EngineOptions, amount: f64, source: &str) -> Result<()> {
    let source =
        XpSource::from_str(source).ok_or_else(|| anyhow!("Unknown XP source: {}", source))?;

    let mut engine = opts.open()?;
    let grant = engine.grant_xp(amount, source, None)?;

    if grant.amount == 0 {
        println!("Nothing granted (amount must be a positive number).");
        return Ok(());
    }
    println!(
        "+{} XP ({}), total {}, level {}",
        grant.amount,
        source.as_str(),
        grant.total,
        grant.new_level
    );
    if grant.leveled_up() {
        println!("  ⬆️  Level up! {} → {}", grant.previous_level, grant.new_level);
    }
    Ok(())
}
