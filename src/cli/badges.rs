//! Badges command implementation

use anyhow::Result;

use super::EngineOptions;

/// List the badge catalog with unlock dates
pub fn badges_command(opts: &EngineOptions, unlocked_only: bool) -> Result<()> {
    let engine = opts.open()?;
    let views = engine.badge_catalog()?;
    let unlocked = views.iter().filter(|v| v.is_unlocked()).count();

    println!("Badges ({}/{}):\n", unlocked, views.len());

    let mut category = None;
    for view in views.iter().filter(|v| !unlocked_only || v.is_unlocked()) {
        let badge = view.badge;
        if category != Some(badge.category) {
            category = Some(badge.category);
            println!("{}", badge.category.label());
        }

        match view.unlocked_at {
            Some(at) => println!(
                "  {} {} - {} (unlocked {})",
                badge.icon,
                badge.name,
                badge.description,
                at.format("%Y-%m-%d")
            ),
            None => println!(
                "  🔒 {} - {} (+{} XP)",
                badge.name, badge.description, badge.xp_reward
            ),
        }
    }

    Ok(())
}
