//! CLI command implementations

pub mod badges;
pub mod events;
pub mod grant;
pub mod init;
pub mod minigame;
pub mod missions;
pub mod remind;
pub mod session;
pub mod status;

use anyhow::Result;
use std::path::PathBuf;

use fluency_progress::progress::{ProgressEngine, ProgressEvent};
use fluency_progress::{EngineConfig, JsonFileStore};

/// Global options shared by every command
pub struct EngineOptions {
    pub config_path: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub learner: String,
}

impl EngineOptions {
    /// Load config and open the learner's file-backed engine
    pub fn open(&self) -> Result<ProgressEngine<JsonFileStore>> {
        let config = EngineConfig::load(self.config_path.as_deref())?;
        let dir = self
            .state_dir
            .clone()
            .unwrap_or_else(EngineConfig::default_state_dir);
        Ok(ProgressEngine::new(
            JsonFileStore::new(dir),
            self.learner.clone(),
            config,
        ))
    }
}

pub fn print_events(events: &[ProgressEvent]) {
    for event in events {
        match event {
            ProgressEvent::LevelUp(up) => {
                println!("  ⬆️  Level up! {} → {}", up.old_level, up.new_level)
            }
            ProgressEvent::StreakMilestone(days) => {
                println!("  🔥 {}-day streak milestone", days)
            }
            ProgressEvent::MissionCompleted { title, xp } => {
                println!("  ✅ Mission complete: {} (+{} XP)", title, xp)
            }
            ProgressEvent::BadgeUnlocked(badge) => {
                println!(
                    "  {} Badge unlocked: {} (+{} XP)",
                    badge.icon, badge.name, badge.xp_reward
                )
            }
            ProgressEvent::SeasonalEventCompleted { name, xp } => {
                println!("  🎉 Seasonal event complete: {} (+{} XP)", name, xp)
            }
        }
    }
}
