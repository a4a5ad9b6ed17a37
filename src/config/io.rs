//! Configuration file I/O operations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::EngineConfig;
use crate::atomic_file;

/// Content written by `fluency init`
pub const DEFAULT_CONFIG: &str = r#"# Fluency progression engine configuration
# ==========================================
#
# Every key is optional; missing keys fall back to the values shown here.

# Fixed UTC offset (minutes east of UTC) used for day and week boundaries.
# Leave unset to follow the system time zone.
# utc_offset_minutes = 60

# ----------------------------------------------------------------------------
# Levels: going from level n to n+1 costs base_xp + growth_xp * (n - 1)
# ----------------------------------------------------------------------------
[levels]
base_xp = 100
growth_xp = 50
max_level = 50

[xp]
history_limit = 100
session_xp = 10
# Bonus per day of the current daily streak, capped
streak_bonus_per_day = 2
streak_bonus_cap = 20
minigame_xp = 5

[streaks]
milestones = [7, 14, 30, 60, 100, 365]
history_limit = 60

[missions]
pool_size = 3
expiry_hours = 24

# ----------------------------------------------------------------------------
# Reminders fire lead_hours before a streak deadline. When that moment has
# already passed they fire min_delay_minutes from now instead.
# ----------------------------------------------------------------------------
[reminders]
enabled = true
daily_lead_hours = 4
weekly_lead_hours = 24
min_delay_minutes = 5
retained = 20

[seasonal]
# true: a completed event starts over when its next yearly window opens
reopen_completed = false

[minigames]
history_limit = 50

[cache]
topic_ttl_minutes = 60
max_entries = 64
"#;

impl EngineConfig {
    /// Get the global directory (~/.fluency/)
    pub fn global_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fluency")
    }

    /// Get the global config file path (~/.fluency/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_dir().join("config.toml")
    }

    /// Default directory for persisted progress state (~/.fluency/state/)
    pub fn default_state_dir() -> PathBuf {
        Self::global_dir().join("state")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` (or the global path). A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::global_config_path);

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    /// Write the commented default template. Refuses to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
        write_atomic(path, DEFAULT_CONFIG)
    }

    /// Save configuration to a file with atomic write and file locking.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        write_atomic(path, &content)
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    let _lock = atomic_file::lock_exclusive(path).with_context(|| "Failed to acquire config lock")?;
    atomic_file::replace(path, content.as_bytes())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}
