//! Init command implementation

use anyhow::Result;
use std::path::Path;
use tracing::info;

use fluency_progress::EngineConfig;

/// Write the commented default config to `path` (or the global location)
pub fn init_command(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(EngineConfig::global_config_path);

    EngineConfig::write_default(&path, force)?;
    info!("Wrote config to {}", path.display());
    println!("Created {}", path.display());
    Ok(())
}
