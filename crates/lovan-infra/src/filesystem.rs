//! Data directory layout.

use std::path::{Path, PathBuf};

use lovan_types::config::ClientConfig;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "LOVAN_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `LOVAN_DATA_DIR` environment variable
/// 2. `~/.lovan`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".lovan");
    }

    // Last resort: current directory
    PathBuf::from(".lovan")
}

/// `{data_dir}/config.toml`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Path of the persisted credential blob.
pub fn credential_path(data_dir: &Path, config: &ClientConfig) -> PathBuf {
    data_dir.join(&config.credential_file)
}
