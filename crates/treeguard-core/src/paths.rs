use crate::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORG: &str = "treeguard";
pub const APP_NAME: &str = "treeguard";

/// Overrides the platform data directory when set and non-empty.
pub const DATA_DIR_ENV: &str = "TREEGUARD_DATA_DIR";

pub fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn snapshot_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("snapshots")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}
