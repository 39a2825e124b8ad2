use crate::error::ConfigError;
use crate::hasher::HashAlgorithm;
use crate::moves::MovePolicy;
use crate::scanner::{default_concurrency, ScannerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Persistent defaults for a monitoring run, overridable from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub algorithm: String,
    pub interval_secs: u64,
    /// `None` uses the machine's available parallelism.
    pub concurrency: Option<usize>,
    pub move_window_secs: f64,
    pub show_size: bool,
    pub notifications: bool,
    pub color: bool,
    pub report_file: Option<PathBuf>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default().as_str().to_string(),
            interval_secs: 5,
            concurrency: None,
            move_window_secs: MovePolicy::default().mtime_window_secs,
            show_size: false,
            notifications: true,
            color: true,
            report_file: None,
        }
    }
}

impl MonitorSettings {
    /// Read settings from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::UnreadableConfigFile {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| ConfigError::InvalidConfigFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, ConfigError> {
        self.algorithm.parse()
    }

    pub fn move_policy(&self) -> MovePolicy {
        MovePolicy::with_window(self.move_window_secs)
    }

    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            concurrency: self.concurrency.unwrap_or_else(default_concurrency).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let s = MonitorSettings::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(s, MonitorSettings::default());
        assert_eq!(s.hash_algorithm().unwrap(), HashAlgorithm::Blake3);
        assert_eq!(s.move_policy(), MovePolicy::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"algorithm":"sha256","move_window_secs":5.0,"concurrency":3}"#).unwrap();
        let s = MonitorSettings::load(&path).unwrap();
        assert_eq!(s.hash_algorithm().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(s.move_policy().mtime_window_secs, 5.0);
        assert_eq!(s.scanner_config().concurrency, 3);
        assert_eq!(s.interval_secs, 5);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "interval_secs = 5").unwrap();
        assert!(matches!(
            MonitorSettings::load(&path),
            Err(ConfigError::InvalidConfigFile { .. })
        ));
    }

    #[test]
    fn bad_algorithm_surfaces_on_use() {
        let s = MonitorSettings {
            algorithm: "crc32".into(),
            ..MonitorSettings::default()
        };
        assert!(s.hash_algorithm().is_err());
    }
}
