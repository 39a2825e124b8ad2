//! On-disk snapshot persistence, one JSON file per monitored root.
//!
//! Writes go to a temporary file in the store directory which is fsynced and
//! then renamed over the previous snapshot, so a crash leaves either the old
//! or the new file, never a torn one.

use crate::error::StoreError;
use crate::record::Snapshot;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "snapshot_";
const FILE_SUFFIX: &str = ".json";
/// Hex characters of SHA-256 kept in a key (128 bits).
const KEY_LEN: usize = 32;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Stable store key for a monitored root.
///
/// The path is canonicalized first so `./srv` and `/srv` share state.
pub fn snapshot_key(root: &Path) -> String {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(KEY_LEN);
    key
}

/// What the store holds for a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    Absent,
    /// Present but unreadable; callers re-baseline.
    Corrupt(String),
    Present(Snapshot),
}

impl Baseline {
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Self::Present(s) => Some(s),
            Self::Absent | Self::Corrupt(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        restrict_dir_permissions(&dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{key}{FILE_SUFFIX}"))
    }

    /// Snapshot for `key`, or an empty one when there is no usable baseline.
    pub fn load(&self, key: &str) -> Snapshot {
        self.load_baseline(key).into_snapshot().unwrap_or_default()
    }

    pub fn load_baseline(&self, key: &str) -> Baseline {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Baseline::Absent,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read stored snapshot; treating as no baseline");
                return Baseline::Corrupt(e.to_string());
            }
        };
        match serde_json::from_str::<Snapshot>(&text) {
            Ok(snapshot) => {
                debug!(path = %path.display(), entries = snapshot.len(), "snapshot loaded");
                Baseline::Present(snapshot)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stored snapshot is malformed; treating as no baseline");
                Baseline::Corrupt(e.to_string())
            }
        }
    }

    pub fn save(&self, key: &str, snapshot: &Snapshot) -> Result<()> {
        let dest = self.path_for(key);
        let staging = NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        {
            let mut writer = BufWriter::new(staging.as_file());
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer
                .flush()
                .map_err(|e| StoreError::io(staging.path(), e))?;
        }
        staging
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::io(staging.path(), e))?;
        staging.persist(&dest).map_err(|e| StoreError::Persist {
            path: dest.clone(),
            source: e.error,
        })?;
        fsync_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        debug!(path = %dest.display(), entries = snapshot.len(), "snapshot saved");
        Ok(())
    }

    /// Delete the snapshot for `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "snapshot removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Delete every snapshot in the store. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX) {
                fs::remove_file(entry.path()).map_err(|e| StoreError::io(entry.path(), e))?;
                removed += 1;
            }
        }
        info!(dir = %self.dir.display(), removed, "snapshot store cleared");
        Ok(removed)
    }
}

fn restrict_dir_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
            warn!("cannot restrict permissions on {}: {}", path.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

fn fsync_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let dir: File = OpenOptions::new().read(true).open(path)?;
        dir.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
