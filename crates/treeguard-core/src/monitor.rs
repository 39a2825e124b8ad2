//! One monitoring cycle: scan → diff → persist → report.
//!
//! The caller owns the current baseline and threads it through
//! [`Monitor::run_cycle`]; the monitor itself holds no mutable state.

use crate::diff::{diff, ChangeSet};
use crate::error::ConfigError;
use crate::hasher::ContentHasher;
use crate::ignore::IgnorePredicate;
use crate::moves::MovePolicy;
use crate::record::{FileRecord, Snapshot};
use crate::report::Report;
use crate::scanner::{ScanFailure, Scanner};
use crate::store::{snapshot_key, Baseline, SnapshotStore};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{error, info, warn};

/// Canonicalize and validate a monitored root.
pub fn resolve_root(path: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = path
        .canonicalize()
        .map_err(|source| ConfigError::RootInaccessible {
            path: path.to_path_buf(),
            source,
        })?;
    if !canonical.is_dir() {
        return Err(ConfigError::NotADirectory(canonical));
    }
    Ok(canonical)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Saved,
    /// Nothing changed, nothing written.
    Unchanged,
    /// The store kept its previous contents.
    Failed(String),
}

impl Persistence {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct BaselineOutcome {
    pub snapshot: Snapshot,
    pub failures: Vec<ScanFailure>,
    pub persistence: Persistence,
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub report: Report,
    pub changes: ChangeSet,
    /// Records in the fresh snapshot.
    pub scanned: usize,
    pub failures: Vec<ScanFailure>,
    pub persistence: Persistence,
}

pub struct MonitorOptions {
    pub root: PathBuf,
    pub store: SnapshotStore,
    pub ignore: Box<dyn IgnorePredicate>,
    pub hasher: Box<dyn ContentHasher>,
    pub scanner: Scanner,
    pub policy: MovePolicy,
}

pub struct Monitor {
    root: PathBuf,
    key: String,
    store: SnapshotStore,
    ignore: Box<dyn IgnorePredicate>,
    hasher: Box<dyn ContentHasher>,
    scanner: Scanner,
    policy: MovePolicy,
}

impl Monitor {
    pub fn new(options: MonitorOptions) -> Self {
        let key = snapshot_key(&options.root);
        Self {
            root: options.root,
            key,
            store: options.store,
            ignore: options.ignore,
            hasher: options.hasher,
            scanner: options.scanner,
            policy: options.policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn hasher_name(&self) -> &str {
        self.hasher.name()
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.store.path_for(&self.key)
    }

    pub fn load_baseline(&self) -> Baseline {
        self.store.load_baseline(&self.key)
    }

    /// Scan the tree and store the result as the new baseline.
    pub fn baseline(&self) -> BaselineOutcome {
        let scan = self.scanner.scan(&self.root, self.ignore.as_ref(), self.hasher.as_ref());
        let persistence = self.persist(&scan.snapshot);
        info!(
            root = %self.root.display(),
            files = scan.snapshot.len(),
            "baseline created"
        );
        BaselineOutcome {
            snapshot: scan.snapshot,
            failures: scan.failures,
            persistence,
        }
    }

    /// Compare the tree against `current`. On a successful save `current`
    /// becomes the fresh snapshot; after a failed save it is left as is, so
    /// the same changes are reported again next cycle. Tracked files that
    /// fail to hash keep their old record instead of reading as deleted.
    pub fn run_cycle(&self, current: &mut Snapshot) -> CycleOutcome {
        let scan = self.scanner.scan(&self.root, self.ignore.as_ref(), self.hasher.as_ref());
        let scanned = scan.snapshot.len();
        let observed = carry_forward(current, scan.snapshot, &scan.failures);
        let changes = diff(current, &observed, &self.policy);
        let report = Report::build(&changes, &observed);

        let persistence = if changes.is_empty() {
            Persistence::Unchanged
        } else {
            let counts = changes.counts();
            info!(
                added = counts.added,
                deleted = counts.deleted,
                modified = counts.modified,
                moved = counts.moved,
                "changes detected"
            );
            let persistence = self.persist(&observed);
            if persistence == Persistence::Saved {
                *current = observed;
            } else {
                warn!("baseline not updated; these changes will be reported again next cycle");
            }
            persistence
        };

        CycleOutcome {
            report,
            changes,
            scanned,
            failures: scan.failures,
            persistence,
        }
    }

    fn persist(&self, snapshot: &Snapshot) -> Persistence {
        match self.store.save(&self.key, snapshot) {
            Ok(()) => Persistence::Saved,
            Err(e) => {
                error!(path = %self.snapshot_path().display(), error = %e, "cannot persist snapshot");
                Persistence::Failed(e.to_string())
            }
        }
    }
}

/// Tracked paths that could not be read this cycle keep their previous
/// record, so a read error is never reported as a deletion. A failed
/// directory covers every tracked path below it.
fn carry_forward(previous: &Snapshot, fresh: Snapshot, failures: &[ScanFailure]) -> Snapshot {
    if failures.is_empty() {
        return fresh;
    }
    let kept: Vec<(String, FileRecord)> = previous
        .iter()
        .filter(|(path, _)| !fresh.contains(path))
        .filter(|(path, _)| failures.iter().any(|f| covers(&f.path, path)))
        .map(|(path, record)| (path.to_string(), record.clone()))
        .collect();
    if kept.is_empty() {
        return fresh;
    }
    warn!(count = kept.len(), "unreadable files keep their previous record");
    fresh
        .iter()
        .map(|(path, record)| (path.to_string(), record.clone()))
        .chain(kept)
        .collect()
}

fn covers(failed: &str, path: &str) -> bool {
    path == failed
        || path
            .strip_prefix(failed)
            .is_some_and(|rest| rest.starts_with(MAIN_SEPARATOR))
}
