//! Directory walker that reduces a tree to a [`Snapshot`].
//!
//! Walking is sequential; hashing of the surviving files runs on a bounded
//! rayon pool. Workers only return results, and the calling thread is the
//! single writer that assembles the snapshot.
//!
//! A scan never fails as a whole. Files that cannot be read, and files whose
//! path is not valid UTF-8, are left out of the snapshot and reported as
//! [`ScanFailure`]s.

use crate::hasher::ContentHasher;
use crate::ignore::IgnorePredicate;
use crate::record::{epoch_seconds, FileRecord, Snapshot};
use rayon::prelude::*;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Upper bound on files hashed at the same time.
    pub concurrency: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Non-fatal per-file problem seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub snapshot: Snapshot,
    pub failures: Vec<ScanFailure>,
    pub ignored: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config: ScannerConfig {
                concurrency: config.concurrency.max(1),
            },
        }
    }

    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    pub fn scan(
        &self,
        root: &Path,
        ignore: &dyn IgnorePredicate,
        hasher: &dyn ContentHasher,
    ) -> ScanOutcome {
        let (candidates, mut failures, ignored) = collect_candidates(root, ignore);
        debug!(
            root = %root.display(),
            files = candidates.len(),
            ignored,
            "hashing candidate files"
        );

        let results = self.hash_all(&candidates, hasher);

        let mut records = Vec::with_capacity(results.len());
        for ((_, key), result) in candidates.iter().zip(results) {
            match result {
                Ok(record) => {
                    debug!(path = %key, "hashed");
                    records.push((key.clone(), record));
                }
                Err(e) => {
                    warn!(path = %key, error = %e, "cannot hash file; leaving it out of the snapshot");
                    failures.push(ScanFailure {
                        path: key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let snapshot: Snapshot = records.into_iter().collect();
        info!(
            root = %root.display(),
            files = snapshot.len(),
            failures = failures.len(),
            ignored,
            "scan complete"
        );
        ScanOutcome {
            snapshot,
            failures,
            ignored,
        }
    }

    fn hash_all(
        &self,
        candidates: &[(PathBuf, String)],
        hasher: &dyn ContentHasher,
    ) -> Vec<io::Result<FileRecord>> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency)
            .thread_name(|i| format!("treeguard-hash-{i}"))
            .build()
        {
            Ok(pool) => pool.install(|| {
                candidates
                    .par_iter()
                    .map(|(path, _)| hash_file(path, hasher))
                    .collect()
            }),
            Err(e) => {
                warn!(error = %e, "cannot build hashing pool; hashing on the calling thread");
                candidates.iter().map(|(path, _)| hash_file(path, hasher)).collect()
            }
        }
    }
}

/// Walk `root` and return the regular files that survive the ignore
/// predicate, each with the key it will be recorded under.
fn collect_candidates(
    root: &Path,
    ignore: &dyn IgnorePredicate,
) -> (Vec<(PathBuf, String)>, Vec<ScanFailure>, usize) {
    let mut candidates = Vec::new();
    let mut failures = Vec::new();
    let mut ignored = 0usize;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                warn!(path = %path, error = %e, "walk error");
                failures.push(ScanFailure {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if ignore.should_ignore(entry.path()) {
            debug!(path = %entry.path().display(), "ignored");
            ignored += 1;
            continue;
        }

        // a lossy key could collide with another file's
        let Some(key) = entry.path().to_str().map(str::to_owned) else {
            let path = entry.path().display().to_string();
            warn!(path = %path, "path is not valid UTF-8; leaving it out of the snapshot");
            failures.push(ScanFailure {
                path,
                error: "path is not valid UTF-8".to_string(),
            });
            continue;
        };
        candidates.push((entry.into_path(), key));
    }

    (candidates, failures, ignored)
}

/// Open once, stat the open handle, then hash from the same handle so size
/// and mtime describe the file that was actually read.
fn hash_file(path: &Path, hasher: &dyn ContentHasher) -> io::Result<FileRecord> {
    let mut file = File::open(path)?;
    let metadata = file.metadata()?;
    let size = metadata.len();
    let mtime = epoch_seconds(metadata.modified()?);
    let digest = hasher.hash_reader(&mut file)?;
    Ok(FileRecord { digest, mtime, size })
}
