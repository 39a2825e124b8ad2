//! Content-hash change detection for a directory tree.
//!
//! A scan reduces a directory to a [`Snapshot`] (path → digest, mtime, size).
//! Two snapshots are compared by [`diff`], which classifies every path as
//! added, deleted, modified, unchanged or moved. Moves are recovered from
//! matching delete/add pairs by [`detect_moves`].
//!
//! ```text
//!  SnapshotStore (old) ─┐
//!                        ├─► diff ─► detect_moves ─► Report ─► SnapshotStore (new)
//!  Scanner (new) ───────┘
//! ```

pub mod diff;
pub mod error;
pub mod hasher;
pub mod ignore;
pub mod monitor;
pub mod moves;
pub mod paths;
pub mod record;
pub mod report;
pub mod scanner;
pub mod settings;
pub mod store;

pub use diff::{diff, ChangeSet};
pub use error::{ConfigError, StoreError};
pub use hasher::{ContentHasher, HashAlgorithm, StreamHasher};
pub use ignore::{IgnorePredicate, IgnoreRules};
pub use monitor::{BaselineOutcome, CycleOutcome, Monitor, MonitorOptions, Persistence};
pub use moves::{detect_moves, Move, MoveDetection, MovePolicy};
pub use record::{FileRecord, Snapshot};
pub use report::{ChangeCounts, ChangeKind, ChangeSummary, Report, ReportEntry};
pub use scanner::{ScanFailure, ScanOutcome, Scanner, ScannerConfig};
pub use settings::MonitorSettings;
pub use store::{snapshot_key, Baseline, SnapshotStore};
