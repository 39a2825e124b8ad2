//! Render-agnostic summary of a [`ChangeSet`].

use crate::diff::ChangeSet;
use crate::record::Snapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Moved,
    Added,
    Deleted,
    Modified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
    pub moved: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.modified + self.moved
    }

    /// One-line form used for notifications.
    pub fn summary_line(&self) -> String {
        format!(
            "Changes: +{} -{} *{} ↔{}",
            self.added, self.deleted, self.modified, self.moved
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub kind: ChangeKind,
    /// Current path; for deletions, the path that disappeared.
    pub path: String,
    pub moved_from: Option<String>,
    pub size: Option<u64>,
    pub mtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub counts: ChangeCounts,
    /// Moved, added, deleted, then modified; sorted by path within each group.
    pub entries: Vec<ReportEntry>,
}

impl ChangeSummary {
    pub fn entries_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Report {
    NoChanges,
    Changes(ChangeSummary),
}

impl Report {
    /// Annotations come from `current`; deleted files get none.
    pub fn build(changes: &ChangeSet, current: &Snapshot) -> Self {
        if changes.is_empty() {
            return Self::NoChanges;
        }

        let annotated = |kind: ChangeKind, path: &str, moved_from: Option<String>| {
            let rec = current.get(path);
            ReportEntry {
                kind,
                path: path.to_string(),
                moved_from,
                size: rec.map(|r| r.size),
                mtime: rec.map(|r| r.mtime),
            }
        };

        let mut entries = Vec::with_capacity(changes.total());

        let mut moves: Vec<_> = changes.moves.iter().collect();
        moves.sort();
        entries.extend(
            moves
                .into_iter()
                .map(|m| annotated(ChangeKind::Moved, &m.to, Some(m.from.clone()))),
        );
        entries.extend(
            sorted(&changes.added)
                .into_iter()
                .map(|p| annotated(ChangeKind::Added, p, None)),
        );
        entries.extend(sorted(&changes.deleted).into_iter().map(|p| ReportEntry {
            kind: ChangeKind::Deleted,
            path: p.to_string(),
            moved_from: None,
            size: None,
            mtime: None,
        }));
        entries.extend(
            sorted(&changes.modified)
                .into_iter()
                .map(|p| annotated(ChangeKind::Modified, p, None)),
        );

        Self::Changes(ChangeSummary {
            counts: changes.counts(),
            entries,
        })
    }

    pub fn counts(&self) -> ChangeCounts {
        match self {
            Self::NoChanges => ChangeCounts::default(),
            Self::Changes(summary) => summary.counts,
        }
    }

    pub fn has_changes(&self) -> bool {
        matches!(self, Self::Changes(_))
    }
}

fn sorted(paths: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = paths.iter().map(String::as_str).collect();
    v.sort_unstable();
    v
}

/// Human readable byte count: `0B`, `512B`, `1.5KB`, … `PB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{size:.1}{}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Move;
    use crate::record::FileRecord;

    #[test]
    fn empty_change_set_is_no_changes() {
        let report = Report::build(&ChangeSet::default(), &Snapshot::new());
        assert_eq!(report, Report::NoChanges);
        assert_eq!(report.counts().total(), 0);
        assert!(!report.has_changes());
    }

    #[test]
    fn entries_are_grouped_and_annotated_from_current() {
        let current: Snapshot = [
            ("/new".to_string(), FileRecord::new("a", 10.0, 100)),
            ("/edited".to_string(), FileRecord::new("b", 20.0, 200)),
            ("/moved-to".to_string(), FileRecord::new("c", 30.0, 300)),
        ]
        .into_iter()
        .collect();
        let changes = ChangeSet {
            added: vec!["/new".into()],
            deleted: vec!["/z-gone".into(), "/a-gone".into()],
            modified: vec!["/edited".into()],
            moves: vec![Move {
                from: "/moved-from".into(),
                to: "/moved-to".into(),
            }],
        };

        let Report::Changes(summary) = Report::build(&changes, &current) else {
            panic!("expected changes");
        };
        let kinds: Vec<ChangeKind> = summary.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Moved,
                ChangeKind::Added,
                ChangeKind::Deleted,
                ChangeKind::Deleted,
                ChangeKind::Modified,
            ]
        );
        assert_eq!(summary.entries[0].moved_from.as_deref(), Some("/moved-from"));
        assert_eq!(summary.entries[0].size, Some(300));
        assert_eq!(summary.entries[1].mtime, Some(10.0));
        assert_eq!(summary.entries[2].path, "/a-gone");
        assert_eq!(summary.entries[2].size, None);
        assert_eq!(summary.counts.total(), 5);
        assert_eq!(summary.counts.summary_line(), "Changes: +1 -2 *1 ↔1");
        assert_eq!(summary.entries_of(ChangeKind::Deleted).count(), 2);
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(0), "0B");
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(1536), "1.5KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0MB");
    }
}
