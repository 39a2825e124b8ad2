use crate::moves::{detect_moves, Move, MovePolicy};
use crate::record::Snapshot;
use crate::report::ChangeCounts;
use serde::{Deserialize, Serialize};

/// Classified difference between two snapshots.
///
/// Every old path is in exactly one of deleted, modified, `moves[..].from`
/// or unchanged; every new path is in exactly one of added, modified,
/// `moves[..].to` or unchanged. All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
    pub moves: Vec<Move>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len() + self.moves.len()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            added: self.added.len(),
            deleted: self.deleted.len(),
            modified: self.modified.len(),
            moved: self.moves.len(),
        }
    }
}

/// Compare `old` against `new`. Only digests decide modification; size or
/// mtime drift with an equal digest is unchanged.
pub fn diff(old: &Snapshot, new: &Snapshot, policy: &MovePolicy) -> ChangeSet {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    for (path, rec) in new.iter() {
        match old.get(path) {
            None => added.push(path.to_string()),
            Some(prev) if prev.digest != rec.digest => modified.push(path.to_string()),
            Some(_) => {}
        }
    }

    let deleted: Vec<String> = old
        .paths()
        .filter(|p| !new.contains(p))
        .map(str::to_string)
        .collect();

    let detection = detect_moves(&added, &deleted, old, new, policy);

    ChangeSet {
        added: detection.added,
        deleted: detection.deleted,
        modified,
        moves: detection.moves,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FileRecord;
    use std::collections::HashSet;

    fn snap(entries: &[(&str, &str, u64, f64)]) -> Snapshot {
        entries
            .iter()
            .map(|(p, d, size, mtime)| (p.to_string(), FileRecord::new(*d, *mtime, *size)))
            .collect()
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let s = snap(&[("/a", "1", 1, 1.0), ("/b", "2", 2, 2.0), ("/c", "2", 2, 2.0)]);
        let cs = diff(&s, &s, &MovePolicy::default());
        assert!(cs.is_empty());
        assert_eq!(cs, ChangeSet::default());
    }

    #[test]
    fn metadata_drift_alone_is_not_a_change() {
        let old = snap(&[("/a", "D", 10, 1.0)]);
        let new = snap(&[("/a", "D", 99, 5000.0)]);
        assert!(diff(&old, &new, &MovePolicy::default()).is_empty());
    }

    #[test]
    fn classifies_each_category() {
        let old = snap(&[
            ("/keep", "K", 1, 1.0),
            ("/edit", "E1", 1, 1.0),
            ("/gone", "G", 1, 1.0),
            ("/from", "M", 5, 10.0),
        ]);
        let new = snap(&[
            ("/keep", "K", 1, 1.0),
            ("/edit", "E2", 2, 3.0),
            ("/fresh", "F", 1, 1.0),
            ("/to", "M", 5, 10.5),
        ]);
        let cs = diff(&old, &new, &MovePolicy::default());
        assert_eq!(cs.added, vec!["/fresh"]);
        assert_eq!(cs.deleted, vec!["/gone"]);
        assert_eq!(cs.modified, vec!["/edit"]);
        assert_eq!(
            cs.moves,
            vec![Move {
                from: "/from".into(),
                to: "/to".into()
            }]
        );
        assert_eq!(cs.total(), 4);
    }

    #[test]
    fn categories_partition_the_path_universe() {
        let old = snap(&[
            ("/1", "A", 1, 1.0),
            ("/2", "A", 1, 1.0),
            ("/3", "B", 1, 1.0),
            ("/4", "C", 1, 1.0),
            ("/5", "D", 1, 1.0),
        ]);
        let new = snap(&[
            ("/1", "A", 1, 1.0),
            ("/6", "A", 1, 1.0),
            ("/7", "A", 1, 1.0),
            ("/3", "X", 1, 1.0),
            ("/8", "C", 1, 50.0),
        ]);
        let cs = diff(&old, &new, &MovePolicy::default());

        let unchanged_old: HashSet<&str> = old
            .iter()
            .filter(|(p, r)| new.get(p).is_some_and(|n| n.digest == r.digest))
            .map(|(p, _)| p)
            .collect();

        let mut old_side: Vec<&str> = cs.deleted.iter().map(String::as_str).collect();
        old_side.extend(cs.modified.iter().map(String::as_str));
        old_side.extend(cs.moves.iter().map(|m| m.from.as_str()));
        old_side.extend(unchanged_old.iter().copied());
        old_side.sort();
        assert_eq!(old_side, old.paths().collect::<Vec<_>>());

        let mut new_side: Vec<&str> = cs.added.iter().map(String::as_str).collect();
        new_side.extend(cs.modified.iter().map(String::as_str));
        new_side.extend(cs.moves.iter().map(|m| m.to.as_str()));
        new_side.extend(unchanged_old.iter().copied());
        new_side.sort();
        assert_eq!(new_side, new.paths().collect::<Vec<_>>());

        // /2 → /6 is the only move; /7 stays added, /4 vs /8 is too far apart in mtime
        assert_eq!(cs.moves.len(), 1);
        assert_eq!(cs.added, vec!["/7", "/8"]);
        assert_eq!(cs.deleted, vec!["/4", "/5"]);
    }

    #[test]
    fn empty_baseline_reports_everything_added() {
        let new = snap(&[("x.txt", "D", 3, 1.0)]);
        let cs = diff(&Snapshot::new(), &new, &MovePolicy::default());
        assert_eq!(cs.added, vec!["x.txt"]);
        assert!(cs.deleted.is_empty() && cs.modified.is_empty() && cs.moves.is_empty());
    }
}
