//! Reclassifies matching delete/add pairs as moves.
//!
//! Deleted paths are bucketed by their old digest and added paths by their
//! new digest. Within a digest shared by both sides, paths are paired in
//! lexicographic order up to the shorter list's length. A pair becomes a
//! move only if its metadata passes [`MovePolicy::compatible`]; a rejected
//! pair stays a plain delete plus a plain add.

use crate::record::{FileRecord, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: String,
    pub to: String,
}

/// Metadata guard applied on top of digest equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovePolicy {
    /// Pairs whose mtimes differ by this many seconds or more are rejected.
    pub mtime_window_secs: f64,
    pub require_same_size: bool,
}

impl Default for MovePolicy {
    fn default() -> Self {
        Self {
            mtime_window_secs: 2.0,
            require_same_size: true,
        }
    }
}

impl MovePolicy {
    pub fn with_window(mtime_window_secs: f64) -> Self {
        Self {
            mtime_window_secs,
            ..Self::default()
        }
    }

    pub fn compatible(&self, old: &FileRecord, new: &FileRecord) -> bool {
        if self.require_same_size && old.size != new.size {
            return false;
        }
        (old.mtime - new.mtime).abs() < self.mtime_window_secs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveDetection {
    pub moves: Vec<Move>,
    /// Added paths that were not paired.
    pub added: Vec<String>,
    /// Deleted paths that were not paired.
    pub deleted: Vec<String>,
}

pub fn detect_moves(
    added: &[String],
    deleted: &[String],
    old: &Snapshot,
    new: &Snapshot,
    policy: &MovePolicy,
) -> MoveDetection {
    let deleted_by_digest = bucket(deleted, old);
    let added_by_digest = bucket(added, new);

    let mut moves = Vec::new();
    for (digest, gone) in &deleted_by_digest {
        let Some(arrived) = added_by_digest.get(digest) else {
            continue;
        };
        for ((from, old_rec), (to, new_rec)) in gone.iter().zip(arrived.iter()) {
            if policy.compatible(old_rec, new_rec) {
                moves.push(Move {
                    from: (*from).to_string(),
                    to: (*to).to_string(),
                });
            }
        }
    }
    moves.sort();

    let moved_from: HashSet<&str> = moves.iter().map(|m| m.from.as_str()).collect();
    let moved_to: HashSet<&str> = moves.iter().map(|m| m.to.as_str()).collect();

    let mut remaining_added: Vec<String> = added
        .iter()
        .filter(|p| !moved_to.contains(p.as_str()))
        .cloned()
        .collect();
    let mut remaining_deleted: Vec<String> = deleted
        .iter()
        .filter(|p| !moved_from.contains(p.as_str()))
        .cloned()
        .collect();
    remaining_added.sort();
    remaining_deleted.sort();

    MoveDetection {
        moves,
        added: remaining_added,
        deleted: remaining_deleted,
    }
}

/// digest → (path, record), paths sorted within each bucket.
fn bucket<'a>(
    paths: &'a [String],
    snapshot: &'a Snapshot,
) -> BTreeMap<&'a str, Vec<(&'a str, &'a FileRecord)>> {
    let mut buckets: BTreeMap<&str, Vec<(&str, &FileRecord)>> = BTreeMap::new();
    for path in paths {
        if let Some(rec) = snapshot.get(path) {
            buckets
                .entry(rec.digest.as_str())
                .or_default()
                .push((path.as_str(), rec));
        }
    }
    for list in buckets.values_mut() {
        list.sort_by(|a, b| a.0.cmp(b.0));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(entries: &[(&str, &str, u64, f64)]) -> Snapshot {
        entries
            .iter()
            .map(|(p, d, size, mtime)| (p.to_string(), FileRecord::new(*d, *mtime, *size)))
            .collect()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pairs_same_digest_within_window() {
        let old = snap(&[("/a", "D", 10, 100.0)]);
        let new = snap(&[("/b", "D", 10, 101.0)]);
        let out = detect_moves(&strings(&["/b"]), &strings(&["/a"]), &old, &new, &MovePolicy::default());
        assert_eq!(
            out.moves,
            vec![Move {
                from: "/a".into(),
                to: "/b".into()
            }]
        );
        assert!(out.added.is_empty());
        assert!(out.deleted.is_empty());
    }

    #[test]
    fn window_is_exclusive() {
        let old = snap(&[("/a", "D", 10, 100.0)]);
        let new = snap(&[("/b", "D", 10, 102.0)]);
        let out = detect_moves(&strings(&["/b"]), &strings(&["/a"]), &old, &new, &MovePolicy::default());
        assert!(out.moves.is_empty());
        assert_eq!(out.added, strings(&["/b"]));
        assert_eq!(out.deleted, strings(&["/a"]));
    }

    #[test]
    fn size_mismatch_rejects_pair() {
        let old = snap(&[("/a", "D", 10, 100.0)]);
        let new = snap(&[("/b", "D", 11, 100.0)]);
        let out = detect_moves(&strings(&["/b"]), &strings(&["/a"]), &old, &new, &MovePolicy::default());
        assert!(out.moves.is_empty());

        let lenient = MovePolicy {
            require_same_size: false,
            ..MovePolicy::default()
        };
        let out = detect_moves(&strings(&["/b"]), &strings(&["/a"]), &old, &new, &lenient);
        assert_eq!(out.moves.len(), 1);
    }

    #[test]
    fn wider_window_accepts_older_copies() {
        let old = snap(&[("/a", "D", 10, 100.0)]);
        let new = snap(&[("/b", "D", 10, 160.0)]);
        let out = detect_moves(
            &strings(&["/b"]),
            &strings(&["/a"]),
            &old,
            &new,
            &MovePolicy::with_window(120.0),
        );
        assert_eq!(out.moves.len(), 1);
    }

    #[test]
    fn duplicates_pair_in_sorted_order_and_excess_stays() {
        let old = snap(&[
            ("/old/3", "D", 4, 1.0),
            ("/old/1", "D", 4, 1.0),
            ("/old/2", "D", 4, 1.0),
        ]);
        let new = snap(&[("/new/b", "D", 4, 1.0), ("/new/a", "D", 4, 1.0)]);
        // input order deliberately unsorted
        let out = detect_moves(
            &strings(&["/new/b", "/new/a"]),
            &strings(&["/old/3", "/old/1", "/old/2"]),
            &old,
            &new,
            &MovePolicy::default(),
        );
        assert_eq!(
            out.moves,
            vec![
                Move { from: "/old/1".into(), to: "/new/a".into() },
                Move { from: "/old/2".into(), to: "/new/b".into() },
            ]
        );
        assert!(out.added.is_empty());
        assert_eq!(out.deleted, strings(&["/old/3"]));
    }

    #[test]
    fn unrelated_digests_never_pair() {
        let old = snap(&[("/a", "D1", 4, 1.0)]);
        let new = snap(&[("/b", "D2", 4, 1.0)]);
        let out = detect_moves(&strings(&["/b"]), &strings(&["/a"]), &old, &new, &MovePolicy::default());
        assert!(out.moves.is_empty());
        assert_eq!(out.added, strings(&["/b"]));
        assert_eq!(out.deleted, strings(&["/a"]));
    }
}
