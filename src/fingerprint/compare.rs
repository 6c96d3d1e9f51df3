//! Fingerprint compare strategies.
//!
//! A compare strategy defines both how two normalized mappings are diffed
//! and how a single mapping folds into one digest. The variant set is
//! closed and its ordinals are persisted, so variants must never be
//! reordered or removed.

use crate::fingerprint::changes::{ChangeVisitor, FileChange};
use crate::fingerprint::NormalizedSnapshotMap;
use crate::hashing::Hasher;

/// Comparison and hashing semantics for a normalized mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintCompareStrategy {
    /// Set-like comparison: iteration order is irrelevant, entries are
    /// matched by key. The digest is order-independent.
    Unordered,
    /// Sequence comparison: entries are compared pairwise in mapping order
    /// and any positional divergence is a change. The digest folds entries
    /// in mapping order.
    Ordered,
}

impl FingerprintCompareStrategy {
    /// Stable ordinal used in the persisted format.
    pub fn ordinal(&self) -> u64 {
        match self {
            FingerprintCompareStrategy::Unordered => 0,
            FingerprintCompareStrategy::Ordered => 1,
        }
    }

    pub fn from_ordinal(ordinal: u64) -> Option<Self> {
        match ordinal {
            0 => Some(FingerprintCompareStrategy::Unordered),
            1 => Some(FingerprintCompareStrategy::Ordered),
            _ => None,
        }
    }

    /// Report every difference between `previous` and `current` through the
    /// visitor: removals first, then modifications, then (only if
    /// `include_added`) additions. Returns `false` as soon as the visitor
    /// aborts, `true` once the full set of differences was enumerated.
    pub fn visit_changes_since(
        &self,
        visitor: &mut dyn ChangeVisitor,
        current: &NormalizedSnapshotMap,
        previous: &NormalizedSnapshotMap,
        title: &str,
        include_added: bool,
    ) -> bool {
        match self {
            FingerprintCompareStrategy::Unordered => {
                visit_unordered_changes(visitor, current, previous, title, include_added)
            }
            FingerprintCompareStrategy::Ordered => {
                visit_ordered_changes(visitor, current, previous, title, include_added)
            }
        }
    }

    /// Fold the mapping into the hasher: per entry the normalization key
    /// and the entry's digest. The unordered variant feeds entries sorted
    /// by key so that permuting insertion order cannot change the digest;
    /// the ordered variant feeds them in mapping order so that it does.
    pub fn append_to_hasher(&self, hasher: &mut dyn Hasher, snapshots: &NormalizedSnapshotMap) {
        match self {
            FingerprintCompareStrategy::Unordered => {
                let mut entries: Vec<_> = snapshots
                    .iter()
                    .map(|(key, snapshot)| (key.as_ref(), snapshot))
                    .collect();
                // Keys are unique, so sorting by key alone is total.
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (key, snapshot) in entries {
                    hasher.put_string(key);
                    hasher.put_hash(&snapshot.hash);
                }
            }
            FingerprintCompareStrategy::Ordered => {
                for (key, snapshot) in snapshots.iter() {
                    hasher.put_string(key);
                    hasher.put_hash(&snapshot.hash);
                }
            }
        }
    }
}

fn visit_unordered_changes(
    visitor: &mut dyn ChangeVisitor,
    current: &NormalizedSnapshotMap,
    previous: &NormalizedSnapshotMap,
    title: &str,
    include_added: bool,
) -> bool {
    for (key, snapshot) in previous.iter() {
        if !current.contains_key(key) {
            if !visitor.visit_change(FileChange::removed(title, key, snapshot.file_type)) {
                return false;
            }
        }
    }
    for (key, previous_snapshot) in previous.iter() {
        if let Some(current_snapshot) = current.get(key) {
            if current_snapshot != previous_snapshot {
                if !visitor.visit_change(FileChange::modified(
                    title,
                    key,
                    current_snapshot.file_type,
                )) {
                    return false;
                }
            }
        }
    }
    if include_added {
        for (key, snapshot) in current.iter() {
            if !previous.contains_key(key) {
                if !visitor.visit_change(FileChange::added(title, key, snapshot.file_type)) {
                    return false;
                }
            }
        }
    }
    true
}

/// Positional diff: after the first divergence in key sequence the rest of
/// `previous` counts as removed and the rest of `current` as added. No
/// minimal-edit-distance matching is attempted.
fn visit_ordered_changes(
    visitor: &mut dyn ChangeVisitor,
    current: &NormalizedSnapshotMap,
    previous: &NormalizedSnapshotMap,
    title: &str,
    include_added: bool,
) -> bool {
    let current_entries = current.entries();
    let previous_entries = previous.entries();

    let mut position = 0;
    while position < current_entries.len() && position < previous_entries.len() {
        let (current_key, current_snapshot) = &current_entries[position];
        let (previous_key, previous_snapshot) = &previous_entries[position];
        if current_key != previous_key {
            break;
        }
        if current_snapshot != previous_snapshot {
            if !visitor.visit_change(FileChange::modified(
                title,
                current_key,
                current_snapshot.file_type,
            )) {
                return false;
            }
        }
        position += 1;
    }

    for (key, snapshot) in &previous_entries[position..] {
        if !visitor.visit_change(FileChange::removed(title, key, snapshot.file_type)) {
            return false;
        }
    }
    if include_added {
        for (key, snapshot) in &current_entries[position..] {
            if !visitor.visit_change(FileChange::added(title, key, snapshot.file_type)) {
                return false;
            }
        }
    }
    true
}
