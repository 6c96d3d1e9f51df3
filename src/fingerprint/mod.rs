//! File collection fingerprinting
//!
//! Converts physical snapshot trees into normalized, comparable, hashable,
//! persistable fingerprints. A fingerprinting strategy flattens the trees
//! into an ordered mapping from a normalization key to a per-entry record;
//! a compare strategy defines how two mappings are diffed and how one
//! mapping folds into a single digest.

pub mod changes;
pub mod collection;
pub mod compare;
pub mod serializer;
pub mod strategy;

pub use changes::{ChangeKind, ChangeVisitor, CollectingChangeVisitor, FileChange};
pub use collection::FileCollectionFingerprint;
pub use compare::FingerprintCompareStrategy;
pub use serializer::FingerprintSerializer;
pub use strategy::FingerprintingStrategy;

use crate::types::Hash;
use std::collections::HashMap;
use std::sync::Arc;

/// File-type tag of a normalized entry. Ordinals are persisted and must
/// stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
    Missing,
}

impl FileType {
    pub fn ordinal(&self) -> u64 {
        match self {
            FileType::RegularFile => 0,
            FileType::Directory => 1,
            FileType::Missing => 2,
        }
    }

    pub fn from_ordinal(ordinal: u64) -> Option<Self> {
        match ordinal {
            0 => Some(FileType::RegularFile),
            1 => Some(FileType::Directory),
            2 => Some(FileType::Missing),
            _ => None,
        }
    }
}

/// Per-entry record of a normalized mapping: the file-type tag and the
/// entry's digest. For regular files the digest is the content digest; for
/// directories and missing entries it is a fixed type signature, so that a
/// directory's identity in the mapping never depends on tree digests that
/// may be unknown for filtered walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedSnapshot {
    pub file_type: FileType,
    pub hash: Hash,
}

/// Insertion-ordered mapping from normalization key to [`NormalizedSnapshot`].
///
/// Keys are unique; insertion order is preserved and is semantically
/// significant for order-sensitive compare strategies. Equality compares
/// entries in order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSnapshotMap {
    entries: Vec<(Arc<str>, NormalizedSnapshot)>,
    index: HashMap<Arc<str>, usize>,
}

impl NormalizedSnapshotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key is already present. Returns whether the entry
    /// was inserted: the first occurrence of a key wins.
    pub fn insert_if_absent(&mut self, key: Arc<str>, snapshot: NormalizedSnapshot) -> bool {
        if self.index.contains_key(key.as_ref()) {
            return false;
        }
        self.index.insert(Arc::clone(&key), self.entries.len());
        self.entries.push((key, snapshot));
        true
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedSnapshot> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &NormalizedSnapshot)> {
        self.entries.iter().map(|(key, snapshot)| (key, snapshot))
    }

    /// Entries in insertion order, as a slice.
    pub fn entries(&self) -> &[(Arc<str>, NormalizedSnapshot)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for NormalizedSnapshotMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for NormalizedSnapshotMap {}
