//! Fingerprinting strategies.
//!
//! A strategy turns a collection of physical snapshot roots into the flat,
//! insertion-ordered mapping a fingerprint is built from. Strategies differ
//! only in how the normalization key is derived from an entry; the paired
//! compare strategy is fixed per variant, since order sensitivity is a
//! property of the pair rather than an independent knob.

use crate::fingerprint::compare::FingerprintCompareStrategy;
use crate::fingerprint::{FileType, NormalizedSnapshot, NormalizedSnapshotMap};
use crate::hashing::{directory_signature, missing_signature, HasherFactory};
use crate::interner::StringInterner;
use crate::snapshot::relative_path::RelativePathTracker;
use crate::snapshot::{PhysicalSnapshot, SnapshotVisitor};
use crate::types::Hash;

/// How entries are identified across two snapshots of a file collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintingStrategy {
    /// Identity is the absolute path. Used for input/output sets where
    /// location matters.
    AbsolutePath,
    /// Identity is the path relative to the owning root (the root itself is
    /// identified by its name). Order-sensitive: the same entries in a
    /// different sequence are a change, as on a classpath.
    RelativePath,
    /// Identity is the bare file name, ignoring directory structure.
    NameOnly,
    /// Paths are ignored entirely; only file contents participate, as an
    /// unordered set.
    IgnoredPath,
}

impl FingerprintingStrategy {
    /// The compare strategy this normalization pairs with.
    pub fn compare_strategy(&self) -> FingerprintCompareStrategy {
        match self {
            FingerprintingStrategy::RelativePath => FingerprintCompareStrategy::Ordered,
            FingerprintingStrategy::AbsolutePath
            | FingerprintingStrategy::NameOnly
            | FingerprintingStrategy::IgnoredPath => FingerprintCompareStrategy::Unordered,
        }
    }

    /// Normalize snapshot roots into an ordered mapping.
    ///
    /// The traversal is depth-first with children in sorted-name order (the
    /// order the snapshots store), so the mapping's insertion order is
    /// reproducible for a given input. Keys are unique: the first occurrence
    /// of a key wins.
    pub fn collect_snapshots(
        &self,
        roots: &[PhysicalSnapshot],
        interner: &StringInterner,
        hashers: &dyn HasherFactory,
    ) -> NormalizedSnapshotMap {
        let mut collector = SnapshotCollector {
            strategy: *self,
            map: NormalizedSnapshotMap::new(),
            tracker: RelativePathTracker::new(),
            interner,
            directory_signature: directory_signature(hashers),
            missing_signature: missing_signature(hashers),
        };
        for root in roots {
            root.accept(&mut collector);
        }
        collector.map
    }
}

struct SnapshotCollector<'a> {
    strategy: FingerprintingStrategy,
    map: NormalizedSnapshotMap,
    tracker: RelativePathTracker,
    interner: &'a StringInterner,
    directory_signature: Hash,
    missing_signature: Hash,
}

impl SnapshotCollector<'_> {
    fn key_for(&self, snapshot: &PhysicalSnapshot) -> Option<String> {
        match self.strategy {
            FingerprintingStrategy::AbsolutePath => {
                Some(snapshot.absolute_path().to_string())
            }
            FingerprintingStrategy::RelativePath => {
                if self.tracker.is_root() {
                    Some(snapshot.name().to_string())
                } else {
                    Some(self.tracker.relative_path(snapshot.name()))
                }
            }
            FingerprintingStrategy::NameOnly => Some(snapshot.name().to_string()),
            FingerprintingStrategy::IgnoredPath => match snapshot.content_hash() {
                Some(hash) => Some(hex::encode(hash)),
                // Only file contents participate in this normalization.
                None => None,
            },
        }
    }

    fn record(&mut self, snapshot: &PhysicalSnapshot, normalized: NormalizedSnapshot) {
        if let Some(key) = self.key_for(snapshot) {
            self.map
                .insert_if_absent(self.interner.intern(&key), normalized);
        }
    }
}

impl SnapshotVisitor for SnapshotCollector<'_> {
    fn pre_visit_directory(&mut self, directory: &PhysicalSnapshot) -> bool {
        self.record(
            directory,
            NormalizedSnapshot {
                file_type: FileType::Directory,
                hash: self.directory_signature,
            },
        );
        self.tracker.enter(directory.name());
        true
    }

    fn visit(&mut self, snapshot: &PhysicalSnapshot) {
        let normalized = match snapshot {
            PhysicalSnapshot::File(file) => NormalizedSnapshot {
                file_type: FileType::RegularFile,
                hash: file.content_hash,
            },
            PhysicalSnapshot::Missing(_) => NormalizedSnapshot {
                file_type: FileType::Missing,
                hash: self.missing_signature,
            },
            PhysicalSnapshot::Directory(_) | PhysicalSnapshot::Filtered(_) => {
                unreachable!("directories are announced through pre_visit_directory")
            }
        };
        self.record(snapshot, normalized);
    }

    fn post_visit_directory(&mut self) {
        self.tracker.leave();
    }
}
