//! File collection fingerprint
//!
//! The aggregate artifact of change detection: an ordered normalized
//! mapping, the compare strategy it pairs with, an optional per-root digest
//! index used as a comparison fast path, and a lazily memoized overall
//! digest. Immutable after construction except for the digest memo.

use crate::error::FingerprintError;
use crate::fingerprint::changes::ChangeVisitor;
use crate::fingerprint::compare::FingerprintCompareStrategy;
use crate::fingerprint::strategy::FingerprintingStrategy;
use crate::fingerprint::NormalizedSnapshotMap;
use crate::hashing::{default_hashers, Hasher, HasherFactory};
use crate::interner::StringInterner;
use crate::snapshot::{PhysicalSnapshot, SnapshotVisitor};
use crate::types::Hash;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Comparable, hashable, persistable record of a file collection's state at
/// one point in time.
pub struct FileCollectionFingerprint {
    snapshots: NormalizedSnapshotMap,
    compare_strategy: FingerprintCompareStrategy,
    /// Original roots, retained only for in-process reuse. Absent after
    /// deserialization.
    roots: Option<Vec<PhysicalSnapshot>>,
    /// Per-root digest index: each root's absolute path and its top-level
    /// digest, in root order. `None` when any root lacks a usable digest,
    /// which disables the comparison fast path for the whole fingerprint.
    root_hashes: Option<Vec<(Arc<str>, Hash)>>,
    /// Memoized overall digest. Racing recomputation is safe: the function
    /// is pure, so every writer stores the same value.
    cached_hash: RwLock<Option<Hash>>,
    hashers: Arc<dyn HasherFactory>,
}

static EMPTY: OnceLock<Arc<FileCollectionFingerprint>> = OnceLock::new();

impl FileCollectionFingerprint {
    /// The shared fingerprint of an empty file collection. Every empty
    /// normalization yields this same instance, so emptiness checks are
    /// identity checks.
    pub fn empty() -> Arc<FileCollectionFingerprint> {
        Arc::clone(EMPTY.get_or_init(|| {
            Arc::new(FileCollectionFingerprint {
                snapshots: NormalizedSnapshotMap::new(),
                compare_strategy: FingerprintCompareStrategy::Unordered,
                roots: None,
                root_hashes: None,
                cached_hash: RwLock::new(None),
                hashers: default_hashers(),
            })
        }))
    }

    /// Fingerprint snapshot roots under the given normalization strategy.
    ///
    /// Returns the shared empty fingerprint when the normalization produces
    /// no entries; no digests are computed in that case.
    pub fn from_roots(
        roots: Vec<PhysicalSnapshot>,
        strategy: FingerprintingStrategy,
        interner: &StringInterner,
        hashers: &Arc<dyn HasherFactory>,
    ) -> Arc<FileCollectionFingerprint> {
        let snapshots = strategy.collect_snapshots(&roots, interner, hashers.as_ref());
        if snapshots.is_empty() {
            return Self::empty();
        }
        let root_hashes = compute_root_hashes(&roots, interner);
        debug!(
            entries = snapshots.len(),
            roots = roots.len(),
            fast_path = root_hashes.is_some(),
            "Built file collection fingerprint"
        );
        Arc::new(FileCollectionFingerprint {
            snapshots,
            compare_strategy: strategy.compare_strategy(),
            roots: Some(roots),
            root_hashes,
            cached_hash: RwLock::new(None),
            hashers: Arc::clone(hashers),
        })
    }

    /// Reassemble a fingerprint from persisted parts. Roots are never
    /// persisted, so the result cannot replay them.
    pub fn from_persisted(
        snapshots: NormalizedSnapshotMap,
        compare_strategy: FingerprintCompareStrategy,
        hash: Option<Hash>,
        root_hashes: Option<Vec<(Arc<str>, Hash)>>,
        hashers: Arc<dyn HasherFactory>,
    ) -> Arc<FileCollectionFingerprint> {
        if snapshots.is_empty() {
            return Self::empty();
        }
        Arc::new(FileCollectionFingerprint {
            snapshots,
            compare_strategy,
            roots: None,
            root_hashes,
            cached_hash: RwLock::new(hash),
            hashers,
        })
    }

    /// The overall digest of the fingerprint under its compare strategy.
    ///
    /// Computed lazily and memoized; recomputation from identical inputs is
    /// bit-identical, so concurrent first calls may race harmlessly.
    pub fn hash(&self) -> Hash {
        if let Some(hash) = *self.cached_hash.read() {
            return hash;
        }
        let mut hasher = self.hashers.hasher();
        self.compare_strategy
            .append_to_hasher(hasher.as_mut(), &self.snapshots);
        let hash = hasher.finish();
        *self.cached_hash.write() = Some(hash);
        hash
    }

    /// Fold this fingerprint into an outer hasher (e.g. a build cache key).
    pub fn append_to_hasher(&self, hasher: &mut dyn Hasher) {
        hasher.put_hash(&self.hash());
    }

    /// Report every difference against `previous` through the visitor.
    ///
    /// Fast path: when both fingerprints carry a root-hash index and the
    /// indices are equal (same root paths in the same order, same digests),
    /// the collections are reported unchanged without comparing individual
    /// entries — an unchanged top-level tree digest proves the whole
    /// subtree unchanged. The index equality is trusted over the entry
    /// mapping by design. Otherwise the compare strategy enumerates
    /// removals, modifications and (if requested) additions.
    ///
    /// Returns `true` if the full set of differences was enumerated (or the
    /// fast path proved there were none), `false` if the visitor aborted.
    pub fn visit_changes_since(
        &self,
        previous: &FileCollectionFingerprint,
        title: &str,
        include_added: bool,
        visitor: &mut dyn ChangeVisitor,
    ) -> bool {
        if self.has_same_root_hashes(previous) {
            debug!(title, "Root hashes unchanged, skipping entry comparison");
            return true;
        }
        self.compare_strategy.visit_changes_since(
            visitor,
            &self.snapshots,
            &previous.snapshots,
            title,
            include_added,
        )
    }

    fn has_same_root_hashes(&self, other: &FileCollectionFingerprint) -> bool {
        match (&self.root_hashes, &other.root_hashes) {
            (Some(current), Some(previous)) => current == previous,
            // Any unknown root digest disables the shortcut entirely.
            _ => false,
        }
    }

    /// Replay the original roots through a visitor.
    ///
    /// Fails with [`FingerprintError::RootsUnavailable`] when the roots were
    /// not retained, as after deserialization: persisted fingerprints are
    /// deliberately capability-reduced.
    pub fn visit_roots(&self, visitor: &mut dyn SnapshotVisitor) -> Result<(), FingerprintError> {
        let roots = self
            .roots
            .as_ref()
            .ok_or(FingerprintError::RootsUnavailable)?;
        for root in roots {
            root.accept(visitor);
        }
        Ok(())
    }

    pub fn snapshots(&self) -> &NormalizedSnapshotMap {
        &self.snapshots
    }

    pub fn compare_strategy(&self) -> FingerprintCompareStrategy {
        self.compare_strategy
    }

    /// The per-root digest index, if every root digest is known.
    pub fn root_hashes(&self) -> Option<&[(Arc<str>, Hash)]> {
        self.root_hashes.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub(crate) fn cached_hash(&self) -> Option<Hash> {
        *self.cached_hash.read()
    }
}

/// Collect each root's absolute path and top-level digest. A filtered or
/// missing root has no usable digest; that uncertainty makes the entire
/// index unknown rather than just the affected root.
fn compute_root_hashes(
    roots: &[PhysicalSnapshot],
    interner: &StringInterner,
) -> Option<Vec<(Arc<str>, Hash)>> {
    let mut hashes = Vec::with_capacity(roots.len());
    for root in roots {
        match root.root_hash() {
            Some(hash) => hashes.push((interner.intern(root.absolute_path()), *hash)),
            None => return None,
        }
    }
    Some(hashes)
}

impl PartialEq for FileCollectionFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.compare_strategy == other.compare_strategy
            && self.snapshots == other.snapshots
            && self.root_hashes == other.root_hashes
    }
}

impl Eq for FileCollectionFingerprint {}

impl fmt::Debug for FileCollectionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached_hash = *self.cached_hash.read();
        f.debug_struct("FileCollectionFingerprint")
            .field("snapshots", &self.snapshots)
            .field("compare_strategy", &self.compare_strategy)
            .field("has_roots", &self.roots.is_some())
            .field("root_hashes", &self.root_hashes)
            .field("cached_hash", &cached_hash.map(hex::encode))
            .finish()
    }
}
