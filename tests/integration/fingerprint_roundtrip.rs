//! Serialization round-trips for fingerprints built from real file trees

use imprint::encoding::{Decoder, Encoder};
use imprint::fingerprint::{
    FileCollectionFingerprint, FingerprintSerializer, FingerprintingStrategy,
};
use imprint::hashing::default_hashers;
use imprint::interner::StringInterner;
use imprint::snapshot::snapshotter::FileSystemSnapshotter;
use imprint::snapshot::{PhysicalSnapshot, SnapshotVisitor};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct NoopVisitor;

impl SnapshotVisitor for NoopVisitor {
    fn pre_visit_directory(&mut self, _directory: &PhysicalSnapshot) -> bool {
        true
    }
    fn visit(&mut self, _snapshot: &PhysicalSnapshot) {}
    fn post_visit_directory(&mut self) {}
}

fn build_tree(temp_dir: &TempDir) {
    let root = temp_dir.path();
    fs::write(root.join("a.txt"), "alpha").unwrap();
    fs::write(root.join("b.txt"), "beta").unwrap();
    fs::create_dir(root.join("nested")).unwrap();
    fs::write(root.join("nested").join("c.txt"), "gamma").unwrap();
}

#[test]
fn test_roundtrip_for_every_strategy() {
    let temp_dir = TempDir::new().unwrap();
    build_tree(&temp_dir);

    let snapshotter = FileSystemSnapshotter::new(default_hashers());
    let interner = Arc::new(StringInterner::new());
    let hashers = default_hashers();
    let serializer = FingerprintSerializer::new(Arc::clone(&interner), Arc::clone(&hashers));

    for strategy in [
        FingerprintingStrategy::AbsolutePath,
        FingerprintingStrategy::RelativePath,
        FingerprintingStrategy::NameOnly,
        FingerprintingStrategy::IgnoredPath,
    ] {
        let snapshot = snapshotter.snapshot(temp_dir.path()).unwrap();
        let original =
            FileCollectionFingerprint::from_roots(vec![snapshot], strategy, &interner, &hashers);

        let mut buffer = Vec::new();
        serializer
            .write(&mut Encoder::new(&mut buffer), &original)
            .unwrap();
        let restored = serializer.read(&mut Decoder::new(buffer.as_slice())).unwrap();

        assert_eq!(restored.hash(), original.hash());
        assert_eq!(restored.snapshots(), original.snapshots());
        assert_eq!(restored.compare_strategy(), original.compare_strategy());
        assert_eq!(restored.root_hashes(), original.root_hashes());
    }
}

/// Persistence drops the retained roots: a restored fingerprint can still
/// be compared and hashed, but no longer replayed.
#[test]
fn test_restored_fingerprint_cannot_replay_roots() {
    let temp_dir = TempDir::new().unwrap();
    build_tree(&temp_dir);

    let snapshotter = FileSystemSnapshotter::new(default_hashers());
    let interner = Arc::new(StringInterner::new());
    let hashers = default_hashers();
    let serializer = FingerprintSerializer::new(Arc::clone(&interner), Arc::clone(&hashers));

    let original = FileCollectionFingerprint::from_roots(
        vec![snapshotter.snapshot(temp_dir.path()).unwrap()],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &hashers,
    );
    assert!(original.visit_roots(&mut NoopVisitor).is_ok());

    let mut buffer = Vec::new();
    serializer
        .write(&mut Encoder::new(&mut buffer), &original)
        .unwrap();
    let restored = serializer.read(&mut Decoder::new(buffer.as_slice())).unwrap();

    assert!(restored.visit_roots(&mut NoopVisitor).is_err());
}

/// A restored fingerprint compares clean against a fresh fingerprint of the
/// unchanged tree, through the persisted root-hash index.
#[test]
fn test_restored_fingerprint_compares_against_fresh_one() {
    let temp_dir = TempDir::new().unwrap();
    build_tree(&temp_dir);

    let snapshotter = FileSystemSnapshotter::new(default_hashers());
    let interner = Arc::new(StringInterner::new());
    let hashers = default_hashers();
    let serializer = FingerprintSerializer::new(Arc::clone(&interner), Arc::clone(&hashers));

    let original = FileCollectionFingerprint::from_roots(
        vec![snapshotter.snapshot(temp_dir.path()).unwrap()],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &hashers,
    );

    let mut buffer = Vec::new();
    serializer
        .write(&mut Encoder::new(&mut buffer), &original)
        .unwrap();
    let restored = serializer.read(&mut Decoder::new(buffer.as_slice())).unwrap();

    let fresh = FileCollectionFingerprint::from_roots(
        vec![snapshotter.snapshot(temp_dir.path()).unwrap()],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &hashers,
    );

    let mut visitor = imprint::fingerprint::CollectingChangeVisitor::new();
    assert!(fresh.visit_changes_since(&restored, "Inputs", true, &mut visitor));
    assert!(visitor.changes().is_empty());
}
