//! End-to-end change detection over real file trees

use imprint::fingerprint::{
    ChangeKind, CollectingChangeVisitor, FileCollectionFingerprint, FingerprintingStrategy,
};
use imprint::hashing::default_hashers;
use imprint::interner::StringInterner;
use imprint::snapshot::snapshotter::FileSystemSnapshotter;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn fingerprint_of(root: &Path) -> Arc<FileCollectionFingerprint> {
    super::init_tracing();
    let snapshotter = FileSystemSnapshotter::new(default_hashers());
    let snapshot = snapshotter.snapshot(root).unwrap();
    let interner = StringInterner::new();
    FileCollectionFingerprint::from_roots(
        vec![snapshot],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &default_hashers(),
    )
}

/// Modifying one file reports exactly one modified entry, for that file.
#[test]
fn test_single_file_modification_detected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("x.txt"), "1").unwrap();
    fs::write(root.join("y.txt"), "2").unwrap();

    let before = fingerprint_of(root);
    fs::write(root.join("x.txt"), "9").unwrap();
    let after = fingerprint_of(root);

    let mut visitor = CollectingChangeVisitor::new();
    assert!(after.visit_changes_since(&before, "Inputs", true, &mut visitor));

    let changes = visitor.into_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Modified);
    assert!(changes[0].path.ends_with("x.txt"));
}

/// An unchanged tree compares clean through the root-hash fast path.
#[test]
fn test_unchanged_tree_reports_no_changes() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("b.txt"), "b").unwrap();

    let before = fingerprint_of(root);
    let after = fingerprint_of(root);

    assert!(before.root_hashes().is_some());
    let mut visitor = CollectingChangeVisitor::new();
    assert!(after.visit_changes_since(&before, "Inputs", true, &mut visitor));
    assert!(visitor.changes().is_empty());
}

#[test]
fn test_added_and_removed_files_detected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("keep.txt"), "keep").unwrap();
    fs::write(root.join("old.txt"), "old").unwrap();

    let before = fingerprint_of(root);
    fs::remove_file(root.join("old.txt")).unwrap();
    fs::write(root.join("new.txt"), "new").unwrap();
    let after = fingerprint_of(root);

    let mut visitor = CollectingChangeVisitor::new();
    assert!(after.visit_changes_since(&before, "Inputs", true, &mut visitor));

    let changes = visitor.into_changes();
    let removed: Vec<_> = changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Removed)
        .collect();
    let added: Vec<_> = changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Added)
        .collect();
    assert_eq!(removed.len(), 1);
    assert!(removed[0].path.ends_with("old.txt"));
    assert_eq!(added.len(), 1);
    assert!(added[0].path.ends_with("new.txt"));
}

#[test]
fn test_additions_suppressed_when_not_requested() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("a.txt"), "a").unwrap();

    let before = fingerprint_of(root);
    fs::write(root.join("b.txt"), "b").unwrap();
    let after = fingerprint_of(root);

    let mut visitor = CollectingChangeVisitor::new();
    assert!(after.visit_changes_since(&before, "Outputs", false, &mut visitor));
    assert!(visitor.changes().is_empty());
}

/// Two fingerprints of the same unchanged file have identical overall
/// digests.
#[test]
fn test_same_content_same_fingerprint_hash() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("input.txt");
    fs::write(&file, "stable content").unwrap();

    let snapshotter = FileSystemSnapshotter::new(default_hashers());
    let interner = StringInterner::new();
    let hashers = default_hashers();

    let a = FileCollectionFingerprint::from_roots(
        vec![snapshotter.snapshot(&file).unwrap()],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &hashers,
    );
    let b = FileCollectionFingerprint::from_roots(
        vec![snapshotter.snapshot(&file).unwrap()],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &hashers,
    );

    assert_eq!(a.hash(), b.hash());
}

/// A missing input root disables the fast path but still fingerprints.
#[test]
fn test_missing_root_disables_fast_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("not-yet-generated.txt");

    let snapshotter = FileSystemSnapshotter::new(default_hashers());
    let interner = StringInterner::new();
    let fp = FileCollectionFingerprint::from_roots(
        vec![snapshotter.snapshot(&missing).unwrap()],
        FingerprintingStrategy::AbsolutePath,
        &interner,
        &default_hashers(),
    );

    assert!(!fp.is_empty());
    assert!(fp.root_hashes().is_none());
}
