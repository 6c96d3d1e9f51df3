//! Property-based tests for digest determinism and permutation invariance

use imprint::encoding::{Decoder, Encoder};
use imprint::fingerprint::{
    FileCollectionFingerprint, FileType, FingerprintCompareStrategy, FingerprintSerializer,
    NormalizedSnapshot, NormalizedSnapshotMap,
};
use imprint::hashing::{content_hash, default_hashers};
use imprint::interner::StringInterner;
use imprint::snapshot::merkle::MerkleDirectorySnapshotBuilder;
use imprint::snapshot::{FileSnapshot, PhysicalSnapshot};
use imprint::types::Hash;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn build_directory(entries: &[(String, Vec<u8>)]) -> PhysicalSnapshot {
    let hashers = default_hashers();
    let mut builder = MerkleDirectorySnapshotBuilder::new(default_hashers());
    builder.enter_directory("/root", "root");
    for (name, content) in entries {
        builder.visit_entry(PhysicalSnapshot::File(FileSnapshot {
            absolute_path: format!("/root/{}", name),
            name: name.clone(),
            content_hash: content_hash(hashers.as_ref(), content),
        }));
    }
    builder.leave_directory();
    builder.into_result().unwrap()
}

/// Directory tree digests are invariant under the order in which entries
/// are visited.
#[test]
fn test_tree_hash_permutation_invariance_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::btree_map("[a-z]{1,8}", any::<Vec<u8>>(), 1..8),
            |files: BTreeMap<String, Vec<u8>>| {
                let forward: Vec<_> = files
                    .iter()
                    .map(|(name, content)| (name.clone(), content.clone()))
                    .collect();
                let mut reversed = forward.clone();
                reversed.reverse();

                let tree_forward = build_directory(&forward);
                let tree_reversed = build_directory(&reversed);

                assert_eq!(tree_forward.tree_hash(), tree_reversed.tree_hash());
                Ok(())
            },
        )
        .unwrap();
}

/// Adding an entry always changes the directory tree digest.
#[test]
fn test_tree_hash_sensitive_to_additions_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::btree_map("[a-z]{1,8}", any::<Vec<u8>>(), 1..6),
            |files: BTreeMap<String, Vec<u8>>| {
                let base: Vec<_> = files
                    .iter()
                    .map(|(name, content)| (name.clone(), content.clone()))
                    .collect();
                let mut extended = base.clone();
                // A name longer than the generated ones cannot collide.
                extended.push(("extraextra".to_string(), b"extra".to_vec()));

                assert_ne!(
                    build_directory(&base).tree_hash(),
                    build_directory(&extended).tree_hash()
                );
                Ok(())
            },
        )
        .unwrap();
}

fn snapshot_map(entries: &[(String, Hash)]) -> NormalizedSnapshotMap {
    let mut map = NormalizedSnapshotMap::new();
    for (key, hash) in entries {
        map.insert_if_absent(
            Arc::from(key.as_str()),
            NormalizedSnapshot {
                file_type: FileType::RegularFile,
                hash: *hash,
            },
        );
    }
    map
}

/// The unordered compare strategy's digest ignores mapping insertion order.
#[test]
fn test_unordered_digest_permutation_invariance_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::btree_map("[a-z/]{1,12}", any::<[u8; 32]>(), 1..10),
            |entries: BTreeMap<String, Hash>| {
                let forward: Vec<_> = entries
                    .iter()
                    .map(|(key, hash)| (key.clone(), *hash))
                    .collect();
                let mut reversed = forward.clone();
                reversed.reverse();

                let hashers = default_hashers();
                let mut hasher_forward = hashers.hasher();
                FingerprintCompareStrategy::Unordered
                    .append_to_hasher(hasher_forward.as_mut(), &snapshot_map(&forward));
                let mut hasher_reversed = hashers.hasher();
                FingerprintCompareStrategy::Unordered
                    .append_to_hasher(hasher_reversed.as_mut(), &snapshot_map(&reversed));

                assert_eq!(hasher_forward.finish(), hasher_reversed.finish());
                Ok(())
            },
        )
        .unwrap();
}

/// Serialization round-trips every fingerprint bit-identically.
#[test]
fn test_serializer_roundtrip_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    let serializer = FingerprintSerializer::new(Arc::new(StringInterner::new()), default_hashers());

    runner
        .run(
            &(
                prop::collection::btree_map("[ -~]{1,16}", (0u64..3, any::<[u8; 32]>()), 1..10),
                prop::bool::ANY,
            ),
            |(entries, ordered)| {
                let mut map = NormalizedSnapshotMap::new();
                for (key, (type_ordinal, hash)) in &entries {
                    map.insert_if_absent(
                        Arc::from(key.as_str()),
                        NormalizedSnapshot {
                            file_type: FileType::from_ordinal(*type_ordinal).unwrap(),
                            hash: *hash,
                        },
                    );
                }
                let strategy = if ordered {
                    FingerprintCompareStrategy::Ordered
                } else {
                    FingerprintCompareStrategy::Unordered
                };
                let original =
                    FileCollectionFingerprint::from_persisted(map, strategy, None, None, default_hashers());

                let mut buffer = Vec::new();
                serializer
                    .write(&mut Encoder::new(&mut buffer), &original)
                    .unwrap();
                let restored = serializer
                    .read(&mut Decoder::new(buffer.as_slice()))
                    .unwrap();

                assert_eq!(restored.snapshots(), original.snapshots());
                assert_eq!(restored.compare_strategy(), original.compare_strategy());
                assert_eq!(restored.hash(), original.hash());
                Ok(())
            },
        )
        .unwrap();
}
