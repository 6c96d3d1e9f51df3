//! Merkle directory snapshot builder
//!
//! A stateful, single-use, depth-first tree visitor that assigns every
//! directory a tree digest computed bottom-up from its children's digests.
//! The builder is driven by an explicit enter/visit/leave event stream, so
//! it can be exercised in tests with synthetic sequences and reused by any
//! walker that yields entries in a defined traversal order.

use crate::hashing::{directory_signature, HasherFactory};
use crate::snapshot::relative_path::RelativePathTracker;
use crate::snapshot::{DirectorySnapshot, FilteredDirectorySnapshot, PhysicalSnapshot};
use crate::types::Hash;
use std::sync::Arc;

/// Builds a fully hashed [`PhysicalSnapshot`] tree from a depth-first event
/// stream.
///
/// One builder handles exactly one traversal. Independent traversals run in
/// parallel on separate instances; a single instance must not be shared.
pub struct MerkleDirectorySnapshotBuilder {
    relative_path: RelativePathTracker,
    levels: Vec<Vec<PhysicalSnapshot>>,
    directory_paths: Vec<String>,
    hashers: Arc<dyn HasherFactory>,
    filtered: bool,
    result: Option<PhysicalSnapshot>,
}

impl MerkleDirectorySnapshotBuilder {
    /// Builder for an unfiltered walk: every directory gets a tree digest.
    pub fn new(hashers: Arc<dyn HasherFactory>) -> Self {
        Self::with_mode(hashers, false)
    }

    /// Builder for a walk whose contents were partially excluded by a path
    /// filter. Directories are produced as [`PhysicalSnapshot::Filtered`]
    /// with an unknown tree digest, since a digest over a partial listing
    /// would be indistinguishable from a digest over the real contents.
    pub fn filtered(hashers: Arc<dyn HasherFactory>) -> Self {
        Self::with_mode(hashers, true)
    }

    fn with_mode(hashers: Arc<dyn HasherFactory>, filtered: bool) -> Self {
        Self {
            relative_path: RelativePathTracker::new(),
            levels: Vec::new(),
            directory_paths: Vec::new(),
            hashers,
            filtered,
            result: None,
        }
    }

    /// Open a directory frame. Returns the descend signal for the caller
    /// driving the walk; eligible directories always descend.
    pub fn enter_directory(&mut self, absolute_path: &str, name: &str) -> bool {
        assert!(
            self.result.is_none(),
            "enter_directory after the traversal already completed"
        );
        self.relative_path.enter(name);
        self.levels.push(Vec::new());
        self.directory_paths.push(absolute_path.to_string());
        true
    }

    /// Record a leaf or prehashed subtree.
    ///
    /// At the root of the walk the entry *is* the result: a file collection
    /// root can itself be a bare file.
    pub fn visit_entry(&mut self, snapshot: PhysicalSnapshot) {
        if self.relative_path.is_root() {
            assert!(
                self.result.is_none(),
                "visit_entry after the traversal already completed"
            );
            self.result = Some(snapshot);
        } else {
            self.levels
                .last_mut()
                .expect("open directory frame")
                .push(snapshot);
        }
    }

    /// Close the innermost directory frame, hashing its sorted children.
    ///
    /// Panics if no directory is open: leaving a directory that was never
    /// entered is a traversal contract violation and must not silently
    /// produce a wrong tree.
    pub fn leave_directory(&mut self) {
        let name = self.relative_path.leave();
        let mut children = self.levels.pop().expect("open directory frame");
        let absolute_path = self.directory_paths.pop().expect("open directory frame");

        // Names are unique within one directory, so this order is total.
        children.sort_by(|a, b| a.name().cmp(b.name()));

        let directory = if self.filtered {
            PhysicalSnapshot::Filtered(FilteredDirectorySnapshot {
                absolute_path,
                name,
                children,
            })
        } else {
            let tree_hash = self.hash_children(&children);
            PhysicalSnapshot::Directory(DirectorySnapshot {
                absolute_path,
                name,
                children,
                tree_hash,
            })
        };

        match self.levels.last_mut() {
            Some(siblings) => siblings.push(directory),
            None => self.result = Some(directory),
        }
    }

    fn hash_children(&self, children: &[PhysicalSnapshot]) -> Hash {
        let mut hasher = self.hashers.hasher();
        hasher.put_hash(&directory_signature(self.hashers.as_ref()));
        for child in children {
            hasher.put_string(child.name());
            let digest = match child {
                PhysicalSnapshot::Directory(d) => &d.tree_hash,
                PhysicalSnapshot::File(f) => &f.content_hash,
                PhysicalSnapshot::Filtered(_) | PhysicalSnapshot::Missing(_) => {
                    panic!("child of a hashed directory has no usable digest")
                }
            };
            hasher.put_hash(digest);
        }
        hasher.finish()
    }

    /// True while no directory frame is open.
    pub fn is_root(&self) -> bool {
        self.relative_path.is_root()
    }

    /// The completed snapshot tree, or `None` if the traversal produced no
    /// entries.
    pub fn into_result(self) -> Option<PhysicalSnapshot> {
        self.result
    }
}
