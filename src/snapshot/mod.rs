//! Physical snapshot model
//!
//! Represents the on-disk state of a file collection as an immutable tree
//! with precomputed content and tree digests. A snapshot is one of four
//! variants: a regular file, a fully hashed directory, a missing path, or a
//! filtered directory whose tree digest is unknown because a path filter
//! excluded part of its contents.

pub mod merkle;
pub mod path;
pub mod relative_path;
pub mod snapshotter;

use crate::types::Hash;

/// Regular file snapshot with its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub absolute_path: String,
    pub name: String,
    pub content_hash: Hash,
}

/// Fully hashed directory snapshot.
///
/// Children are sorted by name; the tree digest is a pure function of the
/// children's (name, digest) pairs in that order and never depends on the
/// absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub absolute_path: String,
    pub name: String,
    pub children: Vec<PhysicalSnapshot>,
    pub tree_hash: Hash,
}

/// Directory snapshot whose children were partially excluded by a path
/// filter. Its tree digest is unknown, which is a first-class state:
/// consumers must not substitute a default digest for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredDirectorySnapshot {
    pub absolute_path: String,
    pub name: String,
    pub children: Vec<PhysicalSnapshot>,
}

/// Snapshot of an absent path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSnapshot {
    pub absolute_path: String,
    pub name: String,
}

/// Immutable tree describing the on-disk state of a file collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalSnapshot {
    File(FileSnapshot),
    Directory(DirectorySnapshot),
    Filtered(FilteredDirectorySnapshot),
    Missing(MissingSnapshot),
}

impl PhysicalSnapshot {
    pub fn absolute_path(&self) -> &str {
        match self {
            PhysicalSnapshot::File(f) => &f.absolute_path,
            PhysicalSnapshot::Directory(d) => &d.absolute_path,
            PhysicalSnapshot::Filtered(d) => &d.absolute_path,
            PhysicalSnapshot::Missing(m) => &m.absolute_path,
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        match self {
            PhysicalSnapshot::File(f) => &f.name,
            PhysicalSnapshot::Directory(d) => &d.name,
            PhysicalSnapshot::Filtered(d) => &d.name,
            PhysicalSnapshot::Missing(m) => &m.name,
        }
    }

    /// Content digest for regular files, `None` for everything else.
    pub fn content_hash(&self) -> Option<&Hash> {
        match self {
            PhysicalSnapshot::File(f) => Some(&f.content_hash),
            _ => None,
        }
    }

    /// Tree digest for fully hashed directories. Filtered directories have
    /// an unknown tree digest and return `None`.
    pub fn tree_hash(&self) -> Option<&Hash> {
        match self {
            PhysicalSnapshot::Directory(d) => Some(&d.tree_hash),
            _ => None,
        }
    }

    /// The digest representing this snapshot as a top-level root: the
    /// content digest for a file, the tree digest for a directory. Missing
    /// and filtered snapshots never contribute a usable digest.
    pub fn root_hash(&self) -> Option<&Hash> {
        match self {
            PhysicalSnapshot::File(f) => Some(&f.content_hash),
            PhysicalSnapshot::Directory(d) => Some(&d.tree_hash),
            PhysicalSnapshot::Filtered(_) | PhysicalSnapshot::Missing(_) => None,
        }
    }

    /// Depth-first traversal through a visitor. Directories are announced
    /// with `pre_visit_directory` (which can veto descent), leaves with
    /// `visit`, and every announced directory is closed with
    /// `post_visit_directory`.
    pub fn accept(&self, visitor: &mut dyn SnapshotVisitor) {
        match self {
            PhysicalSnapshot::File(_) | PhysicalSnapshot::Missing(_) => visitor.visit(self),
            PhysicalSnapshot::Directory(d) => {
                if visitor.pre_visit_directory(self) {
                    for child in &d.children {
                        child.accept(visitor);
                    }
                }
                visitor.post_visit_directory();
            }
            PhysicalSnapshot::Filtered(d) => {
                if visitor.pre_visit_directory(self) {
                    for child in &d.children {
                        child.accept(visitor);
                    }
                }
                visitor.post_visit_directory();
            }
        }
    }
}

/// Depth-first visitor over a [`PhysicalSnapshot`] tree.
pub trait SnapshotVisitor {
    /// Called before a directory's children. Return `false` to skip them;
    /// `post_visit_directory` is still called.
    fn pre_visit_directory(&mut self, directory: &PhysicalSnapshot) -> bool;

    /// Called for files and missing entries.
    fn visit(&mut self, snapshot: &PhysicalSnapshot);

    /// Called after a directory's children.
    fn post_visit_directory(&mut self);
}
