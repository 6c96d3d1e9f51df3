//! Change reporting for fingerprint comparison.

use crate::fingerprint::FileType;
use std::fmt;

/// What happened to an entry between two fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// A single reported difference between two fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    /// Human-readable description of the compared property, e.g.
    /// `"Input files"`.
    pub title: String,
    /// The normalization key of the affected entry.
    pub path: String,
    pub file_type: FileType,
}

impl FileChange {
    pub fn added(title: &str, path: &str, file_type: FileType) -> Self {
        Self::new(ChangeKind::Added, title, path, file_type)
    }

    pub fn removed(title: &str, path: &str, file_type: FileType) -> Self {
        Self::new(ChangeKind::Removed, title, path, file_type)
    }

    pub fn modified(title: &str, path: &str, file_type: FileType) -> Self {
        Self::new(ChangeKind::Modified, title, path, file_type)
    }

    fn new(kind: ChangeKind, title: &str, path: &str, file_type: FileType) -> Self {
        Self {
            kind,
            title: title.to_string(),
            path: path.to_string(),
            file_type,
        }
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = match self.file_type {
            FileType::Directory => "directory",
            FileType::RegularFile | FileType::Missing => "file",
        };
        let verb = match self.kind {
            ChangeKind::Added => "has been added",
            ChangeKind::Removed => "has been removed",
            ChangeKind::Modified => "has changed",
        };
        write!(f, "{} {} '{}' {}.", self.title, entity, self.path, verb)
    }
}

/// Receives reported changes. Returning `false` aborts the comparison walk
/// early; the caller propagates that `false` as its own return value.
pub trait ChangeVisitor {
    fn visit_change(&mut self, change: FileChange) -> bool;
}

/// Visitor that collects every reported change.
#[derive(Debug, Default)]
pub struct CollectingChangeVisitor {
    changes: Vec<FileChange>,
}

impl CollectingChangeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<FileChange> {
        self.changes
    }
}

impl ChangeVisitor for CollectingChangeVisitor {
    fn visit_change(&mut self, change: FileChange) -> bool {
        self.changes.push(change);
        true
    }
}
