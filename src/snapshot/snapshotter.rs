//! Filesystem snapshotter
//!
//! Walks a root path and produces a fully hashed [`PhysicalSnapshot`] tree
//! by driving the Merkle builder with enter/visit/leave events. The walk is
//! sorted by file name so the produced tree (and therefore every digest) is
//! identical across filesystems and platforms regardless of native
//! enumeration order.

use crate::error::SnapshotError;
use crate::hashing::{content_hash, HasherFactory};
use crate::snapshot::merkle::MerkleDirectorySnapshotBuilder;
use crate::snapshot::path::{canonicalize_path, normalize_path_string};
use crate::snapshot::{FileSnapshot, MissingSnapshot, PhysicalSnapshot};
use std::cell::Cell;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

/// Component-name ignore patterns applied while walking.
///
/// An entry whose file name equals one of the patterns is excluded together
/// with everything below it. An empty filter excludes nothing.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    ignore_patterns: Vec<String>,
}

impl PathFilter {
    pub fn new(ignore_patterns: Vec<String>) -> Self {
        Self { ignore_patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.ignore_patterns.is_empty()
    }

    fn excludes(&self, name: &OsStr) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| name == OsStr::new(pattern))
    }
}

/// Depth-first walk events fed to the Merkle builder.
enum WalkEvent {
    EnterDirectory { absolute_path: String, name: String },
    Leaf(PhysicalSnapshot),
    LeaveDirectory,
}

/// Produces [`PhysicalSnapshot`] trees from on-disk paths.
pub struct FileSystemSnapshotter {
    hashers: Arc<dyn HasherFactory>,
}

impl FileSystemSnapshotter {
    pub fn new(hashers: Arc<dyn HasherFactory>) -> Self {
        Self { hashers }
    }

    /// Snapshot a root path without filtering.
    pub fn snapshot(&self, root: &Path) -> Result<PhysicalSnapshot, SnapshotError> {
        self.snapshot_filtered(root, &PathFilter::default())
    }

    /// Snapshot a root path, excluding entries matched by `filter`.
    ///
    /// If the filter actually excluded anything, every directory in the
    /// result is [`PhysicalSnapshot::Filtered`]: a tree digest over a
    /// partial listing would be indistinguishable from a digest over the
    /// real contents, so the uncertainty is made explicit instead.
    #[instrument(skip(self, filter), fields(root = %root.display()))]
    pub fn snapshot_filtered(
        &self,
        root: &Path,
        filter: &PathFilter,
    ) -> Result<PhysicalSnapshot, SnapshotError> {
        if !root.exists() {
            let absolute_path = self.absolute_path_of(root)?;
            trace!("Path does not exist, producing missing snapshot");
            return Ok(PhysicalSnapshot::Missing(MissingSnapshot {
                name: path_name(root, &absolute_path),
                absolute_path,
            }));
        }

        let canonical = canonicalize_path(root)?;
        let metadata = fs::metadata(&canonical)?;

        if metadata.is_file() {
            let content = fs::read(&canonical)?;
            let absolute_path = canonical.to_string_lossy().to_string();
            trace!(bytes = content.len(), "Hashed file root");
            return Ok(PhysicalSnapshot::File(FileSnapshot {
                name: path_name(&canonical, &absolute_path),
                absolute_path,
                content_hash: content_hash(self.hashers.as_ref(), &content),
            }));
        }

        let (events, any_excluded) = self.collect_events(&canonical, filter)?;
        debug!(
            event_count = events.len(),
            filtered = any_excluded,
            "Walked directory tree"
        );

        let mut builder = if any_excluded {
            MerkleDirectorySnapshotBuilder::filtered(Arc::clone(&self.hashers))
        } else {
            MerkleDirectorySnapshotBuilder::new(Arc::clone(&self.hashers))
        };
        for event in events {
            match event {
                WalkEvent::EnterDirectory {
                    absolute_path,
                    name,
                } => {
                    builder.enter_directory(&absolute_path, &name);
                }
                WalkEvent::Leaf(snapshot) => builder.visit_entry(snapshot),
                WalkEvent::LeaveDirectory => builder.leave_directory(),
            }
        }
        builder.into_result().ok_or_else(|| {
            SnapshotError::InvalidPath(format!("Walk of {:?} produced no entries", root))
        })
    }

    /// Walk the tree in sorted order, emitting enter/leaf/leave events and
    /// reporting whether the filter excluded anything.
    fn collect_events(
        &self,
        root: &Path,
        filter: &PathFilter,
    ) -> Result<(Vec<WalkEvent>, bool), SnapshotError> {
        let mut events = Vec::new();
        let mut open_directories = 0usize;
        let any_excluded = Cell::new(false);

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        let entries = walker.into_iter().filter_entry(|entry| {
            if entry.depth() > 0 && filter.excludes(entry.file_name()) {
                any_excluded.set(true);
                false
            } else {
                true
            }
        });

        for entry in entries {
            let entry = entry.map_err(std::io::Error::from)?;
            let depth = entry.depth();
            while open_directories > depth {
                events.push(WalkEvent::LeaveDirectory);
                open_directories -= 1;
            }

            let absolute_path = normalize_path_string(&entry.path().to_string_lossy());
            let name = path_name(entry.path(), &absolute_path);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                events.push(WalkEvent::EnterDirectory {
                    absolute_path,
                    name,
                });
                open_directories = depth + 1;
            } else if file_type.is_file() {
                let content = fs::read(entry.path())?;
                events.push(WalkEvent::Leaf(PhysicalSnapshot::File(FileSnapshot {
                    name,
                    absolute_path,
                    content_hash: content_hash(self.hashers.as_ref(), &content),
                })));
            }
            // Symlinks and special files are not part of the snapshot.
        }

        while open_directories > 0 {
            events.push(WalkEvent::LeaveDirectory);
            open_directories -= 1;
        }

        Ok((events, any_excluded.get()))
    }

    /// Absolute, normalized path for a root that may not exist on disk.
    fn absolute_path_of(&self, path: &Path) -> Result<String, SnapshotError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(normalize_path_string(&absolute.to_string_lossy()))
    }
}

/// Last path segment, falling back to the full path for roots like `/`.
fn path_name(path: &Path, absolute_path: &str) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| absolute_path.to_string())
}
