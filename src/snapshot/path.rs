//! Path canonicalization and normalization for stable fingerprint keys.

use crate::error::SnapshotError;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a path into the form used for absolute-path keys.
///
/// Resolves symlinks, `..` and `.` via `dunce` (avoiding Windows UNC
/// prefixes), normalizes Unicode to NFC and strips trailing slashes, so the
/// same on-disk location always yields the same key bytes.
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, SnapshotError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        SnapshotError::InvalidPath(format!("Failed to canonicalize {:?}: {}", path, e))
    })?;
    Ok(PathBuf::from(normalize_path_string(
        &canonical.to_string_lossy(),
    )))
}

/// Normalize an already-canonical path string without filesystem access:
/// Unicode NFC plus trailing-slash stripping (the root keeps its slash).
pub fn normalize_path_string(path: &str) -> String {
    let mut normalized: String = path.nfc().collect();
    while normalized.len() > 1 && (normalized.ends_with('/') || normalized.ends_with('\\')) {
        normalized.pop();
    }
    normalized
}
