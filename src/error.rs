//! Error types for the change-detection core.

use thiserror::Error;

/// Errors raised while snapshotting a file tree from disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Snapshot I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Recoverable failures while decoding a persisted fingerprint.
///
/// The surrounding cache layer treats any of these as a cache miss and
/// recomputes the fingerprint from scratch.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unexpected end of input: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid boolean byte: {0:#04x}")]
    InvalidBoolean(u8),

    #[error("Malformed variable-length integer")]
    MalformedVarInt,

    #[error("Invalid UTF-8 in string: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("Unknown compare strategy ordinal: {0}")]
    UnknownCompareStrategy(u64),

    #[error("Unknown file type ordinal: {0}")]
    UnknownFileType(u64),

    #[error("Duplicate fingerprint key: {0}")]
    DuplicateKey(String),

    #[error("Not a fingerprint store entry (bad magic)")]
    BadMagic,

    #[error("Unsupported fingerprint format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u64 },
}

/// Errors raised by fingerprint operations.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("Roots are not retained by this fingerprint")]
    RootsUnavailable,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors raised by the on-disk fingerprint store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to decode stored fingerprint: {0}")]
    Decode(#[from] DecodeError),
}
