//! Imprint: Incremental Build Change Detection
//!
//! Decides, for the input/output file trees attached to a build step,
//! whether anything relevant changed since the step last ran. File trees
//! are snapshotted into Merkle-hashed physical snapshots, normalized into
//! comparable fingerprints, and persisted to an on-disk store so later
//! builds can compare against them without re-reading every byte.

pub mod encoding;
pub mod error;
pub mod fingerprint;
pub mod hashing;
pub mod interner;
pub mod snapshot;
pub mod store;
pub mod types;
