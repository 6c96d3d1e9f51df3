//! Core type aliases shared across the crate.

/// Length in bytes of every digest produced by the crate's hashers.
pub const HASH_LEN: usize = 32;

/// Fixed-length content digest (BLAKE3 in production).
pub type Hash = [u8; HASH_LEN];
