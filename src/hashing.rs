//! Incremental hasher abstraction over BLAKE3.
//!
//! All digest computation goes through the [`Hasher`] trait so that the
//! digest function is an injected capability rather than a global: the
//! Merkle builder, the fingerprinting strategies and the fingerprint itself
//! receive a [`HasherFactory`] and never name BLAKE3 directly. Tests can
//! substitute a fixed, inspectable hasher.

use crate::types::Hash;
use std::sync::Arc;

/// Incremental digest computation.
///
/// `put_string` is length-prefixed so that adjacent strings cannot alias:
/// feeding `"ab"` then `"c"` produces a different digest than `"a"` then
/// `"bc"`.
pub trait Hasher {
    /// Feed raw bytes.
    fn put_bytes(&mut self, bytes: &[u8]);

    /// Feed a string, prefixed with its byte length (8 bytes, big-endian).
    fn put_string(&mut self, value: &str) {
        self.put_bytes(&(value.len() as u64).to_be_bytes());
        self.put_bytes(value.as_bytes());
    }

    /// Feed a previously computed digest.
    fn put_hash(&mut self, hash: &Hash) {
        self.put_bytes(hash);
    }

    /// Produce the digest of everything fed so far.
    fn finish(&mut self) -> Hash;
}

/// Creates fresh hashers on demand.
pub trait HasherFactory: Send + Sync {
    fn hasher(&self) -> Box<dyn Hasher>;
}

/// Production hasher backed by BLAKE3.
pub struct Blake3Hasher {
    inner: blake3::Hasher,
}

impl Blake3Hasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Blake3Hasher {
    fn put_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    fn finish(&mut self) -> Hash {
        *self.inner.finalize().as_bytes()
    }
}

/// Factory producing [`Blake3Hasher`] instances.
pub struct Blake3HasherFactory;

impl HasherFactory for Blake3HasherFactory {
    fn hasher(&self) -> Box<dyn Hasher> {
        Box::new(Blake3Hasher::new())
    }
}

/// The default production hasher factory.
pub fn default_hashers() -> Arc<dyn HasherFactory> {
    Arc::new(Blake3HasherFactory)
}

/// Compute the content digest of a byte slice.
pub fn content_hash(hashers: &dyn HasherFactory, content: &[u8]) -> Hash {
    let mut hasher = hashers.hasher();
    hasher.put_bytes(content);
    hasher.finish()
}

/// Type signature fed before a directory's children when computing its tree
/// digest, so a directory can never collide with a file of the same layout.
pub fn directory_signature(hashers: &dyn HasherFactory) -> Hash {
    signature(hashers, "directory")
}

/// Signature digest standing in for a missing file's content.
pub fn missing_signature(hashers: &dyn HasherFactory) -> Hash {
    signature(hashers, "missing")
}

fn signature(hashers: &dyn HasherFactory, tag: &str) -> Hash {
    let mut hasher = hashers.hasher();
    hasher.put_string(tag);
    hasher.finish()
}
