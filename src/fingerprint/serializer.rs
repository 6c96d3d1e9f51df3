//! Binary serializer for file collection fingerprints.
//!
//! The layout is part of the cache contract and must stay stable across
//! tool versions:
//!
//! 1. compare-strategy ordinal (small int)
//! 2. whether an overall digest follows (bool)
//! 3. the digest bytes, if so
//! 4. entry count, then per entry: key, file-type ordinal, digest
//! 5. root-hash entry count (0 encodes "no root hashes / unknown")
//! 6. per root-hash entry: absolute path, digest
//!
//! Deserialized fingerprints do not retain roots: that capability is lost
//! on persistence.

use crate::encoding::{Decoder, Encoder};
use crate::error::DecodeError;
use crate::fingerprint::collection::FileCollectionFingerprint;
use crate::fingerprint::compare::FingerprintCompareStrategy;
use crate::fingerprint::{FileType, NormalizedSnapshot, NormalizedSnapshotMap};
use crate::hashing::HasherFactory;
use crate::interner::StringInterner;
use crate::types::Hash;
use std::io::{Read, Write};
use std::sync::Arc;

/// Reads and writes fingerprints in the stable binary layout.
///
/// Every string read back is interned, so a reloaded cache shares key
/// storage with freshly computed fingerprints.
pub struct FingerprintSerializer {
    interner: Arc<StringInterner>,
    hashers: Arc<dyn HasherFactory>,
}

impl FingerprintSerializer {
    pub fn new(interner: Arc<StringInterner>, hashers: Arc<dyn HasherFactory>) -> Self {
        Self { interner, hashers }
    }

    pub fn write<W: Write>(
        &self,
        encoder: &mut Encoder<W>,
        fingerprint: &FileCollectionFingerprint,
    ) -> std::io::Result<()> {
        encoder.write_small_int(fingerprint.compare_strategy().ordinal())?;

        // The digest is persisted only if it was already computed; a
        // deserialized fingerprint recomputes it on demand otherwise.
        match fingerprint.cached_hash() {
            Some(hash) => {
                encoder.write_bool(true)?;
                encoder.write_hash(&hash)?;
            }
            None => encoder.write_bool(false)?,
        }

        let snapshots = fingerprint.snapshots();
        encoder.write_small_int(snapshots.len() as u64)?;
        for (key, snapshot) in snapshots.iter() {
            encoder.write_string(key)?;
            encoder.write_small_int(snapshot.file_type.ordinal())?;
            encoder.write_hash(&snapshot.hash)?;
        }

        match fingerprint.root_hashes() {
            None => encoder.write_small_int(0)?,
            Some(root_hashes) => {
                encoder.write_small_int(root_hashes.len() as u64)?;
                for (path, hash) in root_hashes {
                    encoder.write_string(path)?;
                    encoder.write_hash(hash)?;
                }
            }
        }
        Ok(())
    }

    pub fn read<R: Read>(
        &self,
        decoder: &mut Decoder<R>,
    ) -> Result<Arc<FileCollectionFingerprint>, DecodeError> {
        let ordinal = decoder.read_small_int()?;
        let compare_strategy = FingerprintCompareStrategy::from_ordinal(ordinal)
            .ok_or(DecodeError::UnknownCompareStrategy(ordinal))?;

        let hash = if decoder.read_bool()? {
            Some(decoder.read_hash()?)
        } else {
            None
        };

        let snapshots = self.read_snapshots(decoder)?;
        let root_hashes = self.read_root_hashes(decoder)?;

        Ok(FileCollectionFingerprint::from_persisted(
            snapshots,
            compare_strategy,
            hash,
            root_hashes,
            Arc::clone(&self.hashers),
        ))
    }

    fn read_snapshots<R: Read>(
        &self,
        decoder: &mut Decoder<R>,
    ) -> Result<NormalizedSnapshotMap, DecodeError> {
        let count = decoder.read_small_int()?;
        let mut snapshots = NormalizedSnapshotMap::new();
        for _ in 0..count {
            let key = decoder.read_string()?;
            let type_ordinal = decoder.read_small_int()?;
            let file_type = FileType::from_ordinal(type_ordinal)
                .ok_or(DecodeError::UnknownFileType(type_ordinal))?;
            let hash = decoder.read_hash()?;
            if !snapshots.insert_if_absent(
                self.interner.intern(&key),
                NormalizedSnapshot { file_type, hash },
            ) {
                return Err(DecodeError::DuplicateKey(key));
            }
        }
        Ok(snapshots)
    }

    fn read_root_hashes<R: Read>(
        &self,
        decoder: &mut Decoder<R>,
    ) -> Result<Option<Vec<(Arc<str>, Hash)>>, DecodeError> {
        let count = decoder.read_small_int()?;
        if count == 0 {
            return Ok(None);
        }
        let mut root_hashes = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let path = self.interner.intern(&decoder.read_string()?);
            let hash = decoder.read_hash()?;
            root_hashes.push((path, hash));
        }
        Ok(Some(root_hashes))
    }
}
