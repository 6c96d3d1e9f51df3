//! On-disk fingerprint store
//!
//! Persists serialized fingerprints keyed by an opaque cache key (typically
//! a build-step identity). Entries live at paths derived from the key's
//! digest: `{root}/fingerprints/{hex[0..2]}/{hex[2..4]}/{digest}.fingerprint`,
//! distributing files across subdirectories to avoid directory bloat.
//!
//! Every entry carries a magic/format-version envelope. A reader that finds
//! a different version fails fast with a recognizable decode error; the
//! caller treats any decode failure as a cache miss and recomputes.

use crate::encoding::{Decoder, Encoder};
use crate::error::{DecodeError, StoreError};
use crate::fingerprint::{FileCollectionFingerprint, FingerprintSerializer};
use crate::hashing::HasherFactory;
use crate::interner::StringInterner;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const MAGIC: &[u8; 4] = b"IFPT";
const FORMAT_VERSION: u64 = 1;

/// File-based store for serialized fingerprints.
pub struct FingerprintStore {
    root: PathBuf,
    serializer: FingerprintSerializer,
    hashers: Arc<dyn HasherFactory>,
}

impl FingerprintStore {
    /// Open (and if needed create) a store rooted at `root`.
    pub fn new<P: AsRef<Path>>(
        root: P,
        interner: Arc<StringInterner>,
        hashers: Arc<dyn HasherFactory>,
    ) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("fingerprints"))?;
        Ok(Self {
            root,
            serializer: FingerprintSerializer::new(interner, Arc::clone(&hashers)),
            hashers,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a fingerprint under `key`, replacing any previous entry.
    ///
    /// Writes to a temporary file and renames into place, so readers never
    /// observe a partially written entry.
    #[instrument(skip(self, fingerprint))]
    pub fn store(&self, key: &str, fingerprint: &FileCollectionFingerprint) -> Result<(), StoreError> {
        let entry_path = self.entry_path(key);
        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = entry_path.with_extension("fingerprint.tmp");

        let file = fs::File::create(&temp_path)?;
        let mut encoder = Encoder::new(BufWriter::new(file));
        encoder.write_bytes(MAGIC)?;
        encoder.write_small_int(FORMAT_VERSION)?;
        self.serializer.write(&mut encoder, fingerprint)?;
        encoder.flush()?;

        fs::rename(&temp_path, &entry_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            e
        })?;
        debug!(path = %entry_path.display(), "Stored fingerprint");
        Ok(())
    }

    /// Load the fingerprint stored under `key`.
    ///
    /// Returns `None` when no entry exists. A present but unreadable entry
    /// is a [`StoreError::Decode`]; deciding whether to discard it and
    /// recompute is the caller's policy.
    #[instrument(skip(self))]
    pub fn load(&self, key: &str) -> Result<Option<Arc<FileCollectionFingerprint>>, StoreError> {
        let entry_path = self.entry_path(key);
        let file = match fs::File::open(&entry_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut decoder = Decoder::new(std::io::BufReader::new(file));
        if decoder.read_bytes()? != MAGIC {
            warn!(path = %entry_path.display(), "Store entry has bad magic");
            return Err(DecodeError::BadMagic.into());
        }
        let version = decoder.read_small_int()?;
        if version != FORMAT_VERSION {
            warn!(
                path = %entry_path.display(),
                version, "Store entry has unsupported format version"
            );
            return Err(DecodeError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            }
            .into());
        }
        let fingerprint = self.serializer.read(&mut decoder)?;
        debug!(path = %entry_path.display(), "Loaded fingerprint");
        Ok(Some(fingerprint))
    }

    /// Remove the entry stored under `key`, if any.
    pub fn invalidate(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = self.hashers.hasher();
        hasher.put_string(key);
        let hex = hex::encode(hasher.finish());
        self.root
            .join("fingerprints")
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(format!("{}.fingerprint", hex))
    }
}
