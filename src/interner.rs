//! Deduplicating string interner.
//!
//! Fingerprint keys and root paths repeat heavily across fingerprints of the
//! same build (the same absolute paths appear in every input set). Interning
//! collapses them to shared `Arc<str>` allocations. The deserializer interns
//! every path it reads so that a reloaded cache shares storage with freshly
//! computed fingerprints.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Thread-safe `Arc<str>` interner.
pub struct StringInterner {
    strings: Mutex<HashSet<Arc<str>>>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            strings: Mutex::new(HashSet::new()),
        }
    }

    /// Return the shared allocation for `value`, creating it on first use.
    pub fn intern(&self, value: &str) -> Arc<str> {
        let mut strings = self.strings.lock();
        if let Some(existing) = strings.get(value) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(value);
        strings.insert(Arc::clone(&interned));
        interned
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.strings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.lock().is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
