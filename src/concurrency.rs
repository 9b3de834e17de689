//! Store-wide mutual exclusion
//!
//! Every handle opened on the same physical store shares one lock. Locks live in a
//! process-wide registry keyed by a hash of the store path and are reference
//! counted: the first handle creates the entry, each further handle bumps the count,
//! and the entry is dropped when the last handle releases it.

use parking_lot::{const_mutex, Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

struct Entry {
    lock: Arc<ReentrantMutex<()>>,
    refs: usize,
}

/// Registry: store key -> (lock, reference count)
static REGISTRY: Mutex<BTreeMap<String, Entry>> = const_mutex(BTreeMap::new());

/// One spelling per physical store file: absolute, with the containing directory
/// canonicalized. The file itself need not exist yet. Falls back to the absolute
/// path when the directory cannot be resolved.
pub fn canonical_store_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = absolute.parent().and_then(|dir| dunce::canonicalize(dir).ok());
    if let (Some(dir), Some(name)) = (dir, absolute.file_name()) {
        return dir.join(name);
    }
    absolute
}

/// Stable key for a store path. Different spellings of one file share a key.
pub fn store_key(path: &Path) -> String {
    let canonical = canonical_store_path(path);
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    hex::encode(hash.as_bytes())
}

/// One handle's reference to a store's shared lock
///
/// Dropping (or calling [`Locker::release`]) gives the reference back to the
/// registry.
pub struct Locker {
    key: String,
    lock: Arc<ReentrantMutex<()>>,
    released: AtomicBool,
}

impl Locker {
    /// Get or create the lock for the store at `path`.
    pub fn acquire_for(path: &Path) -> Self {
        let key = store_key(path);
        let mut registry = REGISTRY.lock();
        let entry = registry.entry(key.clone()).or_insert_with(|| Entry {
            lock: Arc::new(ReentrantMutex::new(())),
            refs: 0,
        });
        entry.refs += 1;
        trace!(key = %key, refs = entry.refs, "store lock referenced");
        Self {
            key,
            lock: Arc::clone(&entry.lock),
            released: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Block until the store is free. Re-entrant on the owning thread.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Give this handle's reference back to the registry. Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut registry = REGISTRY.lock();
        if let Some(entry) = registry.get_mut(&self.key) {
            entry.refs -= 1;
            trace!(key = %self.key, refs = entry.refs, "store lock released");
            if entry.refs == 0 {
                registry.remove(&self.key);
            }
        }
    }
}

impl Drop for Locker {
    fn drop(&mut self) {
        self.release();
    }
}

/// Number of live references to the lock for `path` (0 if none).
pub fn reference_count(path: &Path) -> usize {
    REGISTRY
        .lock()
        .get(&store_key(path))
        .map(|e| e.refs)
        .unwrap_or(0)
}
