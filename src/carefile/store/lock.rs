//! Process-wide write locks, one per Collection File.
//!
//! Two [`RecordStore`](super::RecordStore)s opened on the same path share the
//! same mutex, so a rewrite cannot silently drop an append made through another
//! handle in this process. Other processes are not coordinated.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Shared write lock for one canonical file path.
#[derive(Debug, Clone)]
pub struct PathLock {
    inner: Arc<Mutex<()>>,
}

impl PathLock {
    /// Returns the lock registered for `path`, creating it on first use.
    ///
    /// `path` should already be canonical so aliases resolve to one lock.
    pub fn for_path(path: &Path) -> Self {
        let mut registry = PATH_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
        let inner = registry
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { inner }
    }

    /// Blocks until this process holds the file for writing.
    ///
    /// A writer that panicked mid-rewrite leaves the mutex poisoned; the file
    /// itself is still whole thanks to the rename-based rewrite, so the poison
    /// is ignored.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn same_as(&self, other: &PathLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
