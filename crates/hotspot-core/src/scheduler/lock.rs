use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use fs2::FileExt;
use tracing::warn;

use crate::error::{HotspotError, Result};

/// Advisory lock guarding track store mutation across processes.
///
/// Cheap to clone; clones share the same file handle and in-process mutex,
/// so threads of one process serialise too.
#[derive(Clone, Debug)]
pub struct StoreLock {
    path: PathBuf,
    inner: Arc<Mutex<File>>,
}

/// Held lock; released on drop.
pub struct StoreLockGuard<'a> {
    file: MutexGuard<'a, File>,
}

impl StoreLock {
    /// Open (creating if needed) the lock file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HotspotError::Lock(format!("{}: {e}", parent.display())))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| HotspotError::Lock(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is held by this thread.
    pub fn acquire(&self) -> Result<StoreLockGuard<'_>> {
        let file = self
            .inner
            .lock()
            .map_err(|_| HotspotError::Lock("lock mutex poisoned".into()))?;
        FileExt::lock_exclusive(&*file)
            .map_err(|e| HotspotError::Lock(format!("{}: {e}", self.path.display())))?;
        Ok(StoreLockGuard { file })
    }
}

impl Drop for StoreLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&*self.file) {
            warn!(error = %e, "Failed to release store lock");
        }
    }
}
