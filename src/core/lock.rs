//! core::lock
//!
//! Exclusive run lock for the publisher pipeline.
//!
//! # Architecture
//!
//! Overlapping triggers (an hourly scheduler plus manual runs) must never
//! execute the pipeline body twice at once. The first invocation takes an
//! OS-level advisory lock on `<root>/.run.lock`; every other invocation
//! sees the lock held and backs off immediately.
//!
//! # Invariants
//!
//! - Acquisition is non-blocking (fails fast if locked)
//! - The lock is held for the entire pipeline body
//! - The lock is released on drop (RAII), and by the OS when the process
//!   exits on any path, including a crash or a kill
//! - The lock file's content is irrelevant and never read
//!
//! # Example
//!
//! ```no_run
//! use intelpub::core::lock::RunLock;
//! use std::path::Path;
//!
//! match RunLock::try_acquire(Path::new("/srv/site/.run.lock"))? {
//!     Some(_lock) => { /* run the pipeline */ }
//!     None => { /* another run is in progress */ }
//! }
//! # Ok::<(), intelpub::core::lock::LockError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("another run holds the lock")]
    AlreadyLocked,

    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the pipeline root.
///
/// Released when dropped, so every exit path out of the pipeline body
/// gives the lock back.
#[derive(Debug)]
pub struct RunLock {
    /// Path to the lock file.
    path: PathBuf,
    /// Open handle carrying the OS lock. `Some` while held.
    file: Option<File>,
}

impl RunLock {
    /// Acquire the lock at `path`, failing fast if it is held.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process (or another handle
    ///   in this process) holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be opened
    /// - [`LockError::AcquireFailed`] for any other OS locking error
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Self {
                path: path.to_path_buf(),
                file: Some(file),
            }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::AlreadyLocked)
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Try to acquire the lock, returning `None` if it is already held.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, LockError> {
        match Self::acquire(path) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check whether some run currently holds the lock at `path`.
    ///
    /// Probes with a shared lock, released at once, so concurrent probes
    /// never see each other. A run starting inside that brief window still
    /// finds the lock contended and records a skip. A missing lock file
    /// means nobody is running and is left missing.
    pub fn is_locked(path: &Path) -> Result<bool, LockError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(LockError::CreateFailed(format!(
                    "cannot open {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        match FileExt::try_lock_shared(&file) {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                Ok(false)
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(true),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Returns `true` while this guard holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}
