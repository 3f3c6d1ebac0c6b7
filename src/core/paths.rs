//! core::paths
//!
//! Centralized path routing for everything the pipeline touches.
//!
//! # Layout
//!
//! All paths are relative to the pipeline root (the site repository):
//! - `intelpub.toml` - Optional settings file
//! - `.run.lock` - Exclusive lock file
//! - `logs/cron.log` - Run outcome log
//! - `logs/git.log` - Captured git output
//! - `logs/generate.log` - Captured generator output
//! - `docs/` - Generator output root (configurable)
//!
//! **Hard rule:** No code outside this module joins these names onto the
//! root by hand. Everything goes through `PipelinePaths`.
//!
//! # Example
//!
//! ```
//! use intelpub::core::paths::PipelinePaths;
//! use std::path::PathBuf;
//!
//! let paths = PipelinePaths::new(PathBuf::from("/srv/site"));
//!
//! assert_eq!(paths.lock_path(), PathBuf::from("/srv/site/.run.lock"));
//! assert_eq!(paths.run_log_path(), PathBuf::from("/srv/site/logs/cron.log"));
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the optional settings file at the pipeline root.
pub const SETTINGS_FILE_NAME: &str = "intelpub.toml";

/// Name of the lock file at the pipeline root.
pub const LOCK_FILE_NAME: &str = ".run.lock";

/// Default generator output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "docs";

/// Path routing for one pipeline root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    /// The pipeline root. Every other path hangs off this one.
    pub root: PathBuf,

    /// Output directory, relative to `root`.
    output_dir: PathBuf,
}

impl PipelinePaths {
    /// Create paths for `root` with the default `docs/` output directory.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Override the output directory (relative to the root).
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// `<root>/intelpub.toml`
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    /// `<root>/.run.lock`
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// `<root>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// `<root>/logs/cron.log`
    pub fn run_log_path(&self) -> PathBuf {
        self.logs_dir().join("cron.log")
    }

    /// `<root>/logs/git.log`
    pub fn git_log_path(&self) -> PathBuf {
        self.logs_dir().join("git.log")
    }

    /// `<root>/logs/generate.log`
    pub fn generate_log_path(&self) -> PathBuf {
        self.logs_dir().join("generate.log")
    }

    /// Output directory relative to the root, as handed to `git add`.
    pub fn output_dir_relative(&self) -> &Path {
        &self.output_dir
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Create `logs/` if it does not exist yet.
    ///
    /// An existing directory is not an error.
    pub fn ensure_logs_dir(&self) -> io::Result<()> {
        fs::create_dir_all(self.logs_dir())
    }
}

/// Locate the pipeline root from a starting directory.
///
/// Walks `start` and its ancestors and returns the first one that holds a
/// settings file or a `.git` entry. Falls back to `start` itself, so a
/// binary dropped next to the site checkout still finds its root.
pub fn discover_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(SETTINGS_FILE_NAME).is_file() || dir.join(".git").exists())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start.to_path_buf())
}
