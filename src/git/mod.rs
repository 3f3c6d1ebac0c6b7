//! git
//!
//! Version control for the publisher.
//!
//! # Architecture
//!
//! The pipeline talks to git only through the [`Vcs`] trait, so engine
//! tests can substitute a recording mock. The real implementation,
//! [`GitRepo`], splits the work the same way a careful operator would:
//!
//! - Mutations and network (`pull`, `add`, `commit`, `push`) run the `git`
//!   binary, so hooks, credential helpers, and SSH config behave exactly as
//!   they do for a human. Output goes to `logs/git.log`.
//! - Read-only questions (what is staged, how far ahead of upstream) use
//!   `git2` against the same repository, with structured results instead
//!   of parsed text.

mod interface;

pub use interface::GitRepo;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::CaptureError;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The root is not inside a git work tree.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// The git binary could not be started or its log written.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// A git command exited unsuccessfully.
    #[error("`{command}` failed with exit code {code:?} (see {log})")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        log: PathBuf,
    },

    /// A read-side query through libgit2 failed.
    #[error("git query failed: {message}")]
    Query { message: String },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Query {
            message: err.message().to_string(),
        }
    }
}

/// The version-control operations the pipeline needs.
pub trait Vcs {
    /// Rebase local work onto the remote, stashing uncommitted changes
    /// around the rebase.
    fn pull_rebase(&self) -> Result<(), GitError>;

    /// Stage everything under `path` (additions, modifications, deletions).
    fn stage(&self, path: &Path) -> Result<(), GitError>;

    /// Paths whose staged content differs from `HEAD`. Empty means the
    /// next commit would be empty.
    fn staged_paths(&self) -> Result<Vec<PathBuf>, GitError>;

    /// Commit the index with `message`.
    fn commit(&self, message: &str) -> Result<(), GitError>;

    /// Push the current branch.
    fn push(&self) -> Result<(), GitError>;

    /// Local commits not yet on the push target, or `None` when the branch
    /// has no upstream to compare against.
    fn unpushed_commits(&self) -> Result<Option<usize>, GitError>;
}
