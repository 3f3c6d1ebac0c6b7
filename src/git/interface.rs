//! git::interface
//!
//! [`GitRepo`], the real [`Vcs`] implementation.
//!
//! # Example
//!
//! ```ignore
//! use intelpub::git::{GitRepo, Vcs};
//!
//! let git = GitRepo::new(&paths.root, git_log);
//! git.stage(Path::new("docs"))?;
//! if !git.staged_paths()?.is_empty() {
//!     git.commit("chore: update AI daily intel 2026-10-19 08:00")?;
//!     git.push()?;
//! }
//! ```

use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Oid, Repository};
use tracing::debug;

use super::{GitError, Vcs};
use crate::core::runlog::CaptureLog;
use crate::core::types::GitName;
use crate::process::Invocation;

/// A git work tree driven through the `git` binary and `git2`.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Directory git commands run in.
    root: PathBuf,
    /// Where command output is captured.
    log: CaptureLog,
    /// Extra variables for every git subprocess.
    env: Vec<(String, String)>,
    remote: Option<GitName>,
    branch: Option<GitName>,
}

impl GitRepo {
    /// A repository rooted at (or above) `root`.
    ///
    /// Nothing is checked here: a root that is not a work tree surfaces as
    /// a failed git command or [`GitError::NotARepo`] from a query.
    pub fn new(root: &Path, log: CaptureLog) -> Self {
        Self {
            root: root.to_path_buf(),
            log,
            env: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            remote: None,
            branch: None,
        }
    }

    /// Add variables to every git subprocess.
    pub fn with_env<'a>(mut self, vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    /// Pull from and push to an explicit remote (and branch) instead of
    /// the branch's configured upstream.
    pub fn with_target(mut self, remote: Option<GitName>, branch: Option<GitName>) -> Self {
        self.remote = remote;
        self.branch = branch;
        self
    }

    fn repo(&self) -> Result<Repository, GitError> {
        // Reopened per query so index changes made by the git binary are seen.
        let repo = Repository::discover(&self.root).map_err(|_| GitError::NotARepo {
            path: self.root.clone(),
        })?;
        if repo.is_bare() {
            return Err(GitError::NotARepo {
                path: self.root.clone(),
            });
        }
        Ok(repo)
    }

    fn git(&self, args: Vec<String>) -> Result<(), GitError> {
        let invocation = Invocation {
            program: "git",
            args: &args,
            cwd: &self.root,
            env: &self.env,
        };
        let status = invocation.run_captured(&self.log)?;
        if status.success() {
            Ok(())
        } else {
            Err(GitError::CommandFailed {
                command: invocation.display(),
                code: status.code(),
                log: self.log.path().to_path_buf(),
            })
        }
    }

    fn pull_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["pull", "--rebase", "--autostash"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(remote) = &self.remote {
            args.push(remote.to_string());
            if let Some(branch) = &self.branch {
                args.push(branch.to_string());
            }
        }
        args
    }

    fn push_args(&self) -> Vec<String> {
        let mut args = vec!["push".to_string()];
        if let Some(remote) = &self.remote {
            args.push(remote.to_string());
            match &self.branch {
                Some(branch) => args.push(format!("HEAD:{branch}")),
                None => args.push("HEAD".to_string()),
            }
        }
        args
    }

    /// Tip of the ref that `push` updates, if known locally.
    fn push_target(&self, repo: &Repository) -> Result<Option<Oid>, GitError> {
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        let Some(local_name) = head.shorthand() else {
            return Ok(None);
        };

        if let Some(remote) = &self.remote {
            let branch = self
                .branch
                .as_ref()
                .map(GitName::as_str)
                .unwrap_or(local_name);
            let refname = format!("refs/remotes/{remote}/{branch}");
            return match repo.refname_to_id(&refname) {
                Ok(oid) => Ok(Some(oid)),
                Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            };
        }

        let local = repo.find_branch(local_name, BranchType::Local)?;
        match local.upstream() {
            Ok(upstream) => Ok(upstream.get().target()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Vcs for GitRepo {
    fn pull_rebase(&self) -> Result<(), GitError> {
        self.git(self.pull_args())
    }

    fn stage(&self, path: &Path) -> Result<(), GitError> {
        self.git(vec![
            "add".to_string(),
            "-A".to_string(),
            "--".to_string(),
            path.to_string_lossy().into_owned(),
        ])
    }

    fn staged_paths(&self) -> Result<Vec<PathBuf>, GitError> {
        let repo = self.repo()?;
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        let index = repo.index()?;
        let diff = repo.diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;

        let paths: Vec<PathBuf> = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(Path::to_path_buf)
            })
            .collect();
        debug!(count = paths.len(), "staged paths");
        Ok(paths)
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        self.git(vec![
            "commit".to_string(),
            "-m".to_string(),
            message.to_string(),
        ])
    }

    fn push(&self) -> Result<(), GitError> {
        self.git(self.push_args())
    }

    fn unpushed_commits(&self) -> Result<Option<usize>, GitError> {
        let repo = self.repo()?;
        let Some(target) = self.push_target(&repo)? else {
            return Ok(None);
        };
        let Some(local) = repo.head()?.target() else {
            return Ok(None);
        };
        let (ahead, _behind) = repo.graph_ahead_behind(local, target)?;
        Ok(Some(ahead))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Zone;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn run_git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .expect("git not available");
        assert!(status.success(), "git {:?} failed", args);
    }

    fn init_repo(dir: &Path) {
        run_git(dir, &["init", "-q", "-b", "main"]);
        run_git(dir, &["config", "user.email", "test@example.com"]);
        run_git(dir, &["config", "user.name", "Test User"]);
        run_git(dir, &["config", "commit.gpgsign", "false"]);
    }

    fn open(dir: &Path) -> GitRepo {
        let log = CaptureLog::new(dir.join("logs/git.log"), Zone::default());
        GitRepo::new(dir, log)
    }

    #[test]
    fn queries_outside_a_repo_fail() {
        let temp = TempDir::new().unwrap();
        let git = open(temp.path());
        assert!(matches!(
            git.staged_paths().unwrap_err(),
            GitError::NotARepo { .. }
        ));
        assert!(matches!(
            git.pull_rebase().unwrap_err(),
            GitError::CommandFailed { .. }
        ));
    }

    #[test]
    fn args_follow_target() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let git = open(temp.path());
        assert_eq!(git.pull_args(), vec!["pull", "--rebase", "--autostash"]);
        assert_eq!(git.push_args(), vec!["push"]);

        let git = git.with_target(
            Some(GitName::new("origin").unwrap()),
            Some(GitName::new("gh-pages").unwrap()),
        );
        assert_eq!(
            git.pull_args(),
            vec!["pull", "--rebase", "--autostash", "origin", "gh-pages"]
        );
        assert_eq!(git.push_args(), vec!["push", "origin", "HEAD:gh-pages"]);

        let git = git.with_target(Some(GitName::new("origin").unwrap()), None);
        assert_eq!(git.push_args(), vec!["push", "origin", "HEAD"]);
    }

    #[test]
    fn staged_paths_on_unborn_branch() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/index.html"), "<html></html>").unwrap();

        let git = open(temp.path());
        assert!(git.staged_paths().unwrap().is_empty());

        git.stage(Path::new("docs")).unwrap();
        assert_eq!(
            git.staged_paths().unwrap(),
            vec![PathBuf::from("docs/index.html")]
        );
    }

    #[test]
    fn identical_content_stages_nothing() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/index.html"), "same").unwrap();

        let git = open(temp.path());
        git.stage(Path::new("docs")).unwrap();
        git.commit("first").unwrap();

        fs::write(temp.path().join("docs/index.html"), "same").unwrap();
        git.stage(Path::new("docs")).unwrap();
        assert!(git.staged_paths().unwrap().is_empty());
    }

    #[test]
    fn stage_picks_up_deletions_only_under_path() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/old.html"), "old").unwrap();
        fs::write(temp.path().join("notes.txt"), "n").unwrap();

        let git = open(temp.path());
        run_git(temp.path(), &["add", "-A"]);
        git.commit("first").unwrap();

        fs::remove_file(temp.path().join("docs/old.html")).unwrap();
        fs::write(temp.path().join("notes.txt"), "changed").unwrap();
        git.stage(Path::new("docs")).unwrap();

        assert_eq!(
            git.staged_paths().unwrap(),
            vec![PathBuf::from("docs/old.html")]
        );
    }

    #[test]
    fn failing_command_reports_log_path() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let git = open(temp.path());

        // Nothing staged on an unborn branch: commit fails.
        let err = git.commit("empty").unwrap_err();
        match err {
            GitError::CommandFailed { command, log, .. } => {
                assert_eq!(command, "git commit -m empty");
                assert!(log.ends_with("logs/git.log"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let log = fs::read_to_string(temp.path().join("logs/git.log")).unwrap();
        assert!(log.contains("==> "));
    }

    #[test]
    fn unpushed_commits_against_upstream() {
        let remote = TempDir::new().unwrap();
        run_git(remote.path(), &["init", "-q", "--bare", "-b", "main"]);

        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let git = open(temp.path());

        // Unborn branch: nothing to compare.
        assert_eq!(git.unpushed_commits().unwrap(), None);

        fs::write(temp.path().join("a.txt"), "a").unwrap();
        run_git(temp.path(), &["add", "a.txt"]);
        git.commit("a").unwrap();

        // No upstream configured yet.
        assert_eq!(git.unpushed_commits().unwrap(), None);

        let url = remote.path().to_string_lossy().into_owned();
        run_git(temp.path(), &["remote", "add", "origin", &url]);
        run_git(temp.path(), &["push", "-q", "-u", "origin", "main"]);
        assert_eq!(git.unpushed_commits().unwrap(), Some(0));

        fs::write(temp.path().join("b.txt"), "b").unwrap();
        run_git(temp.path(), &["add", "b.txt"]);
        git.commit("b").unwrap();
        assert_eq!(git.unpushed_commits().unwrap(), Some(1));

        git.push().unwrap();
        assert_eq!(git.unpushed_commits().unwrap(), Some(0));
    }

    #[test]
    fn unpushed_commits_against_explicit_target() {
        let remote = TempDir::new().unwrap();
        run_git(remote.path(), &["init", "-q", "--bare", "-b", "main"]);

        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        let url = remote.path().to_string_lossy().into_owned();
        run_git(temp.path(), &["remote", "add", "origin", &url]);

        let git = open(temp.path()).with_target(
            Some(GitName::new("origin").unwrap()),
            Some(GitName::new("site").unwrap()),
        );
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        run_git(temp.path(), &["add", "a.txt"]);
        git.commit("a").unwrap();

        // Remote branch does not exist yet.
        assert_eq!(git.unpushed_commits().unwrap(), None);

        git.push().unwrap();
        assert_eq!(git.unpushed_commits().unwrap(), Some(0));
    }
}
