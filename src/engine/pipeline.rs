//! engine::pipeline
//!
//! One publish run: lock, check credentials, sync, generate, detect
//! changes, and publish.
//!
//! [`admit`] takes the run lock using nothing but the root's paths, so a
//! caller can hold the lock before reading settings or credentials.
//! [`Pipeline::run`] does both halves for callers that already have
//! everything loaded.

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use super::steps::{Recovered, Step, StepRunner};
use super::PipelineError;
use crate::core::config::Settings;
use crate::core::environment::RunEnvironment;
use crate::core::lock::RunLock;
use crate::core::paths::PipelinePaths;
use crate::core::runlog::{RunEvent, RunLog};
use crate::core::types::{EnvKey, Timestamp, Zone};
use crate::generator::Generator;
use crate::git::Vcs;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run held the lock.
    SkippedLocked,
    /// Output matched `HEAD`; nothing committed.
    NoChanges,
    /// Output matched `HEAD`, and commits from an earlier run were pushed.
    PushedPending { commits: usize },
    /// A new commit was created and pushed.
    Published { message: String, files: Vec<PathBuf> },
}

impl RunOutcome {
    /// Run-log event for this outcome.
    pub fn event(&self) -> RunEvent {
        match self {
            RunOutcome::SkippedLocked => RunEvent::SkippedLocked,
            RunOutcome::NoChanges => RunEvent::NoChanges,
            RunOutcome::PushedPending { .. } => RunEvent::PushedPending,
            RunOutcome::Published { .. } => RunEvent::Pushed,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::SkippedLocked => write!(f, "another run is in progress; skipped"),
            RunOutcome::NoChanges => write!(f, "no changes"),
            RunOutcome::PushedPending { commits } => {
                write!(f, "pushed {commits} pending commit(s)")
            }
            RunOutcome::Published { message, files } => {
                write!(f, "pushed \"{message}\" ({} file(s))", files.len())
            }
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Recoverable step failures the run continued past.
    pub recovered: Vec<Recovered>,
}

impl RunReport {
    /// Report for a run that found the lock held.
    pub fn skipped() -> Self {
        Self {
            outcome: RunOutcome::SkippedLocked,
            recovered: Vec::new(),
        }
    }
}

/// Take the run lock for `paths`.
///
/// Returns `None` after appending `locked; skip` to the run log when
/// another run holds the lock. Only the logs directory and the lock file
/// are touched.
pub fn admit(paths: &PipelinePaths, zone: Zone) -> Result<Option<RunLock>, PipelineError> {
    paths
        .ensure_logs_dir()
        .map_err(|source| PipelineError::LogsDir {
            path: paths.logs_dir(),
            source,
        })?;

    let lock = RunLock::try_acquire(&paths.lock_path())?;
    if lock.is_none() {
        info!(lock = %paths.lock_path().display(), "lock held by another run");
        RunLog::new(paths.run_log_path(), zone).record(RunEvent::SkippedLocked)?;
    }
    Ok(lock)
}

/// A configured pipeline, ready to run.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    env: &'a RunEnvironment,
    vcs: &'a dyn Vcs,
    generator: &'a dyn Generator,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        env: &'a RunEnvironment,
        vcs: &'a dyn Vcs,
        generator: &'a dyn Generator,
    ) -> Self {
        Self {
            settings,
            env,
            vcs,
            generator,
        }
    }

    /// Execute one run, taking the lock first.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_locked`].
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        match admit(&self.settings.paths, self.settings.timezone)? {
            Some(lock) => self.run_locked(&lock),
            None => Ok(RunReport::skipped()),
        }
    }

    /// Execute one run under a lock already taken with [`admit`].
    ///
    /// # Errors
    ///
    /// - [`PipelineError::MissingCredential`] before any git or generator
    ///   call
    /// - [`PipelineError::Step`] when a fatal step fails
    /// - run log I/O errors
    pub fn run_locked(&self, _lock: &RunLock) -> Result<RunReport, PipelineError> {
        self.check_credentials()?;

        let mut steps = StepRunner::new();
        let outcome = self.publish(&mut steps)?;

        RunLog::new(self.settings.paths.run_log_path(), self.settings.timezone)
            .record(outcome.event())?;
        info!(%outcome, "run finished");
        Ok(RunReport {
            outcome,
            recovered: steps.into_recovered(),
        })
    }

    fn check_credentials(&self) -> Result<(), PipelineError> {
        let missing = self
            .env
            .missing(self.settings.required_env.iter().map(EnvKey::as_str));
        if missing.is_empty() {
            return Ok(());
        }
        Err(PipelineError::MissingCredential {
            keys: missing.into_iter().map(str::to_string).collect(),
            env_file: self.settings.env_file.clone(),
        })
    }

    fn publish(&self, steps: &mut StepRunner) -> Result<RunOutcome, PipelineError> {
        let vcs = self.vcs;

        steps.attempt(Step::SyncRemote, || vcs.pull_rebase())?;
        steps.attempt(Step::Generate, || self.generator.generate())?;
        steps.attempt(Step::Stage, || vcs.stage(self.settings.output_dir()))?;
        let files = steps.attempt(Step::DetectChanges, || vcs.staged_paths())?;

        if files.is_empty() {
            return self.push_pending(steps);
        }

        let now = Timestamp::now(self.settings.timezone);
        let message = format!("{} {}", self.settings.git.commit_prefix, now.label());
        steps.attempt(Step::Commit, || vcs.commit(&message))?;
        steps.attempt(Step::Push, || vcs.push())?;

        Ok(RunOutcome::Published { message, files })
    }

    fn push_pending(&self, steps: &mut StepRunner) -> Result<RunOutcome, PipelineError> {
        if !self.settings.git.push_pending {
            return Ok(RunOutcome::NoChanges);
        }
        let vcs = self.vcs;
        match steps.attempt(Step::CheckPending, || vcs.unpushed_commits())? {
            Some(commits) if commits > 0 => {
                steps.attempt(Step::PushPending, || vcs.push())?;
                Ok(RunOutcome::PushedPending { commits })
            }
            _ => Ok(RunOutcome::NoChanges),
        }
    }
}
