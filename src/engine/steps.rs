//! engine::steps
//!
//! Pipeline steps and how their failures are handled.
//!
//! Every step is declared with a [`Recoverability`]. A single helper,
//! [`StepRunner::attempt`], executes steps and applies that declaration:
//! a recoverable failure is logged and recorded in the run report, a fatal
//! one ends the run. No step suppresses its own errors.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use super::PipelineError;
use crate::generator::GeneratorError;
use crate::git::GitError;

/// What happens when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recoverability {
    /// Logged and recorded; the run continues.
    Recoverable,
    /// The run stops with an error.
    Fatal,
}

/// A unit of pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `git pull --rebase --autostash`.
    SyncRemote,
    /// Run the site generator.
    Generate,
    /// Stage the output directory.
    Stage,
    /// Compare the index with `HEAD`.
    DetectChanges,
    /// Count commits left unpushed by an earlier run.
    CheckPending,
    /// Push commits left by an earlier run.
    PushPending,
    /// Commit staged output.
    Commit,
    /// Push the new commit.
    Push,
}

impl Step {
    pub fn recoverability(&self) -> Recoverability {
        match self {
            Step::SyncRemote | Step::CheckPending => Recoverability::Recoverable,
            Step::Generate
            | Step::Stage
            | Step::DetectChanges
            | Step::PushPending
            | Step::Commit
            | Step::Push => Recoverability::Fatal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::SyncRemote => "sync",
            Step::Generate => "generate",
            Step::Stage => "stage",
            Step::DetectChanges => "detect changes",
            Step::CheckPending => "check pending",
            Step::PushPending => "push pending",
            Step::Commit => "commit",
            Step::Push => "push",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The underlying cause of a step failure.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// A recoverable failure the run continued past.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Recovered {
    pub step: &'static str,
    pub message: String,
}

/// Executes steps and collects recovered failures.
#[derive(Debug, Default)]
pub struct StepRunner {
    recovered: Vec<Recovered>,
}

impl StepRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `step`.
    ///
    /// A recoverable failure is recorded and yields `T::default()`; a
    /// fatal one becomes [`PipelineError::Step`].
    pub fn attempt<T, E>(
        &mut self,
        step: Step,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, PipelineError>
    where
        T: Default,
        E: Into<StepFailure>,
    {
        debug!(%step, "step started");
        match f() {
            Ok(value) => Ok(value),
            Err(err) => {
                let failure = err.into();
                match step.recoverability() {
                    Recoverability::Recoverable => {
                        warn!(%step, error = %failure, "step failed; continuing");
                        self.recovered.push(Recovered {
                            step: step.as_str(),
                            message: failure.to_string(),
                        });
                        Ok(T::default())
                    }
                    Recoverability::Fatal => Err(PipelineError::Step {
                        step,
                        source: failure,
                    }),
                }
            }
        }
    }

    pub fn into_recovered(self) -> Vec<Recovered> {
        self.recovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_error() -> GitError {
        GitError::Query {
            message: "offline".into(),
        }
    }

    #[test]
    fn only_sync_and_pending_check_are_recoverable() {
        let recoverable: Vec<Step> = [
            Step::SyncRemote,
            Step::Generate,
            Step::Stage,
            Step::DetectChanges,
            Step::CheckPending,
            Step::PushPending,
            Step::Commit,
            Step::Push,
        ]
        .into_iter()
        .filter(|s| s.recoverability() == Recoverability::Recoverable)
        .collect();
        assert_eq!(recoverable, vec![Step::SyncRemote, Step::CheckPending]);
    }

    #[test]
    fn recoverable_failure_yields_default_and_is_recorded() {
        let mut runner = StepRunner::new();
        let value: Option<usize> = runner
            .attempt(Step::CheckPending, || Err(query_error()))
            .unwrap();
        assert_eq!(value, None);

        let recovered = runner.into_recovered();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].step, "check pending");
        assert!(recovered[0].message.contains("offline"));
    }

    #[test]
    fn fatal_failure_stops() {
        let mut runner = StepRunner::new();
        let err = runner
            .attempt(Step::Push, || Err::<(), _>(query_error()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Step { step: Step::Push, .. }));
        assert!(runner.into_recovered().is_empty());
    }

    #[test]
    fn success_passes_value_through() {
        let mut runner = StepRunner::new();
        let value = runner
            .attempt(Step::DetectChanges, || Ok::<_, GitError>(vec![1, 2]))
            .unwrap();
        assert_eq!(value, vec![1, 2]);
    }
}
