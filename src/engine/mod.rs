//! engine
//!
//! The publish pipeline.
//!
//! # Lifecycle
//!
//! ```text
//! Lock -> Load settings -> Check credentials -> Sync -> Generate -> Stage -> Detect
//!                                                            |
//!                               no changes: [Push pending] <-+-> Commit -> Push
//! ```
//!
//! # Invariants
//!
//! - Nothing runs unless the run lock is held; a held lock is a skip, not
//!   an error, whatever state the settings and credentials files are in
//! - Missing credentials stop the run before any git or generator call
//! - A failed generator means nothing is staged, committed, or pushed
//! - Identical output produces no commit and no push
//!
//! # Example
//!
//! ```ignore
//! use intelpub::engine::Pipeline;
//!
//! let report = Pipeline::new(&settings, &env, &git, &generator).run()?;
//! println!("{}", report.outcome);
//! ```

pub mod pipeline;
pub mod steps;

pub use pipeline::{admit, Pipeline, RunOutcome, RunReport};
pub use steps::{Recoverability, Recovered, Step, StepFailure, StepRunner};

use std::path::PathBuf;

use thiserror::Error;

use crate::core::lock::LockError;
use crate::core::runlog::RunLogError;

/// Process exit code for a missing required credential.
pub const EXIT_MISSING_CREDENTIAL: i32 = 2;

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required credential is missing or blank.
    #[error("missing required credential {} (checked the environment and {})", .keys.join(", "), .env_file.display())]
    MissingCredential { keys: Vec<String>, env_file: PathBuf },

    /// The logs directory could not be created.
    #[error("failed to create logs directory '{path}': {source}")]
    LogsDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    RunLog(#[from] RunLogError),

    /// A fatal step failed.
    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: StepFailure,
    },
}

impl PipelineError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MissingCredential { .. } => EXIT_MISSING_CREDENTIAL,
            PipelineError::Step {
                source: StepFailure::Generator(err),
                ..
            } => err.exit_code(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorError;
    use crate::git::GitError;

    #[test]
    fn exit_codes() {
        let missing = PipelineError::MissingCredential {
            keys: vec!["BRAVE_API_KEY".into()],
            env_file: PathBuf::from("/home/u/.openclaw/.env"),
        };
        assert_eq!(missing.exit_code(), 2);

        let generator = PipelineError::Step {
            step: Step::Generate,
            source: StepFailure::Generator(GeneratorError::Failed {
                command: "python3 scripts/generate.py".into(),
                code: Some(7),
                log: PathBuf::from("logs/generate.log"),
            }),
        };
        assert_eq!(generator.exit_code(), 7);

        let push = PipelineError::Step {
            step: Step::Push,
            source: StepFailure::Git(GitError::CommandFailed {
                command: "git push".into(),
                code: Some(128),
                log: PathBuf::from("logs/git.log"),
            }),
        };
        assert_eq!(push.exit_code(), 1);
    }

    #[test]
    fn missing_credential_message_names_key_not_value() {
        let err = PipelineError::MissingCredential {
            keys: vec!["BRAVE_API_KEY".into()],
            env_file: PathBuf::from("/home/u/.openclaw/.env"),
        };
        let msg = err.to_string();
        assert!(msg.contains("BRAVE_API_KEY"));
        assert!(msg.contains("/home/u/.openclaw/.env"));
    }
}
