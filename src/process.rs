//! process
//!
//! Running a subprocess with its output captured into a log file.
//!
//! Both git and the generator are run this way: stdin closed, stdout and
//! stderr appended to a [`CaptureLog`], extra variables from the run
//! environment set explicitly. The caller decides what a non-zero exit
//! status means.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::core::runlog::{CaptureLog, RunLogError};

/// Errors from starting a captured subprocess.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Log(#[from] RunLogError),

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// A subprocess invocation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub cwd: &'a Path,
    pub env: &'a [(String, String)],
}

impl Invocation<'_> {
    /// Command line as shown in logs and errors.
    pub fn display(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion with output appended to `log`.
    pub fn run_captured(&self, log: &CaptureLog) -> Result<ExitStatus, CaptureError> {
        let command = self.display();
        debug!(%command, log = %log.path().display(), "running");

        let stdout = log.begin(&command)?;
        let stderr = stdout.try_clone().map_err(|source| RunLogError::Write {
            path: log.path().to_path_buf(),
            source,
        })?;

        let status = Command::new(self.program)
            .args(self.args)
            .current_dir(self.cwd)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(|source| CaptureError::Spawn {
                command: command.clone(),
                source,
            })?;

        debug!(%command, code = ?status.code(), "finished");
        Ok(status)
    }
}
