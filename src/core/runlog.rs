//! core::runlog
//!
//! Append-only logs under `logs/`.
//!
//! # Files
//!
//! - `cron.log` ([`RunLog`]): one line per finished run,
//!   `<RFC3339 timestamp> <event>`
//! - `git.log`, `generate.log` ([`CaptureLog`]): raw subprocess output,
//!   each invocation preceded by `==> <timestamp> <command>`
//!
//! Both are only ever appended to. Rotation is left to the host.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Timestamp, Zone};

/// Errors from log writes and reads.
#[derive(Debug, Error)]
pub enum RunLogError {
    #[error("failed to write log '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read log '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome recorded in `cron.log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// Another run held the lock.
    SkippedLocked,
    /// Generator output matched the last commit.
    NoChanges,
    /// A new commit was created and pushed.
    Pushed,
    /// No new output, but commits left by an earlier run were pushed.
    PushedPending,
}

impl RunEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunEvent::SkippedLocked => "locked; skip",
            RunEvent::NoChanges => "no changes",
            RunEvent::Pushed => "pushed",
            RunEvent::PushedPending => "pushed pending",
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed line of `cron.log`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunLogEntry {
    pub timestamp: String,
    pub message: String,
}

/// The run outcome log.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    zone: Zone,
}

impl RunLog {
    pub fn new(path: PathBuf, zone: Zone) -> Self {
        Self { path, zone }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `event` stamped with the current time.
    pub fn record(&self, event: RunEvent) -> Result<(), RunLogError> {
        self.record_at(Timestamp::now(self.zone), event)
    }

    /// Append `event` stamped with `at`.
    pub fn record_at(&self, at: Timestamp, event: RunEvent) -> Result<(), RunLogError> {
        let write_err = |source| RunLogError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = open_append(&self.path).map_err(write_err)?;
        writeln!(file, "{at} {event}").map_err(write_err)
    }

    /// The last `n` entries, oldest first. A missing log is empty.
    pub fn tail(&self, n: usize) -> Result<Vec<RunLogEntry>, RunLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| RunLogError::Read {
            path: self.path.clone(),
            source,
        })?;

        let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..]
            .iter()
            .map(|line| match line.split_once(' ') {
                Some((ts, msg)) => RunLogEntry {
                    timestamp: ts.to_string(),
                    message: msg.to_string(),
                },
                None => RunLogEntry {
                    timestamp: String::new(),
                    message: line.to_string(),
                },
            })
            .collect())
    }
}

/// A log that captures subprocess output.
#[derive(Debug, Clone)]
pub struct CaptureLog {
    path: PathBuf,
    zone: Zone,
}

impl CaptureLog {
    pub fn new(path: PathBuf, zone: Zone) -> Self {
        Self { path, zone }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a header for `command` and return a handle positioned at the
    /// end of the file, ready to be used as a child's stdout or stderr.
    pub fn begin(&self, command: &str) -> Result<File, RunLogError> {
        let write_err = |source| RunLogError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = open_append(&self.path).map_err(write_err)?;
        writeln!(file, "==> {} {}", Timestamp::now(self.zone), command).map_err(write_err)?;
        Ok(file)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
