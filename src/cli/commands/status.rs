//! status command - Report pipeline state without changing it
//!
//! Probes the run lock with a shared lock released at once (see
//! [`RunLock::is_locked`] for the window this leaves),
//! checks which required credentials are available, counts unpushed
//! commits, and tails the run log. Credential values are never shown.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::Context;
use crate::core::config::Settings;
use crate::core::environment::RunEnvironment;
use crate::core::lock::RunLock;
use crate::core::runlog::{CaptureLog, RunLog, RunLogEntry};
use crate::git::{GitRepo, Vcs};
use crate::ui::output;

/// Everything `status` reports.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub root: PathBuf,
    pub settings_file: Option<PathBuf>,
    pub env_file: PathBuf,
    pub env_file_found: bool,
    /// Whether a run currently holds the lock.
    pub locked: bool,
    pub credentials: Vec<CredentialStatus>,
    /// `None` when there is no upstream to compare against.
    pub unpushed_commits: Option<usize>,
    pub recent_runs: Vec<RunLogEntry>,
}

#[derive(Debug, Serialize)]
pub struct CredentialStatus {
    pub name: String,
    pub present: bool,
}

impl StatusReport {
    /// Gather status for `settings`.
    pub fn collect(settings: &Settings, env: &RunEnvironment, lines: usize) -> Result<Self> {
        let paths = &settings.paths;
        let locked = RunLock::is_locked(&paths.lock_path()).context("failed to probe run lock")?;

        let credentials = settings
            .required_env
            .iter()
            .map(|key| CredentialStatus {
                name: key.to_string(),
                present: env.non_empty(key.as_str()).is_some(),
            })
            .collect();

        let git = GitRepo::new(
            &paths.root,
            CaptureLog::new(paths.git_log_path(), settings.timezone),
        )
        .with_target(settings.git.remote.clone(), settings.git.branch.clone());
        // Not a repository, or no upstream: unknown.
        let unpushed_commits = git.unpushed_commits().ok().flatten();

        let recent_runs = RunLog::new(paths.run_log_path(), settings.timezone)
            .tail(lines)
            .context("failed to read run log")?;

        Ok(Self {
            root: paths.root.clone(),
            settings_file: settings.settings_file.clone(),
            env_file: settings.env_file.clone(),
            env_file_found: env.source().is_some(),
            locked,
            credentials,
            unpushed_commits,
            recent_runs,
        })
    }

    /// Human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        out.push(format!("root:      {}", self.root.display()));
        if let Some(file) = &self.settings_file {
            out.push(format!("settings:  {}", file.display()));
        }
        out.push(format!(
            "env file:  {} ({})",
            self.env_file.display(),
            if self.env_file_found { "found" } else { "missing" }
        ));
        out.push(format!(
            "lock:      {}",
            if self.locked { "held (run in progress)" } else { "free" }
        ));
        for cred in &self.credentials {
            out.push(format!(
                "{}: {}",
                cred.name,
                if cred.present { "set" } else { "missing" }
            ));
        }
        out.push(match self.unpushed_commits {
            Some(n) => format!("unpushed:  {n}"),
            None => "unpushed:  unknown (no upstream)".to_string(),
        });
        if self.recent_runs.is_empty() {
            out.push("recent runs: none".to_string());
        } else {
            let runs: Vec<String> = self
                .recent_runs
                .iter()
                .map(|e| format!("{} {}", e.timestamp, e.message))
                .collect();
            out.push(format!("recent runs:\n{}", output::format_list(&runs, "  ")));
        }
        out.join("\n")
    }
}

/// Print pipeline status.
pub fn status(ctx: &Context, json: bool, lines: usize) -> Result<ExitCode> {
    let settings = ctx.settings()?;
    let env = RunEnvironment::load(&settings.env_file).context("failed to load credentials")?;
    let report = StatusReport::collect(&settings, &env, lines)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialize status")?;
        println!("{rendered}");
    } else {
        output::print(report.render(), ctx.verbosity);
    }
    Ok(ExitCode::SUCCESS)
}
