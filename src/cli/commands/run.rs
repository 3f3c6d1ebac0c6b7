//! run command - One publish run
//!
//! Takes the run lock from the root alone, then loads settings and
//! credentials, wires the real git repository and generator subprocess
//! into the pipeline, and maps the result to an exit code.

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::cli::{exit_code, Context};
use crate::core::environment::RunEnvironment;
use crate::core::paths::PipelinePaths;
use crate::core::runlog::CaptureLog;
use crate::engine::{self, Pipeline, RunReport};
use crate::generator::ProcessGenerator;
use crate::git::GitRepo;
use crate::ui::output;

/// Perform one run.
pub fn run(ctx: &Context) -> Result<ExitCode> {
    let paths = PipelinePaths::new(ctx.root()?);
    output::debug(format!("root: {}", paths.root.display()), ctx.verbosity);

    // Only the zone is used before the lock; load errors surface after it.
    let settings = ctx.settings();
    let zone = settings.as_ref().map(|s| s.timezone).unwrap_or_default();

    let lock = match engine::admit(&paths, zone) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            output::report(&RunReport::skipped(), ctx.verbosity);
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => {
            output::error(&err);
            return Ok(exit_code(err.exit_code()));
        }
    };

    let settings = settings?;
    let env = RunEnvironment::load(&settings.env_file).context("failed to load credentials")?;
    if let Some(source) = env.source() {
        output::debug(format!("env file: {}", source.display()), ctx.verbosity);
    }

    let git_log = CaptureLog::new(settings.paths.git_log_path(), settings.timezone);
    let git = GitRepo::new(&settings.paths.root, git_log)
        .with_env(env.overlay())
        .with_env([("TZ", settings.timezone.name())])
        .with_target(settings.git.remote.clone(), settings.git.branch.clone());
    let generator = ProcessGenerator::from_settings(&settings, &env);

    match Pipeline::new(&settings, &env, &git, &generator).run_locked(&lock) {
        Ok(report) => {
            output::report(&report, ctx.verbosity);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            output::error(&err);
            Ok(exit_code(err.exit_code()))
        }
    }
}
