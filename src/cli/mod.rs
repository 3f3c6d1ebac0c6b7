//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize diagnostics logging
//! - Resolve settings and the run environment, then delegate to commands
//!
//! The CLI never mutates the repository itself. Publishing goes through
//! [`crate::engine::Pipeline`].

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::{Settings, SettingsSources};
use crate::ui::output::Verbosity;

/// Execution context built from global flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// `--root` override.
    pub root: Option<PathBuf>,
    /// `--env-file` override.
    pub env_file: Option<PathBuf>,
    pub verbosity: Verbosity,
}

impl Context {
    fn sources(&self) -> SettingsSources {
        SettingsSources::from_process(self.root.clone(), self.env_file.clone())
    }

    /// Resolve only the pipeline root, without reading any file.
    pub fn root(&self) -> Result<PathBuf> {
        self.sources()
            .root()
            .context("failed to locate the pipeline root")
    }

    /// Resolve settings for this invocation.
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.sources()).context("failed to load settings")
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. Errors returned
/// here exit with code 1; commands that need another code return it.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = Context {
        root: cli.root.clone(),
        env_file: cli.env_file.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command.unwrap_or(Command::Run), &ctx)
}

/// `RUST_LOG` if set, otherwise `debug` with `--debug` and `error` without.
fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Convert a failure code to the process type.
pub(crate) fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(failure_byte(code))
}

/// Codes outside `1..=255` collapse to 1.
fn failure_byte(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(0) | Err(_) => 1,
        Ok(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_codes_stay_non_zero() {
        assert_eq!(failure_byte(2), 2);
        assert_eq!(failure_byte(127), 127);
        assert_eq!(failure_byte(0), 1);
        assert_eq!(failure_byte(-1), 1);
        assert_eq!(failure_byte(300), 1);
    }
}
