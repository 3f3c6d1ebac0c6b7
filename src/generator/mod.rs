//! generator
//!
//! Running the external site generator.
//!
//! The generator is an opaque program: it reads credentials from its
//! environment, writes the site under the output directory, and reports
//! failure with a non-zero exit status. This crate never looks inside it.
//!
//! # Environment
//!
//! The child inherits this process's environment plus:
//! - every variable from the run environment's overlay (the env file)
//! - `TZ`, set to the configured timezone name

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::config::Settings;
use crate::core::environment::RunEnvironment;
use crate::core::runlog::CaptureLog;
use crate::process::{CaptureError, Invocation};

/// Errors from running the generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// No generator command is configured.
    #[error("no generator command configured")]
    NotConfigured,

    /// The generator could not be started or its log written.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The generator ran and exited unsuccessfully.
    #[error("generator `{command}` failed with exit code {code:?} (see {log})")]
    Failed {
        command: String,
        code: Option<i32>,
        log: PathBuf,
    },
}

impl GeneratorError {
    /// Process exit code to propagate: the generator's own when it has
    /// one, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            GeneratorError::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Something that regenerates the site.
pub trait Generator {
    fn generate(&self) -> Result<(), GeneratorError>;
}

/// The generator as a subprocess run in the pipeline root.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    command: Vec<String>,
    cwd: PathBuf,
    env: Vec<(String, String)>,
    log: CaptureLog,
}

impl ProcessGenerator {
    pub fn new(command: Vec<String>, cwd: &Path, log: CaptureLog) -> Self {
        Self {
            command,
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
            log,
        }
    }

    /// Configured from settings, with the run environment exported.
    pub fn from_settings(settings: &Settings, env: &RunEnvironment) -> Self {
        let log = CaptureLog::new(settings.paths.generate_log_path(), settings.timezone);
        Self::new(
            settings.generator_command.clone(),
            &settings.paths.root,
            log,
        )
        .with_env(env.overlay())
        .with_env([("TZ", settings.timezone.name())])
    }

    /// Add variables to the child environment. Later values win.
    pub fn with_env<'a>(mut self, vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (key, value) in vars {
            self.env.retain(|(k, _)| k != key);
            self.env.push((key.to_string(), value.to_string()));
        }
        self
    }
}

impl Generator for ProcessGenerator {
    fn generate(&self) -> Result<(), GeneratorError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(GeneratorError::NotConfigured)?;

        let invocation = Invocation {
            program: program.as_str(),
            args,
            cwd: &self.cwd,
            env: &self.env,
        };
        let status = invocation.run_captured(&self.log)?;
        debug!(success = status.success(), "generator finished");

        if status.success() {
            Ok(())
        } else {
            Err(GeneratorError::Failed {
                command: invocation.display(),
                code: status.code(),
                log: self.log.path().to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Zone;
    use std::fs;
    use tempfile::TempDir;

    fn generator(temp: &TempDir, script: &str) -> ProcessGenerator {
        let log = CaptureLog::new(temp.path().join("logs/generate.log"), Zone::default());
        ProcessGenerator::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            temp.path(),
            log,
        )
    }

    #[test]
    fn exit_code_prefers_generator_code() {
        let failed = |code| GeneratorError::Failed {
            command: "gen".into(),
            code,
            log: PathBuf::from("logs/generate.log"),
        };
        assert_eq!(failed(Some(3)).exit_code(), 3);
        assert_eq!(failed(None).exit_code(), 1);
        assert_eq!(GeneratorError::NotConfigured.exit_code(), 1);
    }

    #[test]
    fn empty_command_is_not_configured() {
        let temp = TempDir::new().unwrap();
        let log = CaptureLog::new(temp.path().join("gen.log"), Zone::default());
        let err = ProcessGenerator::new(Vec::new(), temp.path(), log)
            .generate()
            .unwrap_err();
        assert!(matches!(err, GeneratorError::NotConfigured));
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_root_with_exported_env() {
        let temp = TempDir::new().unwrap();
        let site = generator(
            &temp,
            "mkdir -p docs && printf '%s|%s' \"$BRAVE_API_KEY\" \"$TZ\" > docs/out.txt",
        )
        .with_env([("BRAVE_API_KEY", "k-1"), ("TZ", "UTC")])
        .with_env([("TZ", "Asia/Shanghai")]);

        site.generate().unwrap();

        let out = fs::read_to_string(temp.path().join("docs/out.txt")).unwrap();
        assert_eq!(out, "k-1|Asia/Shanghai");
    }

    #[cfg(unix)]
    #[test]
    fn failure_carries_code_and_captures_output() {
        let temp = TempDir::new().unwrap();
        let err = generator(&temp, "echo fetch failed >&2; exit 4")
            .generate()
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        let log = fs::read_to_string(temp.path().join("logs/generate.log")).unwrap();
        assert!(log.contains("fetch failed"));
    }
}
