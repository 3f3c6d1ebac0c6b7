//! core::config
//!
//! Settings resolution.
//!
//! # Overview
//!
//! A run is driven by one immutable [`Settings`] value built before the
//! pipeline starts. Nothing downstream reads the process environment for
//! configuration.
//!
//! # Precedence
//!
//! Values are resolved in this order (earlier wins):
//! 1. CLI flags (`--root`, `--env-file`)
//! 2. Environment variables (`INTELPUB_ROOT`, `INTELPUB_ENV_FILE`)
//! 3. `<root>/intelpub.toml`
//! 4. Built-in defaults
//!
//! # Root discovery
//!
//! Without a flag or variable, the root is found from the executable's own
//! location (see [`crate::core::paths::discover_root`]), never from the
//! caller's working directory.
//!
//! # Example
//!
//! ```no_run
//! use intelpub::core::config::{Settings, SettingsSources};
//!
//! let sources = SettingsSources::from_process(None, None);
//! let settings = Settings::load(&sources).unwrap();
//! println!("root: {}", settings.paths.root.display());
//! ```

pub mod schema;

pub use schema::{FileSettings, GeneratorSection, GitSection};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::environment::BRAVE_API_KEY;
use crate::core::paths::{discover_root, PipelinePaths};
use crate::core::types::{EnvKey, GitName, Zone};

/// Environment variable overriding the root.
pub const ROOT_ENV: &str = "INTELPUB_ROOT";

/// Environment variable overriding the env file.
pub const ENV_FILE_ENV: &str = "INTELPUB_ENV_FILE";

/// Default credentials file, relative to the home directory.
pub const DEFAULT_ENV_FILE: &str = "~/.openclaw/.env";

/// Default commit message prefix.
pub const DEFAULT_COMMIT_PREFIX: &str = "chore: update AI daily intel";

/// Default generator invocation.
pub const DEFAULT_GENERATOR: [&str; 2] = ["python3", "scripts/generate.py"];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid settings value: {0}")]
    InvalidValue(String),

    #[error("cannot locate the pipeline root: {0}")]
    NoRoot(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Inputs to settings resolution, gathered once at startup.
#[derive(Debug, Clone, Default)]
pub struct SettingsSources {
    pub root_flag: Option<PathBuf>,
    pub env_file_flag: Option<PathBuf>,
    pub root_env: Option<PathBuf>,
    pub env_file_env: Option<PathBuf>,
    /// Directory holding the running executable.
    pub exe_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
}

impl SettingsSources {
    /// Gather sources from CLI flags and the real process.
    pub fn from_process(root_flag: Option<PathBuf>, env_file_flag: Option<PathBuf>) -> Self {
        let non_empty_var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            root_flag,
            env_file_flag,
            root_env: non_empty_var(ROOT_ENV),
            env_file_env: non_empty_var(ENV_FILE_ENV),
            exe_dir: std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
            home_dir: dirs::home_dir(),
        }
    }

    /// The pipeline root: flag, then variable, then discovery from the
    /// executable.
    pub fn root(&self) -> Result<PathBuf, ConfigError> {
        if let Some(root) = self.root_flag.as_ref().or(self.root_env.as_ref()) {
            return Ok(root.clone());
        }
        self.exe_dir
            .as_deref()
            .map(discover_root)
            .ok_or_else(|| ConfigError::NoRoot("executable location is unknown".into()))
    }
}

/// Git publishing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSettings {
    pub remote: Option<GitName>,
    pub branch: Option<GitName>,
    pub commit_prefix: String,
    pub push_pending: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: None,
            branch: None,
            commit_prefix: DEFAULT_COMMIT_PREFIX.to_string(),
            push_pending: true,
        }
    }
}

/// Fully resolved, immutable settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub paths: PipelinePaths,
    pub env_file: PathBuf,
    /// Always starts with `BRAVE_API_KEY`.
    pub required_env: Vec<EnvKey>,
    pub timezone: Zone,
    pub generator_command: Vec<String>,
    pub git: GitSettings,
    /// Settings file that was read, if one existed.
    pub settings_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults for `root`, with the env file at `env_file`.
    pub fn with_defaults(root: PathBuf, env_file: PathBuf) -> Self {
        Self {
            paths: PipelinePaths::new(root),
            env_file,
            required_env: vec![EnvKey::from_static(BRAVE_API_KEY)],
            timezone: Zone::default(),
            generator_command: DEFAULT_GENERATOR.iter().map(|s| s.to_string()).collect(),
            git: GitSettings::default(),
            settings_file: None,
        }
    }

    /// Resolve settings from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be read,
    /// parsed, or validated, or if a default path needs a home directory
    /// that cannot be determined. A missing settings file is not an error.
    pub fn load(sources: &SettingsSources) -> Result<Self, ConfigError> {
        let root = sources.root()?;
        let settings_path = PipelinePaths::new(root.clone()).settings_path();
        let file = Self::read_file(&settings_path)?;
        file.validate()?;

        let env_file = match sources
            .env_file_flag
            .as_ref()
            .or(sources.env_file_env.as_ref())
        {
            Some(path) => path.clone(),
            None => expand_home(
                file.env_file.as_deref().unwrap_or(DEFAULT_ENV_FILE),
                sources.home_dir.as_deref(),
            )?,
        };

        let mut settings = Self::with_defaults(root, env_file);
        settings.apply(file, settings_path.exists().then_some(settings_path));
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<FileSettings, ConfigError> {
        if !path.is_file() {
            return Ok(FileSettings::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn apply(&mut self, file: FileSettings, source: Option<PathBuf>) {
        if let Some(dir) = file.output_dir {
            self.paths = self.paths.clone().with_output_dir(dir);
        }
        for key in file.required_env.into_iter().flatten() {
            if !self.required_env.contains(&key) {
                self.required_env.push(key);
            }
        }
        if let Some(zone) = file.timezone {
            self.timezone = zone;
        }
        if let Some(command) = file.generator.and_then(|g| g.command) {
            self.generator_command = command;
        }
        if let Some(git) = file.git {
            self.git.remote = git.remote;
            self.git.branch = git.branch;
            if let Some(prefix) = git.commit_prefix {
                self.git.commit_prefix = prefix;
            }
            if let Some(push_pending) = git.push_pending {
                self.git.push_pending = push_pending;
            }
        }
        self.settings_file = source;
    }

    /// Relative output directory, as configured.
    pub fn output_dir(&self) -> &Path {
        self.paths.output_dir_relative()
    }
}

/// Expand a leading `~/` against `home`.
fn expand_home(path: &str, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~/") {
        Some(rest) => home
            .map(|h| h.join(rest))
            .ok_or(ConfigError::NoHomeDir),
        None if path == "~" => home.map(Path::to_path_buf).ok_or(ConfigError::NoHomeDir),
        None => Ok(PathBuf::from(path)),
    }
}
