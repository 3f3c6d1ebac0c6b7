//! core::environment
//!
//! The immutable environment a pipeline run sees.
//!
//! # Design
//!
//! Credentials come from two places: the environment the scheduler
//! started us with, and the per-user env file. The file wins, matching a
//! shell that sources it after startup.
//!
//! Nothing here writes to the process environment. The merged view is a
//! plain value handed to the pipeline, and the subset that differs from
//! the inherited environment (the *overlay*) is passed explicitly to
//! every subprocess. Tests build a `RunEnvironment` directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::env_file::{EnvFile, EnvFileError};

/// Variable the generator cannot run without.
pub const BRAVE_API_KEY: &str = "BRAVE_API_KEY";

/// Merged environment for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunEnvironment {
    /// Inherited variables (the process environment at startup).
    inherited: BTreeMap<String, String>,
    /// Variables exported to subprocesses on top of the inherited ones.
    overlay: BTreeMap<String, String>,
    /// Env file that contributed to the overlay, if one was found.
    source: Option<PathBuf>,
}

impl RunEnvironment {
    /// Build from the current process environment plus the env file.
    pub fn load(env_file: &Path) -> Result<Self, EnvFileError> {
        let inherited = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Ok(Self::from_parts(inherited, EnvFile::load(env_file)?, env_file))
    }

    /// Build from explicit inherited variables and an optional parsed file.
    pub fn from_parts(
        inherited: impl IntoIterator<Item = (String, String)>,
        file: Option<EnvFile>,
        file_path: &Path,
    ) -> Self {
        let mut env = Self {
            inherited: inherited.into_iter().collect(),
            overlay: BTreeMap::new(),
            source: None,
        };
        if let Some(file) = file {
            for (key, value) in file.iter() {
                env.overlay.insert(key.to_string(), value.to_string());
            }
            env.source = Some(file_path.to_path_buf());
        }
        env
    }

    /// Add or replace an exported variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overlay.insert(key.into(), value.into());
        self
    }

    /// Look up a variable, overlay first.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.overlay
            .get(key)
            .or_else(|| self.inherited.get(key))
            .map(String::as_str)
    }

    /// Look up a variable that must be set to a non-blank value.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Names from `required` that are missing or blank.
    pub fn missing<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        required
            .into_iter()
            .filter(|key| self.non_empty(key).is_none())
            .collect()
    }

    /// Variables to set on each subprocess.
    pub fn overlay(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overlay.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Env file that was read, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inherited(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn file(contents: &str) -> EnvFile {
        EnvFile::parse(contents, Path::new("test.env")).unwrap()
    }

    #[test]
    fn inherited_value_is_visible() {
        let env = RunEnvironment::from_parts(
            inherited(&[(BRAVE_API_KEY, "inherited")]),
            None,
            Path::new("absent.env"),
        );

        assert_eq!(env.get(BRAVE_API_KEY), Some("inherited"));
        assert!(env.source().is_none());
        assert_eq!(env.overlay().count(), 0);
    }

    #[test]
    fn file_overrides_inherited() {
        let env = RunEnvironment::from_parts(
            inherited(&[(BRAVE_API_KEY, "inherited")]),
            Some(file("BRAVE_API_KEY=from-file")),
            Path::new("/home/u/.env"),
        );

        assert_eq!(env.get(BRAVE_API_KEY), Some("from-file"));
        assert_eq!(env.source(), Some(Path::new("/home/u/.env")));
        let overlay: Vec<_> = env.overlay().collect();
        assert_eq!(overlay, vec![(BRAVE_API_KEY, "from-file")]);
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let env = RunEnvironment::from_parts(
            inherited(&[(BRAVE_API_KEY, "   ")]),
            None,
            Path::new("absent.env"),
        );

        assert!(env.non_empty(BRAVE_API_KEY).is_none());
        assert_eq!(env.missing([BRAVE_API_KEY]), vec![BRAVE_API_KEY]);
    }

    #[test]
    fn missing_lists_only_absent_keys() {
        let env = RunEnvironment::default().with_var("A", "1");
        assert_eq!(env.missing(["A", "B", "C"]), vec!["B", "C"]);
    }

    #[test]
    fn with_var_is_exported() {
        let env = RunEnvironment::default().with_var("TZ", "Asia/Shanghai");
        assert_eq!(env.get("TZ"), Some("Asia/Shanghai"));
        assert!(env.overlay().any(|(k, v)| k == "TZ" && v == "Asia/Shanghai"));
    }
}
