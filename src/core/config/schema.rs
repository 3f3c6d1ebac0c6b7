//! core::config::schema
//!
//! Schema of the optional `intelpub.toml` settings file.
//!
//! Every field is optional; an absent file and an empty file mean the same
//! thing. Values are validated after parsing so a typo fails at load time.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{EnvKey, GitName, Zone};

/// Top-level settings file.
///
/// # Example
///
/// ```toml
/// output_dir = "docs"
/// env_file = "~/.openclaw/.env"
/// required_env = ["BRAVE_API_KEY"]
/// timezone = "Asia/Shanghai"
///
/// [generator]
/// command = ["python3", "scripts/generate.py"]
///
/// [git]
/// remote = "origin"
/// branch = "main"
/// commit_prefix = "chore: update AI daily intel"
/// push_pending = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    /// Generator output directory, relative to the root.
    pub output_dir: Option<String>,

    /// Environment file with credentials. `~/` is expanded.
    pub env_file: Option<String>,

    /// Variables required in addition to `BRAVE_API_KEY`.
    pub required_env: Option<Vec<EnvKey>>,

    /// IANA timezone for timestamps, also exported as `TZ`.
    pub timezone: Option<Zone>,

    /// Generator invocation.
    pub generator: Option<GeneratorSection>,

    /// Git publishing options.
    pub git: Option<GitSection>,
}

impl FileSettings {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.output_dir {
            let path = std::path::Path::new(dir);
            if dir.trim().is_empty() || path.is_absolute() {
                return Err(ConfigError::InvalidValue(
                    "output_dir must be a non-empty path relative to the root".into(),
                ));
            }
            if path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
            {
                return Err(ConfigError::InvalidValue(
                    "output_dir cannot leave the root".into(),
                ));
            }
        }

        if let Some(env_file) = &self.env_file {
            if env_file.trim().is_empty() {
                return Err(ConfigError::InvalidValue("env_file cannot be empty".into()));
            }
        }

        if let Some(generator) = &self.generator {
            generator.validate()?;
        }
        if let Some(git) = &self.git {
            git.validate()?;
        }

        Ok(())
    }
}

/// `[generator]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    /// Program and arguments, run from the root.
    pub command: Option<Vec<String>>,
}

impl GeneratorSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(command) = &self.command {
            match command.first() {
                Some(program) if !program.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "generator.command needs at least a program".into(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// `[git]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitSection {
    /// Remote to pull from and push to. Default: the branch's upstream.
    pub remote: Option<GitName>,

    /// Branch to pull and push. Only used together with `remote`.
    pub branch: Option<GitName>,

    /// Text before the date/time in commit messages.
    pub commit_prefix: Option<String>,

    /// Push commits left behind by an earlier failed push.
    pub push_pending: Option<bool>,
}

impl GitSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branch.is_some() && self.remote.is_none() {
            return Err(ConfigError::InvalidValue(
                "git.branch requires git.remote".into(),
            ));
        }
        if let Some(prefix) = &self.commit_prefix {
            if prefix.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git.commit_prefix cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> FileSettings {
        toml::from_str(s).expect("parse")
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = parse("");
        assert_eq!(settings, FileSettings::default());
        settings.validate().unwrap();
    }

    #[test]
    fn full_file_parses() {
        let settings = parse(
            r#"
            output_dir = "public"
            env_file = "~/.secrets/intel.env"
            required_env = ["BRAVE_API_KEY", "OTHER_KEY"]
            timezone = "Europe/Berlin"

            [generator]
            command = ["python3", "scripts/generate.py", "--fast"]

            [git]
            remote = "origin"
            branch = "main"
            commit_prefix = "update"
            push_pending = false
            "#,
        );
        settings.validate().unwrap();

        assert_eq!(settings.output_dir.as_deref(), Some("public"));
        assert_eq!(settings.required_env.as_ref().map(Vec::len), Some(2));
        assert_eq!(settings.timezone.map(|z| z.name()), Some("Europe/Berlin"));
        let git = settings.git.unwrap();
        assert_eq!(git.remote.unwrap().as_str(), "origin");
        assert_eq!(git.push_pending, Some(false));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(toml::from_str::<FileSettings>("colour = \"blue\"").is_err());
        assert!(toml::from_str::<FileSettings>("[git]\nforce = true").is_err());
    }

    #[test]
    fn invalid_types_are_rejected_at_parse() {
        assert!(toml::from_str::<FileSettings>("timezone = \"+08:00\"").is_err());
        assert!(toml::from_str::<FileSettings>("timezone = \"Mars/Olympus\"").is_err());
        assert!(toml::from_str::<FileSettings>("required_env = [\"BAD-KEY\"]").is_err());
        assert!(toml::from_str::<FileSettings>("[git]\nremote = \"-x\"").is_err());
    }

    #[test]
    fn output_dir_must_stay_inside_root() {
        for bad in ["", "/abs/docs", "../docs", "docs/../../x"] {
            let settings = FileSettings {
                output_dir: Some(bad.into()),
                ..Default::default()
            };
            assert!(settings.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn empty_generator_command_is_rejected() {
        let settings = parse("[generator]\ncommand = []");
        assert!(settings.validate().is_err());

        let settings = parse("[generator]\ncommand = [\" \"]");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn branch_without_remote_is_rejected() {
        let settings = parse("[git]\nbranch = \"main\"");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn blank_commit_prefix_is_rejected() {
        let settings = parse("[git]\ncommit_prefix = \"  \"");
        assert!(settings.validate().is_err());
    }
}
