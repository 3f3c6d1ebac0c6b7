//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Zone`] - IANA timezone every timestamp is rendered in
//! - [`Timestamp`] - A moment in that zone, RFC3339 on display
//! - [`EnvKey`] - Validated environment variable name
//! - [`GitName`] - Validated remote or branch name handed to git
//!
//! # Validation
//!
//! These types enforce validity at construction time. A bad value in the
//! settings file fails at load, not halfway through a run.
//!
//! # Examples
//!
//! ```
//! use intelpub::core::types::{EnvKey, GitName, Zone};
//!
//! let zone: Zone = "America/New_York".parse().unwrap();
//! assert_eq!(zone.name(), "America/New_York");
//! assert!("Mars/Olympus".parse::<Zone>().is_err());
//!
//! assert!(EnvKey::new("BRAVE_API_KEY").is_ok());
//! assert!(EnvKey::new("1BAD").is_err());
//!
//! assert!(GitName::new("origin").is_ok());
//! assert!(GitName::new("--upload-pack=evil").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown timezone '{0}': expected an IANA name such as Asia/Shanghai")]
    InvalidZone(String),

    #[error("invalid environment variable name '{0}'")]
    InvalidEnvKey(String),

    #[error("invalid git name: {0}")]
    InvalidGitName(String),
}

/// The IANA timezone every timestamp is rendered in, such as
/// `Asia/Shanghai`.
///
/// The same zone is exported as `TZ` to subprocesses, so the generator and
/// the run log never disagree about local time. Offsets follow the zone's
/// rules, daylight saving included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Zone(Tz);

impl Zone {
    pub fn shanghai() -> Self {
        Self(chrono_tz::Asia::Shanghai)
    }

    /// The zone's IANA name, the value exported as `TZ`.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Get the underlying chrono-tz zone.
    pub fn as_tz(&self) -> Tz {
        self.0
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::shanghai()
    }
}

impl FromStr for Zone {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Tz>()
            .map(Self)
            .map_err(|_| TypeError::InvalidZone(s.to_string()))
    }
}

impl TryFrom<String> for Zone {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.name().to_string()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A moment rendered in the pipeline's zone, with the offset in effect at
/// that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// The current moment in `zone`.
    pub fn now(zone: Zone) -> Self {
        Self::at(Utc::now(), zone)
    }

    /// `instant` as seen in `zone`.
    pub fn at(instant: DateTime<Utc>, zone: Zone) -> Self {
        Self(instant.with_timezone(&zone.as_tz()).fixed_offset())
    }

    /// Wrap an existing datetime.
    pub fn from_datetime(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// `YYYY-MM-DD HH:MM`, the form used in commit messages.
    pub fn label(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
        )
    }
}

/// A validated environment variable name.
///
/// Names follow the portable shell rule: ASCII letters, digits and `_`,
/// not starting with a digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvKey(String);

impl EnvKey {
    /// Create a new validated key.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(TypeError::InvalidEnvKey(name))
        }
    }

    /// Build a key from a name known to be valid at compile time.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::is_valid(name), "invalid static env key {name}");
        Self(name.to_string())
    }

    /// Check `name` without allocating.
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EnvKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvKey> for String {
    fn from(key: EnvKey) -> Self {
        key.0
    }
}

impl fmt::Display for EnvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote or branch name passed on the git command line.
///
/// Applies the subset of `git check-ref-format` rules that matter here,
/// and refuses a leading `-` so the value can never be read as an option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GitName(String);

impl GitName {
    /// Create a new validated name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidGitName` if the name violates the rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let reject = |why: &str| Err(TypeError::InvalidGitName(format!("'{name}' {why}")));

        if name.is_empty() {
            return reject("is empty");
        }
        if name.starts_with('-') || name.starts_with('.') {
            return reject("cannot start with '-' or '.'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return reject("cannot end with '.lock' or '/'");
        }
        if name.contains("..") || name.contains("@{") || name.contains("//") {
            return reject("cannot contain '..', '@{' or '//'");
        }
        if name
            .chars()
            .any(|c| c.is_ascii_control() || " ~^:\\?*[".contains(c))
        {
            return reject("contains a forbidden character");
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GitName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GitName> for String {
    fn from(name: GitName) -> Self {
        name.0
    }
}

impl fmt::Display for GitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
