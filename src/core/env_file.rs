//! core::env_file
//!
//! Parser for the per-user credentials file.
//!
//! # Format
//!
//! The file is the shell-sourced `.env` style the scheduler setup already
//! uses:
//!
//! ```text
//! # comment
//! BRAVE_API_KEY=abc123
//! export REDDIT_SUBREDDITS="LocalLLaMA,OpenAI"
//! QUOTED='literal $value'
//! ```
//!
//! - Blank lines and lines starting with `#` are ignored
//! - A leading `export ` is accepted and dropped
//! - Single-quoted values are literal
//! - Double-quoted values understand `\"`, `\\`, `\n` and `\t`
//! - Unquoted values are trimmed, and ` #...` trailing comments removed
//! - A later assignment to the same key wins
//!
//! Values are never included in error messages.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::EnvKey;

/// Errors from reading or parsing an environment file.
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("failed to read env file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Ordered assignments parsed from an environment file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: Vec<(EnvKey, String)>,
}

impl EnvFile {
    /// Read and parse `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist: a missing file is
    /// the normal case when credentials come from the inherited environment.
    pub fn load(path: &Path) -> Result<Option<Self>, EnvFileError> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|source| EnvFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path).map(Some)
    }

    /// Parse file contents. `origin` is only used in error messages.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, EnvFileError> {
        let mut entries: Vec<(EnvKey, String)> = Vec::new();

        for (idx, raw) in contents.lines().enumerate() {
            let malformed = |message: &str| EnvFileError::Malformed {
                path: origin.to_path_buf(),
                line: idx + 1,
                message: message.to_string(),
            };

            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line
                .strip_prefix("export ")
                .map(str::trim_start)
                .unwrap_or(line);

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| malformed("expected KEY=VALUE"))?;
            let key = EnvKey::new(key.trim_end())
                .map_err(|_| malformed("invalid variable name"))?;
            let value = parse_value(value).map_err(|m| malformed(m))?;

            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => existing.1 = value,
                None => entries.push((key, value)),
            }
        }

        Ok(Self { entries })
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate assignments in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&EnvKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_value(raw: &str) -> Result<String, &'static str> {
    let raw = raw.trim_start();

    if let Some(rest) = raw.strip_prefix('\'') {
        let end = rest.find('\'').ok_or("unterminated single quote")?;
        ensure_only_comment(&rest[end + 1..])?;
        return Ok(rest[..end].to_string());
    }

    if let Some(rest) = raw.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    ensure_only_comment(&rest[i + 1..])?;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, other)) => out.push(other),
                    None => return Err("unterminated double quote"),
                },
                other => out.push(other),
            }
        }
        return Err("unterminated double quote");
    }

    let value = match raw.find(" #") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    Ok(value.trim().to_string())
}

fn ensure_only_comment(trailing: &str) -> Result<(), &'static str> {
    let trailing = trailing.trim();
    if trailing.is_empty() || trailing.starts_with('#') {
        Ok(())
    } else {
        Err("unexpected text after closing quote")
    }
}
