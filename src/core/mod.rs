//! core
//!
//! Domain types, settings, and the filesystem primitives of the pipeline.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Zone, Timestamp, EnvKey, GitName
//! - [`paths`] - Centralized path routing under the pipeline root
//! - [`lock`] - Exclusive, non-blocking run lock
//! - [`env_file`] - Credentials file parser
//! - [`environment`] - Immutable run environment
//! - [`config`] - Settings schema and resolution
//! - [`runlog`] - Append-only outcome and capture logs
//!
//! # Design Principles
//!
//! - Strong typing rejects bad settings at load time
//! - Nothing in core mutates the process environment
//! - Every path is computed in one place

pub mod config;
pub mod env_file;
pub mod environment;
pub mod lock;
pub mod paths;
pub mod runlog;
pub mod types;
