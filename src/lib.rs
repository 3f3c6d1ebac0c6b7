//! intelpub - Publisher for the AI daily intel static site
//!
//! intelpub is a single binary meant to be run on a schedule. Each run
//! takes an exclusive lock, loads credentials, rebases onto the remote,
//! runs the external site generator, and commits and pushes the output
//! directory only when its content changed.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`engine`] - The publish pipeline and its step semantics
//! - [`core`] - Paths, settings, credentials, the run lock, and logs
//! - [`git`] - Version control: `git` binary for mutations, `git2` for queries
//! - [`generator`] - The external generator subprocess
//! - [`process`] - Subprocess execution with captured output
//! - [`ui`] - Terminal output
//!
//! # Invariants
//!
//! 1. At most one run executes the pipeline body at a time
//! 2. The process environment is never modified; subprocesses get the
//!    run environment explicitly
//! 3. A run whose output matches `HEAD` changes nothing in git

pub mod cli;
pub mod core;
pub mod engine;
pub mod generator;
pub mod git;
pub mod process;
pub mod ui;
