//! ui::output
//!
//! Verbosity-aware printing.
//!
//! Errors are always shown. Everything else is suppressed by `--quiet`.

use std::fmt::Display;

use crate::engine::RunReport;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Run summary and warnings.
    #[default]
    Normal,
    /// Also step-level detail.
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print to stdout unless quiet.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print to stderr in debug mode only.
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error to stderr. Always shown.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning to stderr unless quiet.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Indent each item under a heading line.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a finished run: the outcome, recovered failures as warnings, and
/// in debug mode the committed files.
pub fn report(report: &RunReport, verbosity: Verbosity) {
    for recovered in &report.recovered {
        warn(
            format!("{} failed, continued: {}", recovered.step, recovered.message),
            verbosity,
        );
    }
    print(&report.outcome, verbosity);
    if let crate::engine::RunOutcome::Published { files, .. } = &report.outcome {
        let shown: Vec<_> = files.iter().map(|f| f.display()).collect();
        debug(format!("committed:\n{}", format_list(&shown, "  ")), verbosity);
    }
}
