//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--root <DIR>`: Pipeline root (default: found from the executable)
//! - `--env-file <FILE>`: Credentials file (default: `~/.openclaw/.env`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Errors only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Publish the AI daily intel site: sync, generate, commit, push
#[derive(Parser, Debug)]
#[command(name = "intelpub")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
With no command, performs one publish run (same as `intelpub run`).

EXIT CODES:
    0   published, nothing to publish, or another run holds the lock
    2   a required credential is missing
    *   generator failure (the generator's own code) or any other error (1)")]
pub struct Cli {
    /// Pipeline root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Environment file holding credentials
    #[arg(long, global = true, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Perform one publish run (the default)
    #[command(
        long_about = "Perform one publish run.\n\n\
            Takes the run lock, checks credentials, pulls with rebase, runs the \
            generator, and commits and pushes the output directory if anything \
            changed. Meant to be triggered by a scheduler; overlapping runs skip.",
        after_help = "\
EXAMPLES:
    # Hourly from cron
    0 * * * * /srv/site/bin/intelpub --quiet

    # By hand, with step detail
    intelpub run --debug"
    )]
    Run,

    /// Show lock state, credentials, unpushed commits, and recent runs
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Number of recent runs to show
        #[arg(long, short = 'n', default_value_t = 10, value_name = "N")]
        lines: usize,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_command_means_run() {
        let cli = Cli::try_parse_from(["intelpub"]).unwrap();
        assert_eq!(cli.command, None);
        assert!(!cli.debug && !cli.quiet);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "intelpub",
            "status",
            "--json",
            "--root",
            "/srv/site",
            "--env-file",
            "/etc/intel.env",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Status {
                json: true,
                lines: 10
            })
        );
        assert_eq!(cli.root, Some(PathBuf::from("/srv/site")));
        assert_eq!(cli.env_file, Some(PathBuf::from("/etc/intel.env")));
    }

    #[test]
    fn completion_requires_known_shell() {
        assert!(Cli::try_parse_from(["intelpub", "completion", "bash"]).is_ok());
        assert!(Cli::try_parse_from(["intelpub", "completion", "tcsh"]).is_err());
    }
}
