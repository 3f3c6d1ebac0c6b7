//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler resolves what it needs from the [`Context`], calls into
//! the library, and formats the result. Handlers return the process exit
//! code; an `Err` is reported by `main` and exits 1.

mod completion;
mod run;
mod status;

pub use completion::completion;
pub use run::run;
pub use status::{status, StatusReport};

use std::process::ExitCode;

use anyhow::Result;

use super::{Command, Context};

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Run => run(ctx),
        Command::Status { json, lines } => status(ctx, json, lines),
        Command::Completion { shell } => completion(shell).map(|()| ExitCode::SUCCESS),
    }
}
