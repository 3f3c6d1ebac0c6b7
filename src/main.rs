//! intelpub binary entry point.

use std::process::ExitCode;

use intelpub::ui::output;

fn main() -> ExitCode {
    match intelpub::cli::run() {
        Ok(code) => code,
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
