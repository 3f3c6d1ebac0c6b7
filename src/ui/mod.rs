//! ui
//!
//! Terminal output.
//!
//! The publisher usually runs unattended, so stdout stays quiet unless
//! someone is watching: outcomes go to `logs/cron.log`, and the terminal
//! only sees summaries, warnings, and fatal errors.

pub mod output;
