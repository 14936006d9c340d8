//! Command implementations for the `stamp` CLI.
//!
//! - [`context`] - scan a project and write context files plus the index
//! - [`compare`] - diff two generations and optionally approve the drift
//! - [`schema`] - print the config JSON schema
//!
//! Each command exposes an `execute` function returning an [`Outcome`].

pub mod compare;
pub mod context;
pub mod scan;
pub mod schema;

use std::process::ExitCode;

pub use compare::execute as compare_execute;
pub use context::execute as context_execute;
pub use schema::execute as schema_execute;

/// Exit status for unapproved drift.
pub const EXIT_DRIFT: u8 = 1;
/// Exit status for operational errors.
pub const EXIT_ERROR: u8 = 2;

/// How a successful command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed; for compare, no drift or drift that was approved.
    Success,
    /// Compare found drift and it was not approved.
    Drift,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Drift => ExitCode::from(EXIT_DRIFT),
        }
    }
}
