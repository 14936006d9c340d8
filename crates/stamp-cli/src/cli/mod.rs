//! Command-line interface definition for `stamp`.
//!
//! # Command Structure
//!
//! - `stamp context [ROOT]` - generate per-folder context files and the index
//! - `stamp compare <OLD> <NEW>` - detect drift between two generations
//! - `stamp schema` - print the JSON schema of `stamp.config.json`

mod commands;
pub mod enums;

use clap::Parser;

pub use commands::{Command, CompareArgs, ContextArgs};
pub use enums::*;

/// LogicStamp - structured, drift-checked context for TypeScript projects
#[derive(Parser, Debug)]
#[command(
    name = "stamp",
    version,
    about = "Structured, drift-checked context for TypeScript projects",
    long_about = "stamp extracts a contract for every component and module of a project,\n\
                  links them into a dependency graph and packs bounded bundles per folder.\n\
                  Two generations can be compared to detect semantic drift."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
