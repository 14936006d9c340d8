//! LogicStamp CLI - structured, drift-checked context for TypeScript projects.
//!
//! This crate is the command layer over `stamp-core`: argument parsing,
//! layered configuration, logging setup, the project file scanner and
//! terminal reporting.
//!
//! # Architecture
//!
//! - [`cli`] - clap definitions for `stamp context`, `stamp compare` and `stamp schema`
//! - [`commands`] - command implementations returning an [`commands::Outcome`]
//! - [`config`] - `stamp.config.json` loading and validation
//! - [`error`] - CLI error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages, spinner and compare reports
//!
//! # Example
//!
//! ```rust
//! use stamp_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
