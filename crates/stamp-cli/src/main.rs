//! LogicStamp CLI entry point.
//!
//! Parses arguments, installs logging and dispatches to a command. Exit
//! status: 0 for success (including approved drift), 1 for unapproved drift,
//! 2 for any operational error.

use std::process::ExitCode;

use clap::Parser;
use stamp_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);
    error::install_hook(args.no_color);

    let result = match args.command {
        cli::Command::Context(context_args) => commands::context_execute(context_args).await,
        cli::Command::Compare(compare_args) => commands::compare_execute(compare_args).await,
        cli::Command::Schema => commands::schema_execute(),
    };

    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("{:?}", error::cli_error_to_miette(err));
            ExitCode::from(commands::EXIT_ERROR)
        }
    }
}
