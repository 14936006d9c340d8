//! Terminal output: status messages, a spinner and compare reports.
//!
//! Status messages and the spinner go to stderr so that stdout carries only
//! the report (or JSON) a script might capture.
//!
//! ```no_run
//! use stamp_cli::ui;
//!
//! ui::init_colors(false);
//! let spinner = ui::Spinner::new("Scanning project...");
//! spinner.finish("Found 42 files");
//! ui::warning("2 files could not be parsed");
//! ```

mod messages;
mod report;
mod spinner;

pub use messages::{error, info, success, warning};
pub use report::{render_context_summary, render_diff, render_multi};
pub use spinner::Spinner;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise stderr must be a terminal.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    console::user_attended_stderr()
}

/// Initialize color support from the environment and the `--no-color` flag.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}
