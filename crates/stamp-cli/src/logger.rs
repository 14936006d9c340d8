//! Logging setup for the `stamp` binary.
//!
//! `stamp-core` only emits `tracing` events; this module installs the
//! subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use stamp_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Scanning project");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "stamp=debug,stamp_core=debug,stamp_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "stamp=info,stamp_core=info,stamp_cli=info";

/// Install the global tracing subscriber.
///
/// Filter precedence:
/// 1. `--verbose`: debug for the stamp crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG`
/// 4. info for the stamp crates
///
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Install the subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    // try_init: tests may call this more than once per process
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
