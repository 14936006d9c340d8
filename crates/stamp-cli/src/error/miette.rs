//! Miette diagnostic conversion for CLI errors.

use miette::Report;
use stamp_core::{IoFailure, StampError};

use crate::error::CliError;

/// Install the miette report handler.
///
/// Lines are never wrapped so paths in messages stay intact.
pub fn install_hook(no_color: bool) {
    let _ = miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .wrap_lines(false)
                .color(!no_color)
                .build(),
        )
    }));
}

/// Convert a `CliError` into a miette report for the process edge.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Core(e) => core_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert a `StampError` into a report with a variant-specific hint.
pub fn core_error_to_miette(err: StampError) -> Report {
    match &err {
        StampError::Io {
            failure: IoFailure::NotFound,
            ..
        } => miette::miette!(
            "{}\n\nHint: Check the path, or run 'stamp context' to generate it",
            err
        ),
        StampError::ManifestSchema { .. } => miette::miette!(
            "{}\n\nHint: Regenerate the index with this version of stamp",
            err
        ),
        StampError::MissingDependencies { .. } => miette::miette!(
            "{}\n\nHint: Add the missing components or rerun without --strict-missing",
            err
        ),
        StampError::Json { .. } => miette::miette!(
            "{}\n\nHint: The file is not a stamp artifact or was edited by hand",
            err
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn not_found_gets_generation_hint() {
        let err = StampError::Io {
            path: PathBuf::from("context_main.json"),
            purpose: stamp_core::IoPurpose::Index,
            action: "read",
            failure: IoFailure::NotFound,
        };
        let report = cli_error_to_miette(err.into());
        let text = report.to_string();
        assert!(text.contains("context_main.json"));
        assert!(text.contains("stamp context"));
    }

    #[test]
    fn schema_mismatch_gets_regenerate_hint() {
        let err = StampError::ManifestSchema {
            path: PathBuf::from("context_main.json"),
            field: "schemaVersion",
            expected: "0.2 or 0.1".into(),
            actual: "\"9.0\"".into(),
        };
        let text = cli_error_to_miette(err.into()).to_string();
        assert!(text.contains("expected 0.2 or 0.1"));
        assert!(text.contains("Regenerate"));
    }
}
