//! `stamp context`: scan, generate and write context files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stamp_core::bundle::SecretReport;
use stamp_core::{
    CharRatioEstimator, DiagnosticKind, Diagnostics, IoPurpose, NativeRuntime, Runtime, StampError,
    generate_context, write_context,
};

use crate::cli::ContextArgs;
use crate::commands::Outcome;
use crate::commands::scan::scan;
use crate::config::StampConfig;
use crate::error::Result;
use crate::ui;

/// Execute `stamp context`.
pub async fn execute(args: ContextArgs) -> Result<Outcome> {
    let config = StampConfig::load(&args)?;
    let root = args.root.as_path();
    let runtime = NativeRuntime::new();

    let files = scan(root, &config.extensions)?;
    if files.is_empty() {
        ui::warning(&format!("No source files found under {}", root.display()));
    }

    let secrets = match &config.secrets_report {
        Some(path) => Some(load_secrets(&runtime, &root.join(path)).await?),
        None => None,
    };
    let out_dir = output_dir(root, &config);

    let spinner = ui::Spinner::new(&format!("Generating context for {} files...", files.len()));
    let mut diagnostics = Diagnostics::new();
    let generated = generate_context(
        Arc::new(runtime),
        files,
        &config.context_options(),
        secrets.as_ref(),
        &CharRatioEstimator::default(),
        &mut diagnostics,
    )
    .await;
    let output = match generated {
        Ok(output) => output,
        Err(err) => {
            spinner.fail("Context generation failed");
            return Err(err.into());
        }
    };

    spinner.set_message("Writing context files...");
    let written = match write_context(&runtime, &out_dir, &output).await {
        Ok(written) => written,
        Err(err) => {
            spinner.fail("Writing context files failed");
            return Err(err.into());
        }
    };
    spinner.finish(&format!(
        "Wrote {} context files and {}",
        written.len().saturating_sub(1),
        stamp_core::manifest::INDEX_FILE_NAME
    ));

    eprint!("{}", ui::render_context_summary(&output.index));
    report_diagnostics(&diagnostics);
    Ok(Outcome::Success)
}

/// Where context files go: `outDir` relative to the root, or the root.
fn output_dir(root: &Path, config: &StampConfig) -> PathBuf {
    match &config.out_dir {
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    }
}

async fn load_secrets(runtime: &dyn Runtime, path: &Path) -> Result<SecretReport> {
    let bytes = runtime
        .read_file(path)
        .await
        .map_err(|err| StampError::read(path, IoPurpose::SecretReport, err))?;
    let text = String::from_utf8_lossy(&bytes);
    let report = SecretReport::from_json(&text)
        .map_err(|err| StampError::json(path, IoPurpose::SecretReport, err))?;
    Ok(report)
}

fn kind_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::Parse => "unparsable files",
        DiagnosticKind::Contract => "contract failures",
        DiagnosticKind::MalformedContract => "malformed contracts",
        DiagnosticKind::MissingDependency => "bundles with missing dependencies",
        DiagnosticKind::Compatibility => "compatibility notes",
        DiagnosticKind::Io => "read failures",
    }
}

fn report_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for diagnostic in diagnostics.iter() {
        *counts.entry(kind_label(diagnostic.kind)).or_default() += 1;
    }
    let parts: Vec<String> = counts
        .iter()
        .map(|(label, count)| format!("{count} {label}"))
        .collect();
    ui::warning(&format!(
        "{} warnings: {} (run with --verbose for details)",
        diagnostics.len(),
        parts.join(", ")
    ));
}
