//! `stamp compare`: drift detection between two generations.
//!
//! Two indexes get a folder-by-folder comparison; two bundle arrays get a
//! single diff. Mixing the two is an argument error.

use std::path::Path;

use stamp_core::diff::parse_bundles;
use stamp_core::manifest::looks_like_index;
use stamp_core::{
    DiagnosticKind, Diagnostics, IoPurpose, NativeRuntime, Runtime, StampError, compare_indexes,
    diff_bundles,
};

use crate::cli::CompareArgs;
use crate::commands::Outcome;
use crate::error::{CliError, Result};
use crate::ui;

/// Execute `stamp compare`.
pub async fn execute(args: CompareArgs) -> Result<Outcome> {
    let runtime = NativeRuntime::new();
    let old_text = read_text(&runtime, &args.old, IoPurpose::OldFile).await?;
    let new_text = read_text(&runtime, &args.new, IoPurpose::NewFile).await?;

    match (looks_like_index(&old_text), looks_like_index(&new_text)) {
        (true, true) => compare_index_files(&runtime, &args).await,
        (false, false) => compare_bundle_files(&runtime, &args, &old_text, &new_text).await,
        _ => Err(CliError::InvalidArgument(format!(
            "cannot compare an index with a context file ({} vs {})\n\nHint: Pass two context_main.json files or two context.json files",
            args.old.display(),
            args.new.display()
        ))),
    }
}

async fn read_text(runtime: &dyn Runtime, path: &Path, purpose: IoPurpose) -> Result<String> {
    let bytes = runtime
        .read_file(path)
        .await
        .map_err(|err| StampError::read(path, purpose, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn compare_bundle_files(
    runtime: &dyn Runtime,
    args: &CompareArgs,
    old_text: &str,
    new_text: &str,
) -> Result<Outcome> {
    let old = parse_bundles(&args.old, old_text, IoPurpose::OldFile)?;
    let new = parse_bundles(&args.new, new_text, IoPurpose::NewFile)?;
    let result = diff_bundles(&old, &new);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", ui::render_diff(&result));
    }

    if result.is_pass() {
        return Ok(Outcome::Success);
    }
    if !args.approve {
        ui::error("Drift detected (rerun with --approve to accept it)");
        return Ok(Outcome::Drift);
    }

    runtime
        .write_file(&args.old, new_text.as_bytes())
        .await
        .map_err(|err| StampError::write(&args.old, IoPurpose::OldFile, err))?;
    ui::success(&format!("Drift approved: updated {}", args.old.display()));
    Ok(Outcome::Success)
}

async fn compare_index_files(runtime: &dyn Runtime, args: &CompareArgs) -> Result<Outcome> {
    let mut diagnostics = Diagnostics::new();
    let result = compare_indexes(runtime, &args.old, &args.new, &mut diagnostics).await?;
    for note in diagnostics.of_kind(DiagnosticKind::Compatibility) {
        ui::warning(&note.message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", ui::render_multi(&result));
    }

    if result.is_pass() {
        return Ok(Outcome::Success);
    }
    if !args.approve {
        ui::error("Drift detected (rerun with --approve to accept it)");
        return Ok(Outcome::Drift);
    }

    let old_dir = args.old.parent().unwrap_or_else(|| Path::new(""));
    for context_file in &result.orphaned_on_disk {
        let path = old_dir.join(context_file);
        runtime
            .remove_file(&path)
            .await
            .map_err(|err| StampError::io(&path, IoPurpose::ContextFile, "remove", err))?;
        tracing::debug!(path = %path.display(), "Removed orphaned context file");
    }
    let removed = result.orphaned_on_disk.len();
    if removed > 0 {
        ui::success(&format!("Drift approved: removed {removed} orphaned context files"));
    } else {
        ui::success("Drift approved");
    }
    Ok(Outcome::Success)
}
