//! Human-readable compare and context reports.
//!
//! Renderers return strings; commands decide where to print them.

use std::fmt::Write as _;

use console::style;
use stamp_core::diff::{Delta, FolderCompare};
use stamp_core::manifest::ContextIndex;
use stamp_core::{DiffResult, DiffStatus, FolderStatus, MultiFileCompareResult};

fn status_label(status: DiffStatus) -> String {
    match status {
        DiffStatus::Pass => style("PASS").green().bold().to_string(),
        DiffStatus::Drift => style("DRIFT").yellow().bold().to_string(),
    }
}

fn folder_label(status: FolderStatus) -> String {
    let text = format!("{:<9}", status.as_str());
    match status {
        FolderStatus::Pass => style(text).green().to_string(),
        FolderStatus::Drift => style(text).yellow().to_string(),
        FolderStatus::Added => style(text).cyan().to_string(),
        FolderStatus::Orphaned => style(text).red().to_string(),
    }
}

fn write_delta(out: &mut String, indent: &str, delta: &Delta) {
    let _ = writeln!(out, "{indent}{}", style(delta.delta_type.as_str()).bold());
    let _ = writeln!(out, "{indent}  - {}", delta.old);
    let _ = writeln!(out, "{indent}  + {}", delta.new);
}

fn write_entries(out: &mut String, indent: &str, result: &DiffResult) {
    for id in &result.added {
        let _ = writeln!(out, "{indent}{} {id}", style("+").green());
    }
    for id in &result.removed {
        let _ = writeln!(out, "{indent}{} {id}", style("-").red());
    }
    for entry in &result.changed {
        let _ = writeln!(out, "{indent}{} {}", style("~").yellow(), entry.id);
        let nested = format!("{indent}    ");
        for delta in &entry.deltas {
            write_delta(out, &nested, delta);
        }
    }
}

/// Report for a two-file bundle comparison.
pub fn render_diff(result: &DiffResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", status_label(result.status));
    if result.is_pass() {
        let _ = writeln!(out, "No drift detected.");
        return out;
    }
    let _ = writeln!(
        out,
        "Drift detected: {} added, {} removed, {} changed",
        result.added.len(),
        result.removed.len(),
        result.changed.len()
    );
    write_entries(&mut out, "  ", result);
    out
}

fn write_folder(out: &mut String, folder: &FolderCompare) {
    let mut line = format!("  {} {}", folder_label(folder.status), folder.folder_path);
    match folder.status {
        FolderStatus::Added | FolderStatus::Orphaned => {
            if let Some(bundles) = folder.bundles {
                let _ = write!(line, " ({bundles} bundles)");
            }
        }
        FolderStatus::Drift => {
            if let Some(delta) = folder.token_delta.filter(|d| *d != 0) {
                let _ = write!(line, " ({delta:+} tokens)");
            }
        }
        FolderStatus::Pass => {}
    }
    let _ = writeln!(out, "{line}");
    if let Some(diff) = folder.diff.as_ref().filter(|d| !d.is_pass()) {
        write_entries(out, "      ", diff);
    }
}

/// Report for an index-to-index comparison.
pub fn render_multi(result: &MultiFileCompareResult) -> String {
    let summary = &result.summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} folders: {} pass, {} drift, {} added, {} orphaned",
        status_label(result.status),
        summary.total_folders,
        summary.pass_folders,
        summary.drift_folders,
        summary.added_folders,
        summary.orphaned_folders
    );
    for folder in &result.folders {
        write_folder(&mut out, folder);
    }
    if !result.is_pass() {
        let _ = writeln!(
            out,
            "Components: {} added, {} removed, {} changed",
            summary.components_added, summary.components_removed, summary.components_changed
        );
    }
    if !result.orphaned_on_disk.is_empty() {
        let _ = writeln!(out, "Orphaned context files still on disk:");
        for path in &result.orphaned_on_disk {
            let _ = writeln!(out, "  {path}");
        }
    }
    out
}

/// Per-folder table printed after `stamp context`.
pub fn render_context_summary(index: &ContextIndex) -> String {
    let mut out = String::new();
    for folder in &index.folders {
        let root = if folder.is_root { " (root)" } else { "" };
        let _ = writeln!(
            out,
            "  {:<40} {:>3} bundles  ~{} tokens{root}",
            folder.context_file, folder.bundles, folder.token_estimate
        );
    }
    let summary = &index.summary;
    let _ = writeln!(
        out,
        "  {} components, {} bundles, {} folders, ~{} tokens",
        summary.total_components, summary.total_bundles, summary.total_folders, summary.total_token_estimate
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stamp_core::diff::{ChangedEntry, DeltaType, MultiFileSummary};

    fn drift() -> DiffResult {
        DiffResult {
            status: DiffStatus::Drift,
            added: vec!["src/New.tsx".into()],
            removed: vec![],
            changed: vec![ChangedEntry {
                id: "src/Card.tsx".into(),
                deltas: vec![Delta {
                    delta_type: DeltaType::Props,
                    old: json!({}),
                    new: json!({"title": "string"}),
                }],
            }],
        }
    }

    #[test]
    fn pass_report_is_short() {
        console::set_colors_enabled(false);
        let pass = DiffResult {
            status: DiffStatus::Pass,
            added: vec![],
            removed: vec![],
            changed: vec![],
        };
        assert_eq!(render_diff(&pass), "PASS\nNo drift detected.\n");
    }

    #[test]
    fn drift_report_lists_entries_and_deltas() {
        console::set_colors_enabled(false);
        let text = render_diff(&drift());
        assert!(text.starts_with("DRIFT\n"));
        assert!(text.contains("1 added, 0 removed, 1 changed"));
        assert!(text.contains("+ src/New.tsx"));
        assert!(text.contains("~ src/Card.tsx"));
        assert!(text.contains("props"));
        assert!(text.contains(r#"+ {"title":"string"}"#));
    }

    #[test]
    fn multi_report_shows_folder_statuses() {
        console::set_colors_enabled(false);
        let result = MultiFileCompareResult {
            status: DiffStatus::Drift,
            folders: vec![
                FolderCompare {
                    folder_path: "src".into(),
                    context_file: "src/context.json".into(),
                    status: FolderStatus::Drift,
                    diff: Some(drift()),
                    bundles: None,
                    token_delta: Some(12),
                },
                FolderCompare {
                    folder_path: "src/old".into(),
                    context_file: "src/old/context.json".into(),
                    status: FolderStatus::Orphaned,
                    diff: None,
                    bundles: Some(2),
                    token_delta: None,
                },
            ],
            summary: MultiFileSummary {
                total_folders: 2,
                pass_folders: 0,
                drift_folders: 1,
                added_folders: 0,
                orphaned_folders: 1,
                components_added: 1,
                components_removed: 2,
                components_changed: 1,
            },
            orphaned_on_disk: vec!["src/old/context.json".into()],
        };
        let text = render_multi(&result);
        assert!(text.starts_with("DRIFT 2 folders: 0 pass, 1 drift, 0 added, 1 orphaned"));
        assert!(text.contains("DRIFT     src (+12 tokens)"));
        assert!(text.contains("ORPHANED  src/old (2 bundles)"));
        assert!(text.contains("Components: 1 added, 2 removed, 1 changed"));
        assert!(text.contains("Orphaned context files still on disk:\n  src/old/context.json"));
    }
}
