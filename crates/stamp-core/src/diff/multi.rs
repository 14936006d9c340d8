//! Folder-level comparison of two generation indexes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DiffResult, DiffStatus, compare_files};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::manifest::{ContextIndex, FolderEntry, context_key, load_index};
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FolderStatus {
    Pass,
    Drift,
    Added,
    Orphaned,
}

impl FolderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FolderStatus::Pass => "PASS",
            FolderStatus::Drift => "DRIFT",
            FolderStatus::Added => "ADDED",
            FolderStatus::Orphaned => "ORPHANED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCompare {
    pub folder_path: String,
    pub context_file: String,
    pub status: FolderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffResult>,
    /// Declared bundle count, for folders present on one side only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundles: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_delta: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFileSummary {
    pub total_folders: usize,
    pub pass_folders: usize,
    pub drift_folders: usize,
    pub added_folders: usize,
    pub orphaned_folders: usize,
    pub components_added: usize,
    pub components_removed: usize,
    pub components_changed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFileCompareResult {
    pub status: DiffStatus,
    pub folders: Vec<FolderCompare>,
    pub summary: MultiFileSummary,
    /// Context files of the old index, absent from the new one, that still
    /// exist next to the old index.
    pub orphaned_on_disk: Vec<String>,
}

impl MultiFileCompareResult {
    pub fn is_pass(&self) -> bool {
        self.status == DiffStatus::Pass
    }
}

fn base_dir(index_path: &Path) -> PathBuf {
    index_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn token_delta(old: &FolderEntry, new: &FolderEntry) -> i64 {
    let to_i64 = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
    to_i64(new.token_estimate) - to_i64(old.token_estimate)
}

/// Compare two indexes folder by folder.
///
/// Context files are resolved relative to the directory of the index that
/// references them. Any load failure aborts the whole comparison.
pub async fn compare_indexes(
    runtime: &dyn Runtime,
    old_index: &Path,
    new_index: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<MultiFileCompareResult> {
    let old = load_index(runtime, old_index, diagnostics).await?;
    let new = load_index(runtime, new_index, diagnostics).await?;
    let old_base = base_dir(old_index);
    let new_base = base_dir(new_index);
    compare_loaded(runtime, &old, &old_base, &new, &new_base).await
}

async fn compare_loaded(
    runtime: &dyn Runtime,
    old: &ContextIndex,
    old_base: &Path,
    new: &ContextIndex,
    new_base: &Path,
) -> Result<MultiFileCompareResult> {
    let mut pairs: BTreeMap<String, (Option<&FolderEntry>, Option<&FolderEntry>)> = BTreeMap::new();
    for folder in &old.folders {
        pairs.entry(context_key(&folder.context_file)).or_default().0 = Some(folder);
    }
    for folder in &new.folders {
        pairs.entry(context_key(&folder.context_file)).or_default().1 = Some(folder);
    }

    let mut folders = Vec::with_capacity(pairs.len());
    let mut summary = MultiFileSummary::default();
    let mut orphaned_on_disk = Vec::new();

    for (old_folder, new_folder) in pairs.into_values() {
        let compare = match (old_folder, new_folder) {
            (Some(old_folder), Some(new_folder)) => {
                let diff = compare_files(
                    runtime,
                    &old_base.join(&old_folder.context_file),
                    &new_base.join(&new_folder.context_file),
                )
                .await?;
                summary.components_added += diff.added.len();
                summary.components_removed += diff.removed.len();
                summary.components_changed += diff.changed.len();
                let status = match diff.status {
                    DiffStatus::Pass => FolderStatus::Pass,
                    DiffStatus::Drift => FolderStatus::Drift,
                };
                FolderCompare {
                    folder_path: new_folder.path.clone(),
                    context_file: new_folder.context_file.clone(),
                    status,
                    diff: Some(diff),
                    bundles: None,
                    token_delta: Some(token_delta(old_folder, new_folder)),
                }
            }
            (None, Some(new_folder)) => {
                summary.components_added += new_folder.bundles;
                FolderCompare {
                    folder_path: new_folder.path.clone(),
                    context_file: new_folder.context_file.clone(),
                    status: FolderStatus::Added,
                    diff: None,
                    bundles: Some(new_folder.bundles),
                    token_delta: None,
                }
            }
            (Some(old_folder), None) => {
                summary.components_removed += old_folder.bundles;
                if runtime.exists(&old_base.join(&old_folder.context_file)) {
                    orphaned_on_disk.push(old_folder.context_file.clone());
                }
                FolderCompare {
                    folder_path: old_folder.path.clone(),
                    context_file: old_folder.context_file.clone(),
                    status: FolderStatus::Orphaned,
                    diff: None,
                    bundles: Some(old_folder.bundles),
                    token_delta: None,
                }
            }
            (None, None) => continue,
        };
        match compare.status {
            FolderStatus::Pass => summary.pass_folders += 1,
            FolderStatus::Drift => summary.drift_folders += 1,
            FolderStatus::Added => summary.added_folders += 1,
            FolderStatus::Orphaned => summary.orphaned_folders += 1,
        }
        folders.push(compare);
    }

    summary.total_folders = folders.len();
    let status = if folders.iter().all(|f| f.status == FolderStatus::Pass) {
        DiffStatus::Pass
    } else {
        DiffStatus::Drift
    };
    tracing::info!(
        status = %status,
        folders = summary.total_folders,
        drift = summary.drift_folders,
        added = summary.added_folders,
        orphaned = summary.orphaned_folders,
        "index comparison finished"
    );

    Ok(MultiFileCompareResult {
        status,
        folders,
        summary,
        orphaned_on_disk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_uppercase() {
        let value = serde_json::to_value(FolderStatus::Orphaned).unwrap();
        assert_eq!(value, serde_json::Value::from("ORPHANED"));
        assert_eq!(FolderStatus::Added.as_str(), "ADDED");
    }

    #[test]
    fn token_delta_is_signed() {
        let entry = |tokens| FolderEntry {
            path: "src".into(),
            context_file: "src/context.json".into(),
            bundles: 1,
            components: vec![],
            is_root: false,
            token_estimate: tokens,
        };
        assert_eq!(token_delta(&entry(100), &entry(40)), -60);
        assert_eq!(token_delta(&entry(0), &entry(7)), 7);
    }

    #[test]
    fn base_dir_of_bare_file_is_empty() {
        assert_eq!(base_dir(Path::new("context_main.json")), PathBuf::new());
        assert_eq!(base_dir(Path::new("out/context_main.json")), PathBuf::from("out"));
    }
}
