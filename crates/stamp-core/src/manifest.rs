//! The generation index (`context_main.json`).
//!
//! Reading is gated on the `type` discriminator and `schemaVersion`: the
//! current version parses silently, older supported versions parse with a
//! compatibility diagnostic, anything else is a [`StampError::ManifestSchema`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{IoPurpose, Result, StampError};
use crate::runtime::Runtime;

pub const INDEX_TYPE: &str = "LogicStampIndex";
pub const INDEX_SCHEMA_VERSION: &str = "0.2";
/// Older schema versions that still parse.
pub const COMPATIBLE_SCHEMA_VERSIONS: &[&str] = &["0.1"];

pub const INDEX_FILE_NAME: &str = "context_main.json";
pub const CONTEXT_FILE_NAME: &str = "context.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    #[serde(default)]
    pub total_components: usize,
    pub total_bundles: usize,
    pub total_folders: usize,
    #[serde(default)]
    pub total_token_estimate: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    /// Project-relative folder, `.` for the root.
    pub path: String,
    /// Project-relative context file path.
    pub context_file: String,
    pub bundles: usize,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub token_estimate: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextIndex {
    #[serde(rename = "type")]
    pub index_type: String,
    pub schema_version: String,
    #[serde(default = "default_project_root")]
    pub project_root: String,
    #[serde(default)]
    pub created_at: String,
    pub summary: IndexSummary,
    pub folders: Vec<FolderEntry>,
    #[serde(default)]
    pub meta: IndexMeta,
}

fn default_project_root() -> String {
    ".".to_string()
}

impl ContextIndex {
    /// Folder entry by context file, compared case-insensitively.
    pub fn folder_by_context_file(&self, context_file: &str) -> Option<&FolderEntry> {
        let key = context_key(context_file);
        self.folders.iter().find(|f| context_key(&f.context_file) == key)
    }
}

/// Comparison key for a context file path.
pub fn context_key(path: &str) -> String {
    path.trim_start_matches("./").replace('\\', "/").to_lowercase()
}

/// Parse index JSON read from `path`, enforcing the schema gate.
pub fn parse_index(path: &Path, text: &str, diagnostics: &mut Diagnostics) -> Result<ContextIndex> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| StampError::json(path, IoPurpose::Index, source))?;

    let index_type = value.get("type").and_then(|v| v.as_str());
    if index_type != Some(INDEX_TYPE) {
        return Err(StampError::ManifestSchema {
            path: path.to_path_buf(),
            field: "type",
            expected: format!("\"{INDEX_TYPE}\""),
            actual: describe(value.get("type")),
        });
    }

    let version = value.get("schemaVersion").and_then(|v| v.as_str());
    match version {
        Some(INDEX_SCHEMA_VERSION) => {}
        Some(old) if COMPATIBLE_SCHEMA_VERSIONS.contains(&old) => {
            diagnostics.warn(
                DiagnosticKind::Compatibility,
                None,
                format!(
                    "{} uses index schema {old}; reading in compatibility mode (current is {INDEX_SCHEMA_VERSION})",
                    path.display()
                ),
            );
        }
        _ => {
            let mut supported = vec![INDEX_SCHEMA_VERSION];
            supported.extend_from_slice(COMPATIBLE_SCHEMA_VERSIONS);
            return Err(StampError::ManifestSchema {
                path: path.to_path_buf(),
                field: "schemaVersion",
                expected: supported.join(" or "),
                actual: describe(value.get("schemaVersion")),
            });
        }
    }

    serde_json::from_value(value).map_err(|source| StampError::json(path, IoPurpose::Index, source))
}

/// Read and parse an index through the runtime.
pub async fn load_index(
    runtime: &dyn Runtime,
    path: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<ContextIndex> {
    let bytes = runtime
        .read_file(path)
        .await
        .map_err(|err| StampError::read(path, IoPurpose::Index, err))?;
    let text = String::from_utf8_lossy(&bytes);
    parse_index(path, &text, diagnostics)
}

/// Whether JSON text should be read as an index rather than a bundle array.
///
/// Any top-level object qualifies, so that a wrong `type` is reported by
/// [`parse_index`] instead of as a malformed bundle array.
pub fn looks_like_index(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok_and(|v| v.is_object())
}

fn describe(value: Option<&serde_json::Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(value) => value.to_string(),
    }
}
