//! Configuration for `stamp context`, loaded from several sources.
//!
//! Priority: CLI flags > `STAMP_*` environment > `stamp.config.json` > defaults

mod defaults;
mod loading;
mod tests;
mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use stamp_core::{Budget, ContextOptions, ExtractOptions};

use crate::cli::{CodeMode, PresetName};

pub use defaults::*;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "stamp.config.json";

/// stamp configuration, loaded from stamp.config.json, environment and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StampConfig {
    /// Maximum dependency hops from each bundle entry
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Maximum nodes per bundle (at least 1)
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Source text carried by each bundle node
    #[serde(default)]
    pub include_code: CodeMode,

    /// Interaction-style filter for props and emits
    #[serde(default)]
    pub preset: PresetName,

    /// Fail on unresolved component dependencies
    #[serde(default)]
    pub strict_missing: bool,

    /// Output directory, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    /// Maximum number of files read concurrently (at least 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Folder names whose files are command-line entry points
    #[serde(default = "default_cli_dirs")]
    pub cli_dirs: Vec<String>,

    /// File extensions to scan, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Secret-scan report, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_report: Option<PathBuf>,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            max_nodes: default_max_nodes(),
            include_code: CodeMode::default(),
            preset: PresetName::default(),
            strict_missing: false,
            out_dir: None,
            concurrency: default_concurrency(),
            cli_dirs: default_cli_dirs(),
            extensions: default_extensions(),
            secrets_report: None,
        }
    }
}

impl StampConfig {
    /// JSON Schema for stamp.config.json.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(StampConfig)).unwrap_or_default()
    }

    /// Pipeline options described by this configuration.
    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            budget: Budget {
                depth: self.depth,
                max_nodes: self.max_nodes,
                include_code: self.include_code.into(),
            },
            preset: self.preset.into(),
            strict_missing: self.strict_missing,
            concurrency: self.concurrency,
            extract: ExtractOptions {
                cli_dirs: self.cli_dirs.clone(),
            },
            created_at: None,
        }
    }
}
