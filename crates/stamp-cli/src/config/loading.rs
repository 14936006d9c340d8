use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::{CodeMode, ContextArgs, PresetName};
use crate::config::{CONFIG_FILE_NAME, StampConfig};
use crate::error::{ConfigError, Result};

/// Flags given on the command line; unset flags do not override lower layers.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_code: Option<CodeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<PresetName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strict_missing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secrets_report: Option<PathBuf>,
}

impl From<&ContextArgs> for ConfigOverrides {
    fn from(args: &ContextArgs) -> Self {
        Self {
            depth: args.depth,
            max_nodes: args.max_nodes,
            include_code: args.include_code,
            preset: args.preset,
            strict_missing: args.strict_missing.then_some(true),
            out_dir: args.out.clone(),
            concurrency: args.concurrency,
            secrets_report: args.secrets_report.clone(),
        }
    }
}

/// `MAX_NODES` -> `maxNodes`
pub(crate) fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, part) in key.split('_').filter(|p| !p.is_empty()).enumerate() {
        let lower = part.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

impl StampConfig {
    /// Load configuration for `stamp context`.
    ///
    /// Priority: CLI flags > `STAMP_*` environment > config file > defaults.
    /// An explicit `--config` must exist; the default `ROOT/stamp.config.json`
    /// is optional.
    pub fn load(args: &ContextArgs) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match &args.config {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.clone()).into()),
            Some(path) => Some(path.clone()),
            None => {
                let default_path = args.root.join(CONFIG_FILE_NAME);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Json::file(path));
        }

        // STAMP_MAX_NODES=5 -> maxNodes
        figment = figment.merge(
            Env::prefixed("STAMP_")
                .map(|key| camel_case(key.as_str()).into())
                .lowercase(false),
        );

        figment = figment.merge(Serialized::defaults(ConfigOverrides::from(args)));

        let config: Self = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: "configuration".to_string(),
            value: e.to_string(),
            hint: format!("Check {CONFIG_FILE_NAME} syntax and field types"),
        })?;
        config.validate()?;
        Ok(config)
    }
}
