use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stamp_core::{CodeInclusion, Preset};

/// How much source text a bundle node carries
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CodeMode {
    /// Contracts only
    #[value(name = "none")]
    None,

    /// Leading comments and imports
    #[default]
    #[value(name = "header")]
    Header,

    /// The whole file
    #[value(name = "full")]
    Full,
}

/// Interaction-style filter applied to props and emits
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    /// Keep everything
    #[default]
    #[value(name = "none")]
    None,

    /// Only submit-style events
    #[value(name = "submit-only")]
    SubmitOnly,

    /// Only navigation props and events
    #[value(name = "nav-only")]
    NavOnly,

    /// Props only, no events
    #[value(name = "display-only")]
    DisplayOnly,
}

impl From<CodeMode> for CodeInclusion {
    fn from(mode: CodeMode) -> Self {
        match mode {
            CodeMode::None => CodeInclusion::None,
            CodeMode::Header => CodeInclusion::Header,
            CodeMode::Full => CodeInclusion::Full,
        }
    }
}

impl From<PresetName> for Preset {
    fn from(name: PresetName) -> Self {
        match name {
            PresetName::None => Preset::None,
            PresetName::SubmitOnly => Preset::SubmitOnly,
            PresetName::NavOnly => Preset::NavOnly,
            PresetName::DisplayOnly => Preset::DisplayOnly,
        }
    }
}
