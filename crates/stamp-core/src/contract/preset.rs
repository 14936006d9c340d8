//! Signature presets: which interface fields a contract keeps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{EmitSpec, PropSpec};

const NAV_MARKERS: &[&str] = &["href", "to", "link", "route", "navigate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    None,
    SubmitOnly,
    NavOnly,
    DisplayOnly,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::None,
        Preset::SubmitOnly,
        Preset::NavOnly,
        Preset::DisplayOnly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::None => "none",
            Preset::SubmitOnly => "submit-only",
            Preset::NavOnly => "nav-only",
            Preset::DisplayOnly => "display-only",
        }
    }

    /// Filter props and emits in place.
    pub fn apply(
        self,
        props: &mut BTreeMap<String, PropSpec>,
        emits: &mut BTreeMap<String, EmitSpec>,
    ) {
        match self {
            Preset::None => {}
            Preset::SubmitOnly => {
                props.clear();
                emits.retain(|name, _| name.to_ascii_lowercase().contains("submit"));
            }
            Preset::NavOnly => {
                props.retain(|name, _| is_nav_name(name));
                emits.retain(|name, _| is_nav_name(name));
            }
            Preset::DisplayOnly => emits.clear(),
        }
    }
}

fn is_nav_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    NAV_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| {
                format!("unknown preset '{s}', expected one of: none, submit-only, nav-only, display-only")
            })
    }
}
