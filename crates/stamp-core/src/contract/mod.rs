//! Contracts: the stable, hashable shape of one source file.

pub mod hash;
mod preset;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry_id::EntryId;
use crate::error::{Result, StampError};
use crate::extract::SourceFact;
use crate::model::{ApiSignature, EmitSpec, Exports, FrameworkMeta, Kind, PropSpec};

pub use preset::Preset;

pub const CONTRACT_TYPE: &str = "UIFContract";
pub const CONTRACT_SCHEMA_VERSION: &str = "0.3";

/// Names a file composes from, each list sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub props: BTreeMap<String, PropSpec>,
    #[serde(default)]
    pub emits: BTreeMap<String, EmitSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state: BTreeMap<String, String>,
}

/// What a file offers to its callers: a UI interface or a set of routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    #[serde(rename = "interface")]
    Interface(Interface),
    #[serde(rename = "apiSignature")]
    Api(ApiSignature),
}

impl Surface {
    pub fn interface(&self) -> Option<&Interface> {
        match self {
            Surface::Interface(interface) => Some(interface),
            Surface::Api(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(rename = "type")]
    pub contract_type: String,
    pub schema_version: String,
    pub kind: Kind,
    pub entry_id: EntryId,
    pub composition: Composition,
    #[serde(flatten)]
    pub surface: Surface,
    #[serde(default, skip_serializing_if = "Exports::is_none")]
    pub exports: Exports,
    pub semantic_hash: String,
    pub file_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_meta: Option<FrameworkMeta>,
}

/// The fields the semantic hash covers.
#[derive(Serialize)]
struct SemanticView<'c> {
    composition: &'c Composition,
    #[serde(flatten)]
    surface: &'c Surface,
    exports: &'c Exports,
}

impl Contract {
    pub fn props(&self) -> impl Iterator<Item = &str> {
        self.surface
            .interface()
            .into_iter()
            .flat_map(|i| i.props.keys().map(String::as_str))
    }

    pub fn emits(&self) -> impl Iterator<Item = &str> {
        self.surface
            .interface()
            .into_iter()
            .flat_map(|i| i.emits.keys().map(String::as_str))
    }

    /// Recompute the semantic hash from the current fields.
    pub fn compute_semantic_hash(&self) -> Result<String> {
        semantic_hash(&self.composition, &self.surface, &self.exports)
    }
}

fn semantic_hash(composition: &Composition, surface: &Surface, exports: &Exports) -> Result<String> {
    let view = SemanticView {
        composition,
        surface,
        exports,
    };
    hash::canonical_hash(hash::SEMANTIC_HASH_PREFIX, &view, "semantic view")
}

/// Build a contract from extracted facts.
///
/// `text` is the raw file text, hashed as-is for `fileHash`.
pub fn build_contract(fact: SourceFact, text: &str, preset: Preset) -> Result<Contract> {
    let SourceFact {
        entry_id,
        kind,
        imports,
        hooks,
        components,
        functions,
        variables,
        mut props,
        mut emits,
        state,
        exports,
        api,
        framework_meta,
    } = fact;

    let renormalized = EntryId::new(entry_id.as_str())?;
    if renormalized != entry_id {
        return Err(StampError::Contract {
            entry_id: entry_id.to_string(),
            reason: format!("entry id is not normalized (expected '{renormalized}')"),
        });
    }

    let surface = match (kind, api) {
        (Kind::NodeApi, Some(api)) => Surface::Api(api),
        (Kind::NodeApi, None) => {
            return Err(StampError::Contract {
                entry_id: entry_id.to_string(),
                reason: "api file without a route signature".to_string(),
            });
        }
        (_, _) => {
            preset.apply(&mut props, &mut emits);
            Surface::Interface(Interface {
                props,
                emits,
                state,
            })
        }
    };

    let composition = Composition {
        variables: sorted_unique(variables),
        hooks: sorted_unique(hooks),
        components: sorted_unique(components),
        functions: sorted_unique(functions),
        imports: sorted_unique(imports),
    };
    let semantic_hash = semantic_hash(&composition, &surface, &exports)?;

    Ok(Contract {
        contract_type: CONTRACT_TYPE.to_string(),
        schema_version: CONTRACT_SCHEMA_VERSION.to_string(),
        kind,
        entry_id,
        composition,
        surface,
        exports,
        semantic_hash,
        file_hash: hash::file_hash(text),
        framework_meta,
    })
}

fn sorted_unique(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items.dedup();
    items
}
