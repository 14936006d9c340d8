//! Drift detection between two generations of bundles.
//!
//! Each contract is reduced to a [`LiteSig`] keyed by lowercased entry id.
//! Two collections are then compared key by key; every tracked field that
//! differs becomes one [`Delta`].

pub mod multi;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bundle::Bundle;
use crate::contract::Contract;
use crate::error::{IoPurpose, Result, StampError};
use crate::runtime::Runtime;

pub use multi::{
    FolderCompare, FolderStatus, MultiFileCompareResult, MultiFileSummary, compare_indexes,
};

/// The drift-relevant subset of a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteSig {
    /// Entry id as written in the newer-or-only source.
    pub id: String,
    pub semantic_hash: String,
    pub imports: Vec<String>,
    pub hooks: Vec<String>,
    pub functions: Vec<String>,
    pub components: Vec<String>,
    pub props: Vec<String>,
    pub emits: Vec<String>,
    pub exports: Value,
}

impl LiteSig {
    pub fn of(contract: &Contract) -> Self {
        let mut props: Vec<String> = contract.props().map(str::to_string).collect();
        props.sort();
        let mut emits: Vec<String> = contract.emits().map(str::to_string).collect();
        emits.sort();
        let composition = &contract.composition;
        Self {
            id: contract.entry_id.to_string(),
            semantic_hash: contract.semantic_hash.clone(),
            imports: composition.imports.clone(),
            hooks: composition.hooks.clone(),
            functions: composition.functions.clone(),
            components: composition.components.clone(),
            props,
            emits,
            exports: contract.exports.to_value(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiffStatus {
    Pass,
    Drift,
}

impl DiffStatus {
    pub fn is_drift(self) -> bool {
        self == DiffStatus::Drift
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiffStatus::Pass => "PASS",
            DiffStatus::Drift => "DRIFT",
        })
    }
}

/// Tracked fields, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaType {
    Hash,
    Imports,
    Hooks,
    Functions,
    Components,
    Props,
    Emits,
    Exports,
}

impl DeltaType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaType::Hash => "hash",
            DeltaType::Imports => "imports",
            DeltaType::Hooks => "hooks",
            DeltaType::Functions => "functions",
            DeltaType::Components => "components",
            DeltaType::Props => "props",
            DeltaType::Emits => "emits",
            DeltaType::Exports => "exports",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(rename = "type")]
    pub delta_type: DeltaType,
    pub old: Value,
    pub new: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedEntry {
    pub id: String,
    pub deltas: Vec<Delta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub status: DiffStatus,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<ChangedEntry>,
}

impl DiffResult {
    pub fn is_pass(&self) -> bool {
        self.status == DiffStatus::Pass
    }
}

/// Signatures keyed by lowercased entry id; the first occurrence wins.
pub fn index_bundles(bundles: &[Bundle]) -> BTreeMap<String, LiteSig> {
    let mut index = BTreeMap::new();
    for contract in bundles.iter().flat_map(Bundle::contracts) {
        index
            .entry(contract.entry_id.key())
            .or_insert_with(|| LiteSig::of(contract));
    }
    index
}

/// Field-level deltas between two signatures, in [`DeltaType`] order.
pub fn deltas(old: &LiteSig, new: &LiteSig) -> Vec<Delta> {
    let mut out = Vec::new();
    let mut push = |delta_type: DeltaType, old: Value, new: Value| {
        if old != new {
            out.push(Delta { delta_type, old, new });
        }
    };
    push(
        DeltaType::Hash,
        Value::from(old.semantic_hash.as_str()),
        Value::from(new.semantic_hash.as_str()),
    );
    push(DeltaType::Imports, list(&old.imports), list(&new.imports));
    push(DeltaType::Hooks, list(&old.hooks), list(&new.hooks));
    push(DeltaType::Functions, list(&old.functions), list(&new.functions));
    push(DeltaType::Components, list(&old.components), list(&new.components));
    push(DeltaType::Props, list(&old.props), list(&new.props));
    push(DeltaType::Emits, list(&old.emits), list(&new.emits));
    push(DeltaType::Exports, old.exports.clone(), new.exports.clone());
    out
}

fn list(items: &[String]) -> Value {
    Value::from(items.to_vec())
}

/// Compare two signature indexes.
pub fn diff_signatures(old: &BTreeMap<String, LiteSig>, new: &BTreeMap<String, LiteSig>) -> DiffResult {
    let added: Vec<String> = new
        .iter()
        .filter(|(key, _)| !old.contains_key(*key))
        .map(|(_, sig)| sig.id.clone())
        .collect();
    let removed: Vec<String> = old
        .iter()
        .filter(|(key, _)| !new.contains_key(*key))
        .map(|(_, sig)| sig.id.clone())
        .collect();
    let changed: Vec<ChangedEntry> = new
        .iter()
        .filter_map(|(key, new_sig)| {
            let old_sig = old.get(key)?;
            let deltas = deltas(old_sig, new_sig);
            (!deltas.is_empty()).then(|| ChangedEntry {
                id: new_sig.id.clone(),
                deltas,
            })
        })
        .collect();

    let status = if added.is_empty() && removed.is_empty() && changed.is_empty() {
        DiffStatus::Pass
    } else {
        DiffStatus::Drift
    };
    DiffResult {
        status,
        added,
        removed,
        changed,
    }
}

/// Compare two bundle collections.
pub fn diff_bundles(old: &[Bundle], new: &[Bundle]) -> DiffResult {
    diff_signatures(&index_bundles(old), &index_bundles(new))
}

/// Parse a context file (a JSON array of bundles).
pub fn parse_bundles(path: &Path, text: &str, purpose: IoPurpose) -> Result<Vec<Bundle>> {
    serde_json::from_str(text).map_err(|source| StampError::json(path, purpose, source))
}

async fn load_bundles(runtime: &dyn Runtime, path: &Path, purpose: IoPurpose) -> Result<Vec<Bundle>> {
    let bytes = runtime
        .read_file(path)
        .await
        .map_err(|err| StampError::read(path, purpose, err))?;
    parse_bundles(path, &String::from_utf8_lossy(&bytes), purpose)
}

/// Read and compare two context files.
///
/// Either file failing to load aborts the comparison; no partial result is
/// returned.
pub async fn compare_files(runtime: &dyn Runtime, old: &Path, new: &Path) -> Result<DiffResult> {
    let old_bundles = load_bundles(runtime, old, IoPurpose::OldFile).await?;
    let new_bundles = load_bundles(runtime, new, IoPurpose::NewFile).await?;
    let result = diff_bundles(&old_bundles, &new_bundles);
    tracing::debug!(
        old = %old.display(),
        new = %new.display(),
        status = %result.status,
        added = result.added.len(),
        removed = result.removed.len(),
        changed = result.changed.len(),
        "compared context files"
    );
    Ok(result)
}
