//! Project-wide dependency graph over contracts.
//!
//! Nodes live in a map keyed by entry id. Each node lists the symbol names it
//! depends on (`dependencies`) and the entries that depend on it (`used_by`).
//! The graph may contain cycles; roots and leaves are computed, not assumed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::contract::Contract;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::entry_id::EntryId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub entry_id: EntryId,
    pub contract: Contract,
    /// Symbol names, resolved or not, sorted.
    pub dependencies: Vec<String>,
    /// Entries whose dependencies resolve to this node, sorted.
    pub used_by: Vec<EntryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    components: BTreeMap<EntryId, GraphNode>,
    roots: Vec<EntryId>,
    leaves: Vec<EntryId>,
    /// Symbol name to the entry that provides it.
    #[serde(skip)]
    symbols: BTreeMap<String, EntryId>,
}

impl DependencyGraph {
    pub fn get(&self, entry_id: &EntryId) -> Option<&GraphNode> {
        self.components.get(entry_id)
    }

    pub fn contains(&self, entry_id: &EntryId) -> bool {
        self.components.contains_key(entry_id)
    }

    /// Nodes in ascending entry id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    pub fn leaves(&self) -> &[EntryId] {
        &self.leaves
    }

    /// The entry providing symbol `name`, if any.
    pub fn resolve(&self, name: &str) -> Option<&EntryId> {
        self.symbols.get(name)
    }

    /// Dependency names of `node` that resolve to no graph entry.
    pub fn unresolved<'n>(&self, node: &'n GraphNode) -> impl Iterator<Item = &'n str> {
        node.dependencies
            .iter()
            .filter(|name| self.resolve(name).is_none())
            .map(String::as_str)
    }
}

/// Raw dependency names of a contract after internal filtering.
///
/// A component name that is also a locally defined function is dropped only
/// when the export list is enumerable and does not contain it. When exports
/// are `Default`, `NamedOpaque` or `None` nothing is filtered.
pub fn candidate_dependencies(contract: &Contract) -> Vec<String> {
    let composition = &contract.composition;
    let mut candidates: BTreeSet<&String> = composition.components.iter().collect();

    if let Some(exported) = contract.exports.enumerable() {
        candidates.retain(|name| {
            let local = composition.functions.contains(*name);
            !local || exported.contains(*name)
        });
    }
    candidates.into_iter().cloned().collect()
}

/// Names under which other files can refer to this entry.
fn provided_names(contract: &Contract) -> (Vec<String>, Vec<String>) {
    let exported = contract
        .exports
        .enumerable()
        .map(<[String]>::to_vec)
        .unwrap_or_default();

    let entry_id = &contract.entry_id;
    let mut fallback = vec![entry_id.file_stem().to_string()];
    if entry_id.file_stem() == "index" {
        if let Some(dir) = entry_id.dir_segments().last() {
            fallback.push(dir.to_string());
        }
    }
    (exported, fallback)
}

/// Build the graph from a contract collection.
///
/// Duplicate entry ids keep the first contract and record a diagnostic.
pub fn build_graph(contracts: Vec<Contract>, diagnostics: &mut Diagnostics) -> DependencyGraph {
    let mut components: BTreeMap<EntryId, GraphNode> = BTreeMap::new();
    for contract in contracts {
        let entry_id = contract.entry_id.clone();
        if components.contains_key(&entry_id) {
            diagnostics.warn(
                DiagnosticKind::MalformedContract,
                Some(entry_id.as_str()),
                "duplicate contract for entry, keeping the first",
            );
            continue;
        }
        let dependencies = candidate_dependencies(&contract);
        components.insert(
            entry_id.clone(),
            GraphNode {
                entry_id,
                contract,
                dependencies,
                used_by: Vec::new(),
            },
        );
    }

    // Explicit export names take precedence over file-name fallbacks; within
    // each tier the smallest entry id wins.
    let mut symbols: BTreeMap<String, EntryId> = BTreeMap::new();
    let provided: Vec<(&EntryId, (Vec<String>, Vec<String>))> = components
        .iter()
        .map(|(id, node)| (id, provided_names(&node.contract)))
        .collect();
    for (id, (exported, _)) in &provided {
        for name in exported {
            symbols.entry(name.clone()).or_insert_with(|| (*id).clone());
        }
    }
    for (id, (_, fallback)) in &provided {
        for name in fallback {
            symbols.entry(name.clone()).or_insert_with(|| (*id).clone());
        }
    }

    let mut used_by: BTreeMap<EntryId, BTreeSet<EntryId>> = BTreeMap::new();
    for (id, node) in &components {
        for name in &node.dependencies {
            match symbols.get(name) {
                Some(target) if target != id => {
                    used_by.entry(target.clone()).or_default().insert(id.clone());
                }
                Some(_) => {}
                None => tracing::debug!(entry = %id, name = %name, "unresolved dependency"),
            }
        }
    }
    for (target, users) in used_by {
        if let Some(node) = components.get_mut(&target) {
            node.used_by = users.into_iter().collect();
        }
    }

    let roots = components
        .values()
        .filter(|n| n.used_by.is_empty())
        .map(|n| n.entry_id.clone())
        .collect();
    let leaves = components
        .values()
        .filter(|n| n.dependencies.is_empty())
        .map(|n| n.entry_id.clone())
        .collect();

    tracing::debug!(nodes = components.len(), symbols = symbols.len(), "dependency graph built");
    DependencyGraph {
        components,
        roots,
        leaves,
        symbols,
    }
}

/// Build the graph from untyped contract JSON, skipping malformed entries.
pub fn build_graph_from_values(
    values: Vec<serde_json::Value>,
    diagnostics: &mut Diagnostics,
) -> DependencyGraph {
    let mut contracts = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let label = value
            .get("entryId")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        match serde_json::from_value::<Contract>(value) {
            Ok(contract) => contracts.push(contract),
            Err(err) => diagnostics.warn(
                DiagnosticKind::MalformedContract,
                label.as_deref(),
                format!("skipping malformed contract #{index}: {err}"),
            ),
        }
    }
    build_graph(contracts, diagnostics)
}
