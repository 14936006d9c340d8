//! Bundle packing: bounded breadth-first subgraphs around one entry.
//!
//! A bundle includes the entry plus everything reachable through resolved
//! dependencies within `depth` hops, stopping once `max_nodes` entries are
//! included. Nodes and edges are sorted so identical inputs always produce
//! an identical `bundleHash`.

mod excerpt;
mod sanitize;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::Contract;
use crate::contract::hash::{self, BUNDLE_HASH_PREFIX};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::entry_id::EntryId;
use crate::error::{Result, StampError};
use crate::graph::DependencyGraph;

pub use excerpt::{CodeInclusion, HEADER_MAX_LINES, header};
pub use sanitize::{SECRET_PLACEHOLDER, SecretFinding, SecretReport, sanitize};

pub const BUNDLE_TYPE: &str = "LogicStampBundle";
pub const BUNDLE_SCHEMA_VERSION: &str = "0.1";

/// Producer tag written to `meta.source`.
pub fn source_tag() -> String {
    format!("stamp-core@{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub depth: usize,
    pub max_nodes: usize,
    pub include_code: CodeInclusion,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            depth: 2,
            max_nodes: 100,
            include_code: CodeInclusion::Header,
        }
    }
}

/// Source texts by entry id, used for code excerpts.
pub type SourceTexts = BTreeMap<EntryId, String>;

#[derive(Debug, Clone)]
pub struct PackOptions<'r> {
    pub budget: Budget,
    /// Fail instead of recording unresolved dependencies.
    pub strict_missing: bool,
    pub secrets: Option<&'r SecretReport>,
    pub sources: Option<&'r SourceTexts>,
    pub created_at: DateTime<Utc>,
}

impl<'r> PackOptions<'r> {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            strict_missing: false,
            secrets: None,
            sources: None,
            created_at: Utc::now(),
        }
    }

    pub fn strict_missing(mut self, strict: bool) -> Self {
        self.strict_missing = strict;
        self
    }

    pub fn secrets(mut self, report: Option<&'r SecretReport>) -> Self {
        self.secrets = report;
        self
    }

    pub fn sources(mut self, sources: &'r SourceTexts) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleNode {
    pub entry_id: EntryId,
    pub contract: Contract,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleGraph {
    pub nodes: Vec<BundleNode>,
    pub edges: Vec<(EntryId, EntryId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub source: String,
    #[serde(default)]
    pub missing: Vec<String>,
    /// Reachable within `depth` but cut by `maxNodes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub schema_version: String,
    pub entry_id: EntryId,
    pub depth: usize,
    pub created_at: String,
    pub bundle_hash: String,
    pub graph: BundleGraph,
    pub meta: BundleMeta,
}

impl Bundle {
    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.graph.nodes.iter().map(|n| &n.contract)
    }
}

/// Pack the bundle rooted at `entry`.
pub fn pack(
    entry: &EntryId,
    graph: &DependencyGraph,
    options: &PackOptions<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<Bundle> {
    if !graph.contains(entry) {
        return Err(StampError::UnknownEntry(entry.to_string()));
    }
    let budget = options.budget;
    let max_nodes = budget.max_nodes.max(1);

    let mut included: BTreeSet<EntryId> = BTreeSet::from([entry.clone()]);
    let mut omitted: BTreeSet<EntryId> = BTreeSet::new();
    let mut queue: VecDeque<(EntryId, usize)> = VecDeque::from([(entry.clone(), 0)]);

    while let Some((id, hops)) = queue.pop_front() {
        let Some(node) = graph.get(&id) else {
            continue;
        };
        if hops >= budget.depth {
            continue;
        }
        for name in &node.dependencies {
            let Some(target) = graph.resolve(name) else {
                continue;
            };
            if included.contains(target) {
                continue;
            }
            if included.len() >= max_nodes {
                omitted.insert(target.clone());
                continue;
            }
            included.insert(target.clone());
            queue.push_back((target.clone(), hops + 1));
        }
    }

    let mut missing: BTreeSet<String> = BTreeSet::new();
    let mut edges: BTreeSet<(EntryId, EntryId)> = BTreeSet::new();
    let mut nodes = Vec::with_capacity(included.len());
    for id in &included {
        let Some(node) = graph.get(id) else {
            continue;
        };
        missing.extend(graph.unresolved(node).map(str::to_string));
        for name in &node.dependencies {
            if let Some(target) = graph.resolve(name) {
                if target != id && included.contains(target) {
                    edges.insert((id.clone(), target.clone()));
                }
            }
        }
        nodes.push(BundleNode {
            entry_id: id.clone(),
            contract: node.contract.clone(),
            code: code_for(id, options, diagnostics),
        });
    }

    let missing: Vec<String> = missing.into_iter().collect();
    if !missing.is_empty() {
        if options.strict_missing {
            return Err(StampError::MissingDependencies {
                entry_id: entry.to_string(),
                names: missing,
            });
        }
        diagnostics.warn(
            DiagnosticKind::MissingDependency,
            Some(entry.as_str()),
            format!("unresolved dependencies: {}", missing.join(", ")),
        );
    }

    let graph = BundleGraph {
        nodes,
        edges: edges.into_iter().collect(),
    };
    let bundle_hash = hash::canonical_hash(BUNDLE_HASH_PREFIX, &graph, "bundle graph")?;
    tracing::debug!(
        entry = %entry,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        omitted = omitted.len(),
        "packed bundle"
    );

    Ok(Bundle {
        bundle_type: BUNDLE_TYPE.to_string(),
        schema_version: BUNDLE_SCHEMA_VERSION.to_string(),
        entry_id: entry.clone(),
        depth: budget.depth,
        created_at: options.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        bundle_hash,
        graph,
        meta: BundleMeta {
            source: source_tag(),
            missing,
            omitted: omitted.into_iter().collect(),
        },
    })
}

fn code_for(id: &EntryId, options: &PackOptions<'_>, diagnostics: &mut Diagnostics) -> Option<String> {
    let mode = options.budget.include_code;
    if mode == CodeInclusion::None {
        return None;
    }
    let Some(text) = options.sources.and_then(|sources| sources.get(id)) else {
        diagnostics.warn(
            DiagnosticKind::Io,
            Some(id.as_str()),
            "source text unavailable, bundle node has no code",
        );
        return None;
    };
    let is_sfc = id.extension().as_deref() == Some("vue");
    let excerpt = mode.excerpt(text, is_sfc)?;
    let findings = options.secrets.map(|report| report.findings(id)).unwrap_or(&[]);
    Some(sanitize(&excerpt, findings).into_owned())
}
