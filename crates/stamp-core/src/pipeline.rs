//! End-to-end context generation.
//!
//! Files are read concurrently (bounded by a semaphore), then extracted,
//! built into contracts, linked into a graph and packed into bundles. The
//! result is grouped by folder into context files plus one index. Writing is
//! a separate step so callers can inspect or compare before touching disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::bundle::{self, Budget, Bundle, PackOptions, SecretReport, SourceTexts};
use crate::contract::{Contract, Preset, build_contract};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::entry_id::EntryId;
use crate::error::{IoPurpose, Result, StampError};
use crate::extract::{ExtractOptions, extract};
use crate::graph::{DependencyGraph, build_graph};
use crate::manifest::{
    CONTEXT_FILE_NAME, ContextIndex, FolderEntry, INDEX_FILE_NAME, INDEX_SCHEMA_VERSION, INDEX_TYPE,
    IndexMeta, IndexSummary,
};
use crate::runtime::{Runtime, RuntimeError};
use crate::tokens::TokenEstimator;

/// Default number of concurrent file reads.
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub budget: Budget,
    pub preset: Preset,
    pub strict_missing: bool,
    pub concurrency: usize,
    pub extract: ExtractOptions,
    /// Timestamp written to bundles and the index; `None` uses the current time.
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            budget: Budget::default(),
            preset: Preset::None,
            strict_missing: false,
            concurrency: DEFAULT_CONCURRENCY,
            extract: ExtractOptions::default(),
            created_at: None,
        }
    }
}

/// A candidate file handed over by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub entry_id: EntryId,
    /// Where to read the file from.
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(entry_id: EntryId, path: impl Into<PathBuf>) -> Self {
        Self {
            entry_id,
            path: path.into(),
        }
    }

    /// Source file under `root`, identified by its path relative to it.
    pub fn under(root: &Path, path: &Path) -> Result<Self> {
        Ok(Self::new(EntryId::from_path(root, path)?, path))
    }
}

/// One folder's bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    /// Project-relative folder, `.` for the root.
    pub folder: String,
    /// Project-relative path of the file to write.
    pub path: String,
    pub bundles: Vec<Bundle>,
    pub token_estimate: usize,
}

#[derive(Debug, Clone)]
pub struct ContextOutput {
    pub index: ContextIndex,
    pub files: Vec<ContextFile>,
    pub graph: DependencyGraph,
}

impl ContextOutput {
    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.graph.nodes().map(|n| &n.contract)
    }
}

/// Context file path for a folder.
pub fn context_file_for(folder: &str) -> String {
    if folder == "." || folder.is_empty() {
        CONTEXT_FILE_NAME.to_string()
    } else {
        format!("{folder}/{CONTEXT_FILE_NAME}")
    }
}

/// Read all files with at most `concurrency` reads in flight.
///
/// Results come back in input order. A failed read is recorded and the file
/// is dropped.
async fn read_sources(
    runtime: Arc<dyn Runtime>,
    files: Vec<SourceFile>,
    concurrency: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<(EntryId, String)> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (index, file) in files.into_iter().enumerate() {
        let runtime = Arc::clone(&runtime);
        let permit = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let Ok(_permit) = permit.acquire().await else {
                let err = RuntimeError::Other("read limiter closed".to_string());
                return (index, file, Err(err));
            };
            let result = runtime.read_file(&file.path).await;
            (index, file, result)
        });
    }

    let mut slots: Vec<Option<(EntryId, String)>> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let (index, file, result) = match joined {
            Ok(done) => done,
            Err(join_err) => {
                diagnostics.warn(DiagnosticKind::Io, None, format!("read task failed: {join_err}"));
                continue;
            }
        };
        match result {
            Ok(bytes) => {
                if slots.len() <= index {
                    slots.resize_with(index + 1, || None);
                }
                let text = String::from_utf8_lossy(&bytes).into_owned();
                slots[index] = Some((file.entry_id, text));
            }
            Err(err) => {
                let err = StampError::read(&file.path, IoPurpose::SourceFile, err);
                diagnostics.warn(DiagnosticKind::Io, Some(file.entry_id.as_str()), err.to_string());
            }
        }
    }
    slots.into_iter().flatten().collect()
}

/// Extract and build contracts; per-file failures are recorded and skipped.
pub fn build_contracts(
    sources: &[(EntryId, String)],
    options: &ContextOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<Contract> {
    let mut contracts = Vec::with_capacity(sources.len());
    for (entry_id, text) in sources {
        let fact = match extract(entry_id, text, &options.extract) {
            Ok(fact) => fact,
            Err(err) => {
                diagnostics.warn(DiagnosticKind::Parse, Some(entry_id.as_str()), err.to_string());
                continue;
            }
        };
        match build_contract(fact, text, options.preset) {
            Ok(contract) => {
                tracing::debug!(entry = %entry_id, kind = %contract.kind, "built contract");
                contracts.push(contract);
            }
            Err(err) => {
                diagnostics.warn(DiagnosticKind::Contract, Some(entry_id.as_str()), err.to_string());
            }
        }
    }
    contracts
}

/// Pack one bundle per root, then one for each node no earlier bundle reached.
pub fn pack_all(
    graph: &DependencyGraph,
    pack_options: &PackOptions<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Bundle>> {
    let mut bundles = Vec::new();
    let mut covered: BTreeSet<EntryId> = BTreeSet::new();

    for root in graph.roots() {
        let bundle = bundle::pack(root, graph, pack_options, diagnostics)?;
        covered.extend(bundle.graph.nodes.iter().map(|n| n.entry_id.clone()));
        bundles.push(bundle);
    }
    for node in graph.nodes() {
        if covered.contains(&node.entry_id) {
            continue;
        }
        let bundle = bundle::pack(&node.entry_id, graph, pack_options, diagnostics)?;
        covered.extend(bundle.graph.nodes.iter().map(|n| n.entry_id.clone()));
        bundles.push(bundle);
    }
    Ok(bundles)
}

/// Run the full pipeline over `files`.
///
/// Only strict-mode missing dependencies and serialization failures abort
/// the run; everything else lands in `diagnostics`.
pub async fn generate_context(
    runtime: Arc<dyn Runtime>,
    files: Vec<SourceFile>,
    options: &ContextOptions,
    secrets: Option<&SecretReport>,
    estimator: &dyn TokenEstimator,
    diagnostics: &mut Diagnostics,
) -> Result<ContextOutput> {
    let created_at = options.created_at.unwrap_or_else(Utc::now);
    let file_count = files.len();

    let sources = read_sources(runtime, files, options.concurrency, diagnostics).await;
    let contracts = build_contracts(&sources, options, diagnostics);
    let graph = build_graph(contracts, diagnostics);

    let texts: SourceTexts = sources.into_iter().collect();
    let pack_options = PackOptions::new(options.budget)
        .strict_missing(options.strict_missing)
        .secrets(secrets)
        .sources(&texts)
        .created_at(created_at);
    let bundles = pack_all(&graph, &pack_options, diagnostics)?;

    let roots: BTreeSet<&EntryId> = graph.roots().iter().collect();
    let mut by_folder: BTreeMap<String, Vec<Bundle>> = BTreeMap::new();
    for bundle in bundles {
        by_folder
            .entry(bundle.entry_id.folder().to_string())
            .or_default()
            .push(bundle);
    }

    let mut files = Vec::with_capacity(by_folder.len());
    let mut folders = Vec::with_capacity(by_folder.len());
    for (folder, bundles) in by_folder {
        let text = to_pretty_json(&bundles, "context file")?;
        let token_estimate = estimator.estimate(&text);
        let path = context_file_for(&folder);
        let mut components: Vec<String> = bundles
            .iter()
            .map(|b| b.entry_id.file_name().to_string())
            .collect();
        components.sort();
        components.dedup();
        folders.push(FolderEntry {
            path: folder.clone(),
            context_file: path.clone(),
            bundles: bundles.len(),
            components,
            is_root: bundles.iter().any(|b| roots.contains(&b.entry_id)),
            token_estimate,
        });
        files.push(ContextFile {
            folder,
            path,
            bundles,
            token_estimate,
        });
    }

    let summary = IndexSummary {
        total_components: graph.len(),
        total_bundles: folders.iter().map(|f| f.bundles).sum(),
        total_folders: folders.len(),
        total_token_estimate: folders.iter().map(|f| f.token_estimate).sum(),
    };
    tracing::info!(
        files = file_count,
        components = summary.total_components,
        bundles = summary.total_bundles,
        folders = summary.total_folders,
        warnings = diagnostics.len(),
        "context generated"
    );

    let index = ContextIndex {
        index_type: INDEX_TYPE.to_string(),
        schema_version: INDEX_SCHEMA_VERSION.to_string(),
        project_root: ".".to_string(),
        created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        summary,
        folders,
        meta: IndexMeta {
            source: bundle::source_tag(),
        },
    };
    Ok(ContextOutput { index, files, graph })
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T, what: &'static str) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| StampError::Serialize { what, source })
}

/// Write every context file and the index under `out_dir`.
///
/// Returns the written paths, index last.
pub async fn write_context(
    runtime: &dyn Runtime,
    out_dir: &Path,
    output: &ContextOutput,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(output.files.len() + 1);
    for file in &output.files {
        let path = out_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            runtime
                .create_dir(parent, true)
                .await
                .map_err(|err| StampError::io(parent, IoPurpose::ContextFile, "create", err))?;
        }
        let text = to_pretty_json(&file.bundles, "context file")?;
        runtime
            .write_file(&path, text.as_bytes())
            .await
            .map_err(|err| StampError::write(&path, IoPurpose::ContextFile, err))?;
        written.push(path);
    }

    runtime
        .create_dir(out_dir, true)
        .await
        .map_err(|err| StampError::io(out_dir, IoPurpose::Output, "create", err))?;
    let index_path = out_dir.join(INDEX_FILE_NAME);
    let text = to_pretty_json(&output.index, "index")?;
    runtime
        .write_file(&index_path, text.as_bytes())
        .await
        .map_err(|err| StampError::write(&index_path, IoPurpose::Index, err))?;
    written.push(index_path);

    tracing::debug!(files = written.len(), out = %out_dir.display(), "context written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_file_paths() {
        assert_eq!(context_file_for("."), "context.json");
        assert_eq!(context_file_for("src/components"), "src/components/context.json");
    }

    #[test]
    fn source_file_under_root() {
        let file = SourceFile::under(Path::new("/repo"), Path::new("/repo/src/App.tsx")).unwrap();
        assert_eq!(file.entry_id.as_str(), "src/App.tsx");
        assert_eq!(file.path, PathBuf::from("/repo/src/App.tsx"));
    }
}
