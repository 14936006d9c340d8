//! # stamp-core
//!
//! Structured context for TypeScript, JSX and Vue projects.
//!
//! Each source file is reduced to a [`Contract`]: its classification, what it
//! composes, its public interface and two content hashes. Contracts are linked
//! into a [`DependencyGraph`], which is cut into depth and size bounded
//! [`Bundle`]s. Two generations of bundles can be compared for drift.
//!
//! ## Pipeline
//!
//! ```text
//!  source text ──extract──▶ SourceFact ──build_contract──▶ Contract
//!                                                              │
//!                                                         build_graph
//!                                                              ▼
//!  ContextIndex ◀──group by folder── Bundle ◀──pack── DependencyGraph
//! ```
//!
//! Extraction, contract building, graph building and packing are pure and
//! synchronous. They report per-file problems into an explicit
//! [`Diagnostics`] collector instead of failing the run. File access goes
//! through the [`Runtime`] trait and is the only async part of the crate.
//!
//! ## Quick start
//!
//! ```rust
//! use stamp_core::{Diagnostics, EntryId, ExtractOptions, Preset, build_contract, build_graph, extract};
//!
//! # fn main() -> stamp_core::Result<()> {
//! let id = EntryId::new("src/Button.tsx")?;
//! let text = "export function Button({ label }: { label: string }) { return <button>{label}</button>; }";
//! let fact = extract(&id, text, &ExtractOptions::default())?;
//! let contract = build_contract(fact, text, Preset::None)?;
//! assert_eq!(contract.kind.as_str(), "react:component");
//!
//! let mut diagnostics = Diagnostics::new();
//! let graph = build_graph(vec![contract], &mut diagnostics);
//! assert_eq!(graph.roots().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod contract;
pub mod diagnostics;
pub mod diff;
pub mod entry_id;
pub mod error;
pub mod extract;
pub mod graph;
pub mod manifest;
pub mod model;
pub mod pipeline;
pub mod runtime;
pub mod tokens;

pub use bundle::{Budget, Bundle, CodeInclusion, PackOptions, SecretFinding, SecretReport, pack};
pub use contract::{Contract, Preset, build_contract};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use diff::{
    DiffResult, DiffStatus, FolderStatus, MultiFileCompareResult, compare_files, compare_indexes,
    diff_bundles,
};
pub use entry_id::{EntryId, EntryIdError};
pub use error::{IoFailure, IoPurpose, Result, StampError};
pub use extract::{ExtractOptions, SourceFact, extract};
pub use graph::{DependencyGraph, GraphNode, build_graph};
pub use manifest::{ContextIndex, load_index};
pub use model::{Exports, Kind};
pub use pipeline::{ContextOptions, ContextOutput, SourceFile, generate_context, write_context};
pub use runtime::{NativeRuntime, Runtime, RuntimeError, RuntimeResult};
pub use tokens::{CharRatioEstimator, TokenEstimator};

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::MemoryRuntime;

#[cfg(test)]
mod tests;
