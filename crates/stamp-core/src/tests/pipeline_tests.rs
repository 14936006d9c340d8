use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::{component, id};
use crate::bundle::{Budget, CodeInclusion, PackOptions, SecretFinding, SecretReport};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::diff::{DeltaType, DiffStatus, FolderStatus, compare_indexes};
use crate::error::StampError;
use crate::graph::build_graph;
use crate::manifest::load_index;
use crate::pipeline::{ContextOptions, ContextOutput, SourceFile, generate_context, pack_all, write_context};
use crate::runtime::{MemoryRuntime, Runtime};
use crate::tokens::CharRatioEstimator;

const APP: &str = r#"import { Card } from './components/Card';

export default function App() {
  return <main><Card title="hi" /></main>;
}
"#;

const CARD: &str = r#"import { Badge } from './Badge';

const token = 'ghp_secret_value';

export function Card({ title }: { title: string }) {
  return <div><Badge />{title}</div>;
}
"#;

const BADGE: &str = r#"export function Badge() {
  return <span>new</span>;
}
"#;

const BROKEN: &str = "export const = ;\n";

fn seed(runtime: &MemoryRuntime, files: &[(&str, &str)]) -> Vec<SourceFile> {
    files
        .iter()
        .map(|(path, text)| {
            let on_disk = format!("proj/{path}");
            runtime.insert(on_disk.as_str(), text.as_bytes());
            SourceFile::new(id(path), on_disk)
        })
        .collect()
}

fn project(runtime: &MemoryRuntime, badge: &str) -> Vec<SourceFile> {
    seed(
        runtime,
        &[
            ("src/App.tsx", APP),
            ("src/components/Card.tsx", CARD),
            ("src/components/Badge.tsx", badge),
            ("src/broken.ts", BROKEN),
        ],
    )
}

fn options() -> ContextOptions {
    ContextOptions {
        concurrency: 2,
        created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()),
        ..ContextOptions::default()
    }
}

async fn run(
    runtime: &Arc<MemoryRuntime>,
    files: Vec<SourceFile>,
    options: &ContextOptions,
    secrets: Option<&SecretReport>,
    diagnostics: &mut Diagnostics,
) -> crate::error::Result<ContextOutput> {
    let shared: Arc<dyn Runtime> = runtime.clone();
    generate_context(shared, files, options, secrets, &CharRatioEstimator::default(), diagnostics).await
}

#[tokio::test]
async fn parse_failures_do_not_abort_the_run() {
    let runtime = Arc::new(MemoryRuntime::new());
    let files = project(&runtime, BADGE);
    let mut diagnostics = Diagnostics::new();
    let output = run(&runtime, files, &options(), None, &mut diagnostics).await.unwrap();

    let parse: Vec<_> = diagnostics.of_kind(DiagnosticKind::Parse).filter_map(|d| d.entry_id.as_deref()).collect();
    assert_eq!(parse, vec!["src/broken.ts"]);
    assert_eq!(output.graph.len(), 3);
    assert_eq!(output.graph.roots(), &[id("src/App.tsx")]);

    let index = &output.index;
    assert_eq!(index.index_type, "LogicStampIndex");
    assert_eq!(index.summary.total_components, 3);
    assert_eq!(index.summary.total_bundles, 1);
    assert_eq!(index.summary.total_folders, 1);
    assert_eq!(index.folders[0].path, "src");
    assert_eq!(index.folders[0].context_file, "src/context.json");
    assert_eq!(index.folders[0].components, vec!["App.tsx"]);
    assert!(index.folders[0].is_root);
    assert!(index.summary.total_token_estimate > 0);
    assert_eq!(index.created_at, "2025-03-01T09:30:00.000Z");

    let bundle = &output.files[0].bundles[0];
    let nodes: Vec<&str> = bundle.graph.nodes.iter().map(|n| n.entry_id.as_str()).collect();
    assert_eq!(nodes, vec!["src/App.tsx", "src/components/Badge.tsx", "src/components/Card.tsx"]);
    assert_eq!(
        bundle.graph.edges,
        vec![
            (id("src/App.tsx"), id("src/components/Card.tsx")),
            (id("src/components/Card.tsx"), id("src/components/Badge.tsx")),
        ]
    );
    assert!(bundle.meta.missing.is_empty());
}

#[tokio::test]
async fn unreadable_files_are_reported() {
    let runtime = Arc::new(MemoryRuntime::new());
    let mut files = seed(&runtime, &[("src/components/Badge.tsx", BADGE)]);
    files.push(SourceFile::new(id("src/Gone.tsx"), "proj/src/Gone.tsx"));
    let mut diagnostics = Diagnostics::new();
    let output = run(&runtime, files, &options(), None, &mut diagnostics).await.unwrap();

    assert_eq!(output.graph.len(), 1);
    let io: Vec<_> = diagnostics.of_kind(DiagnosticKind::Io).collect();
    assert_eq!(io.len(), 1);
    assert_eq!(io[0].entry_id.as_deref(), Some("src/Gone.tsx"));
    assert!(io[0].message.contains("file not found"), "{}", io[0].message);
}

#[tokio::test]
async fn generation_is_deterministic() {
    let runtime = Arc::new(MemoryRuntime::new());
    let mut first_diagnostics = Diagnostics::new();
    let first = run(&runtime, project(&runtime, BADGE), &options(), None, &mut first_diagnostics)
        .await
        .unwrap();
    let mut second_diagnostics = Diagnostics::new();
    let mut reversed = project(&runtime, BADGE);
    reversed.reverse();
    let second = run(&runtime, reversed, &options(), None, &mut second_diagnostics)
        .await
        .unwrap();

    assert_eq!(first.index, second.index);
    assert_eq!(first.files, second.files);
    assert_eq!(
        serde_json::to_string(&first.files[0].bundles).unwrap(),
        serde_json::to_string(&second.files[0].bundles).unwrap()
    );
}

#[tokio::test]
async fn strict_mode_fails_on_missing_dependencies() {
    let runtime = Arc::new(MemoryRuntime::new());
    let files = seed(
        &runtime,
        &[("src/Page.tsx", "export function Page() { return <Layout><Ghost /></Layout>; }\n")],
    );
    let strict = ContextOptions {
        strict_missing: true,
        ..options()
    };
    let mut diagnostics = Diagnostics::new();
    let err = run(&runtime, files, &strict, None, &mut diagnostics).await.unwrap_err();
    assert!(matches!(err, StampError::MissingDependencies { ref names, .. } if names == &["Ghost", "Layout"]));
}

#[tokio::test]
async fn secrets_are_redacted_in_full_code() {
    let runtime = Arc::new(MemoryRuntime::new());
    let files = project(&runtime, BADGE);
    let report = SecretReport::from_map(BTreeMap::from([(
        "src/components/Card.tsx".to_string(),
        vec![SecretFinding {
            line: 3,
            column: 15,
            secret_type: "github-token".into(),
            snippet: "ghp_secret_value".into(),
            severity: "high".into(),
        }],
    )]));
    let full = ContextOptions {
        budget: Budget {
            include_code: CodeInclusion::Full,
            ..Budget::default()
        },
        ..options()
    };
    let mut diagnostics = Diagnostics::new();
    let output = run(&runtime, files, &full, Some(&report), &mut diagnostics).await.unwrap();

    let card = output.files[0].bundles[0]
        .graph
        .nodes
        .iter()
        .find(|n| n.entry_id.as_str() == "src/components/Card.tsx")
        .unwrap();
    let code = card.code.as_deref().unwrap();
    assert!(code.contains("const token = 'PRIVATE_DATA';"));
    assert!(!code.contains("ghp_secret_value"));
}

#[tokio::test]
async fn written_index_loads_back() {
    let runtime = Arc::new(MemoryRuntime::new());
    let files = project(&runtime, BADGE);
    let mut diagnostics = Diagnostics::new();
    let output = run(&runtime, files, &options(), None, &mut diagnostics).await.unwrap();

    let written = write_context(runtime.as_ref(), Path::new("out"), &output).await.unwrap();
    assert_eq!(
        written,
        vec![Path::new("out/src/context.json").to_path_buf(), Path::new("out/context_main.json").to_path_buf()]
    );

    let mut load_diagnostics = Diagnostics::new();
    let index = load_index(runtime.as_ref(), Path::new("out/context_main.json"), &mut load_diagnostics)
        .await
        .unwrap();
    assert_eq!(index, output.index);
    assert!(load_diagnostics.is_empty());
    assert!(runtime.text("out/src/context.json").unwrap().starts_with('['));
}

#[tokio::test]
async fn regenerated_project_reports_prop_drift() {
    let runtime = Arc::new(MemoryRuntime::new());
    let mut diagnostics = Diagnostics::new();

    let before = run(&runtime, project(&runtime, BADGE), &options(), None, &mut diagnostics)
        .await
        .unwrap();
    write_context(runtime.as_ref(), Path::new("old"), &before).await.unwrap();

    let badge = "export function Badge({ tone }: { tone: string }) {\n  return <span>{tone}</span>;\n}\n";
    let after = run(&runtime, project(&runtime, badge), &options(), None, &mut diagnostics)
        .await
        .unwrap();
    write_context(runtime.as_ref(), Path::new("new"), &after).await.unwrap();

    let result = compare_indexes(
        runtime.as_ref(),
        Path::new("old/context_main.json"),
        Path::new("new/context_main.json"),
        &mut diagnostics,
    )
    .await
    .unwrap();

    assert_eq!(result.status, DiffStatus::Drift);
    assert_eq!(result.folders.len(), 1);
    assert_eq!(result.folders[0].status, FolderStatus::Drift);
    let diff = result.folders[0].diff.as_ref().unwrap();
    assert_eq!(diff.changed.len(), 1);
    assert_eq!(diff.changed[0].id, "src/components/Badge.tsx");
    let kinds: Vec<DeltaType> = diff.changed[0].deltas.iter().map(|d| d.delta_type).collect();
    assert_eq!(kinds.first(), Some(&DeltaType::Hash));
    assert!(kinds.contains(&DeltaType::Props));
}

#[test]
fn unreached_nodes_get_their_own_bundle() {
    let mut diagnostics = Diagnostics::new();
    // A <-> B has no root; C is a root on its own.
    let graph = build_graph(
        vec![component("A", &["B"]), component("B", &["A"]), component("C", &[])],
        &mut diagnostics,
    );
    let options = PackOptions::new(Budget {
        include_code: CodeInclusion::None,
        ..Budget::default()
    });
    let bundles = pack_all(&graph, &options, &mut diagnostics).unwrap();
    let entries: Vec<&str> = bundles.iter().map(|b| b.entry_id.as_str()).collect();
    assert_eq!(entries, vec!["src/C.tsx", "src/A.tsx"]);
    assert_eq!(bundles[1].graph.nodes.len(), 2);
}
