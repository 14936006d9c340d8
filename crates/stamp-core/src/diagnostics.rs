//! Warning collector threaded through extraction, graph building and packing.
//!
//! Stages receive a `&mut Diagnostics` instead of logging into global state,
//! which keeps them pure and lets tests assert on exactly what was reported.
//! Every recorded warning is also emitted as a `tracing` event.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A source file could not be parsed and was excluded.
    Parse,
    /// A contract could not be built from extracted facts.
    Contract,
    /// A contract handed to the graph builder was malformed or duplicated.
    MalformedContract,
    /// A dependency name did not resolve to a graph node.
    MissingDependency,
    /// An older artifact schema was read in compatibility mode.
    Compatibility,
    /// A non-fatal read failure (for example a missing code excerpt).
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it through `tracing`.
    pub fn warn(
        &mut self,
        kind: DiagnosticKind,
        entry_id: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match entry_id {
            Some(entry) => tracing::warn!(kind = ?kind, entry = entry, "{message}"),
            None => tracing::warn!(kind = ?kind, "{message}"),
        }
        self.items.push(Diagnostic {
            kind,
            entry_id: entry_id.map(str::to_string),
            message,
        });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.warn(
            diagnostic.kind,
            diagnostic.entry_id.as_deref(),
            diagnostic.message,
        );
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
