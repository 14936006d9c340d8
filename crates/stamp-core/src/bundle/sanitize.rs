//! Secret redaction for code excerpts.
//!
//! The report comes from an external scanner and maps project-relative paths
//! to findings. Any reported snippet is replaced with [`SECRET_PLACEHOLDER`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry_id::EntryId;

pub const SECRET_PLACEHOLDER: &str = "PRIVATE_DATA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretFinding {
    /// 1-based line number.
    pub line: usize,
    #[serde(default)]
    pub column: usize,
    #[serde(rename = "type", default)]
    pub secret_type: String,
    pub snippet: String,
    #[serde(default)]
    pub severity: String,
}

/// Findings keyed by normalized entry id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretReport {
    files: BTreeMap<EntryId, Vec<SecretFinding>>,
}

impl SecretReport {
    /// Parse a report; keys that are not valid project-relative paths are dropped.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Vec<SecretFinding>> = serde_json::from_str(text)?;
        Ok(Self::from_map(raw))
    }

    pub fn from_map(raw: BTreeMap<String, Vec<SecretFinding>>) -> Self {
        let mut files: BTreeMap<EntryId, Vec<SecretFinding>> = BTreeMap::new();
        for (path, findings) in raw {
            match EntryId::new(&path) {
                Ok(id) => files.entry(id).or_default().extend(findings),
                Err(err) => tracing::debug!(path = %path, error = %err, "ignoring secret report key"),
            }
        }
        Self { files }
    }

    pub fn findings(&self, entry_id: &EntryId) -> &[SecretFinding] {
        self.files.get(entry_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.files.values().all(Vec::is_empty)
    }
}

/// Replace every reported snippet in `text`.
///
/// A snippet is replaced on its reported line; if it is not found there,
/// every occurrence in the text is replaced.
pub fn sanitize<'t>(text: &'t str, findings: &[SecretFinding]) -> Cow<'t, str> {
    let findings: Vec<&SecretFinding> = findings.iter().filter(|f| !f.snippet.is_empty()).collect();
    if findings.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
    let mut global: Vec<&str> = Vec::new();
    for finding in findings {
        let on_line = finding
            .line
            .checked_sub(1)
            .and_then(|index| lines.get_mut(index))
            .filter(|line| line.contains(&finding.snippet));
        match on_line {
            Some(line) => *line = line.replace(&finding.snippet, SECRET_PLACEHOLDER),
            None => global.push(&finding.snippet),
        }
    }

    let mut out = lines.concat();
    for snippet in global {
        out = out.replace(snippet, SECRET_PLACEHOLDER);
    }
    Cow::Owned(out)
}
