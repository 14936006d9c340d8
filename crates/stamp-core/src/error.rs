//! Error types for stamp-core.
//!
//! Per-file problems (parse failures, contracts that cannot be built) are
//! recorded in [`crate::Diagnostics`] and never abort a run. The variants here
//! are what a whole operation returns when it cannot continue.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::entry_id::EntryIdError;
use crate::runtime::RuntimeError;

/// Result type for stamp-core operations.
pub type Result<T, E = StampError> = std::result::Result<T, E>;

/// What a file was being accessed for when an I/O failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPurpose {
    OldFile,
    NewFile,
    Index,
    ContextFile,
    SourceFile,
    SecretReport,
    Output,
}

impl fmt::Display for IoPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IoPurpose::OldFile => "old file",
            IoPurpose::NewFile => "new file",
            IoPurpose::Index => "index",
            IoPurpose::ContextFile => "context file",
            IoPurpose::SourceFile => "source file",
            IoPurpose::SecretReport => "secret report",
            IoPurpose::Output => "output file",
        };
        f.write_str(text)
    }
}

/// Why an I/O operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoFailure {
    NotFound,
    Other(String),
}

impl fmt::Display for IoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoFailure::NotFound => f.write_str("file not found"),
            IoFailure::Other(reason) => f.write_str(reason),
        }
    }
}

impl From<RuntimeError> for IoFailure {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::FileNotFound(_) => IoFailure::NotFound,
            other => IoFailure::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StampError {
    /// A source file could not be parsed.
    #[error("failed to parse {entry_id}: {message}")]
    Parse { entry_id: String, message: String },

    /// Facts were extracted but no contract could be derived from them.
    #[error("cannot build contract for {entry_id}: {reason}")]
    Contract { entry_id: String, reason: String },

    /// Strict mode: a bundle referenced names that resolve to no graph node.
    #[error("bundle for {entry_id} has {} unresolved dependencies: {}", names.len(), names.join(", "))]
    MissingDependencies { entry_id: String, names: Vec<String> },

    /// The requested bundle entry is not part of the dependency graph.
    #[error("entry '{0}' is not in the dependency graph")]
    UnknownEntry(String),

    /// A loaded index has an unexpected discriminator or schema version.
    #[error("{} has unsupported {field}: expected {expected}, found {actual}", path.display())]
    ManifestSchema {
        path: PathBuf,
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("failed to {action} {purpose} '{}': {failure}", path.display())]
    Io {
        path: PathBuf,
        purpose: IoPurpose,
        action: &'static str,
        failure: IoFailure,
    },

    #[error("invalid JSON in {purpose} '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        purpose: IoPurpose,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    EntryId(#[from] EntryIdError),

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StampError {
    pub fn read(path: &Path, purpose: IoPurpose, err: RuntimeError) -> Self {
        Self::io(path, purpose, "read", err)
    }

    pub fn write(path: &Path, purpose: IoPurpose, err: RuntimeError) -> Self {
        Self::io(path, purpose, "write", err)
    }

    pub fn io(path: &Path, purpose: IoPurpose, action: &'static str, err: RuntimeError) -> Self {
        StampError::Io {
            path: path.to_path_buf(),
            purpose,
            action,
            failure: err.into(),
        }
    }

    pub fn json(path: &Path, purpose: IoPurpose, source: serde_json::Error) -> Self {
        StampError::Json {
            path: path.to_path_buf(),
            purpose,
            source,
        }
    }

    /// True for I/O errors caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StampError::Io {
                failure: IoFailure::NotFound,
                ..
            }
        )
    }
}
