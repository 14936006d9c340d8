use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Project-relative identifier for a source file.
///
/// Entry ids are always forward-slash separated and never start with `./`,
/// so artifacts produced on different machines compare equal. The original
/// casing is kept for display; [`EntryId::key`] provides the case-folded form
/// used when two generations are compared.
///
/// Normalisation is idempotent: `EntryId::new(id.as_str())` yields `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(String);

impl EntryId {
    /// Normalise a raw path string into an entry id.
    pub fn new(raw: &str) -> Result<Self, EntryIdError> {
        let unified = raw.trim().replace('\\', "/");

        if unified.is_empty() {
            return Err(EntryIdError::EmptyPath);
        }
        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(EntryIdError::Absolute(raw.to_string()));
        }

        let cleaned = PathBuf::from(&unified).clean();
        let text = cleaned.to_string_lossy().replace('\\', "/");

        if text == "." || text.is_empty() {
            return Err(EntryIdError::EmptyPath);
        }
        if text == ".." || text.starts_with("../") {
            return Err(EntryIdError::OutsideRoot(raw.to_string()));
        }

        Ok(Self(text))
    }

    /// Build an entry id for `path` relative to the project `root`.
    ///
    /// Relative paths are taken to be relative to `root` already.
    pub fn from_path(root: &Path, path: &Path) -> Result<Self, EntryIdError> {
        let relative = if path.is_absolute() {
            path.strip_prefix(root)
                .map_err(|_| EntryIdError::OutsideRoot(path.display().to_string()))?
        } else {
            path
        };
        Self::new(&relative.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded comparison key.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Final path component, e.g. `Button.tsx`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File name without its last extension, e.g. `Button`.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<Cow<'_, str>> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(dot) => {
                let ext = &name[dot + 1..];
                if ext.chars().any(|c| c.is_ascii_uppercase()) {
                    Some(Cow::Owned(ext.to_ascii_lowercase()))
                } else {
                    Some(Cow::Borrowed(ext))
                }
            }
        }
    }

    /// Containing folder, `.` for files at the project root.
    pub fn folder(&self) -> &str {
        match self.0.rfind('/') {
            Some(pos) => &self.0[..pos],
            None => ".",
        }
    }

    /// Folder path segments, excluding the file name.
    pub fn dir_segments(&self) -> impl Iterator<Item = &str> {
        let folder = self.folder();
        folder.split('/').filter(|s| !s.is_empty() && *s != ".")
    }
}

fn has_drive_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        EntryId::new(&value).map_err(serde::de::Error::custom)
    }
}

/// Error type for `EntryId` construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryIdError {
    #[error("entry id path is empty")]
    EmptyPath,

    #[error("entry id must be project-relative, got absolute path '{0}'")]
    Absolute(String),

    #[error("path '{0}' lies outside the project root")]
    OutsideRoot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        let id = EntryId::new(".\\src\\components\\..\\components\\Button.tsx").unwrap();
        assert_eq!(id.as_str(), "src/components/Button.tsx");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["./src/a.ts", "src//b.tsx", "src/x/../c.vue", "App.jsx"] {
            let once = EntryId::new(raw).unwrap();
            let twice = EntryId::new(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn keeps_case_but_keys_fold_it() {
        let a = EntryId::new("src/Button.tsx").unwrap();
        let b = EntryId::new("SRC/button.tsx").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn rejects_absolute_and_escaping_paths() {
        assert!(matches!(EntryId::new("/abs/a.ts"), Err(EntryIdError::Absolute(_))));
        assert!(matches!(EntryId::new("C:/a.ts"), Err(EntryIdError::Absolute(_))));
        assert!(matches!(EntryId::new("../a.ts"), Err(EntryIdError::OutsideRoot(_))));
        assert!(matches!(EntryId::new("  "), Err(EntryIdError::EmptyPath)));
        assert!(matches!(EntryId::new("./"), Err(EntryIdError::EmptyPath)));
    }

    #[test]
    fn from_path_strips_root() {
        let root = Path::new("/work/project");
        let id = EntryId::from_path(root, Path::new("/work/project/src/App.tsx")).unwrap();
        assert_eq!(id.as_str(), "src/App.tsx");
        assert!(EntryId::from_path(root, Path::new("/elsewhere/App.tsx")).is_err());
    }

    #[test]
    fn path_parts() {
        let id = EntryId::new("src/app/(marketing)/page.tsx").unwrap();
        assert_eq!(id.file_name(), "page.tsx");
        assert_eq!(id.file_stem(), "page");
        assert_eq!(id.extension().as_deref(), Some("tsx"));
        assert_eq!(id.folder(), "src/app/(marketing)");
        assert_eq!(
            id.dir_segments().collect::<Vec<_>>(),
            vec!["src", "app", "(marketing)"]
        );

        let root_file = EntryId::new("index.ts").unwrap();
        assert_eq!(root_file.folder(), ".");
        assert_eq!(root_file.dir_segments().count(), 0);
    }

    #[test]
    fn serde_normalizes_on_read() {
        let id: EntryId = serde_json::from_str("\"./src\\\\a.ts\"").unwrap();
        assert_eq!(id.as_str(), "src/a.ts");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"src/a.ts\"");
    }
}
