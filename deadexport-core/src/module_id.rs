//! Canonical module identity.
//!
//! A [`ModuleId`] is the cleaned, forward-slash spelling of a module's file
//! path. Two spellings of the same file (`/p/a/../b.js`, `/p/b.js`) produce
//! the same identifier.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

/// Normalize a path string to use forward slashes consistently.
#[inline]
pub fn normalize_path_string(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert a Path to a normalized string (forward slashes).
#[inline]
pub fn path_to_normalized_string(path: &Path) -> String {
    normalize_path_string(&path.display().to_string())
}

/// Canonical identifier for a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Build an identifier from a file path. `.` and `..` segments are folded.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::with_case(path, false)
    }

    /// Build an identifier, lowercasing it when the target filesystem is
    /// case-insensitive.
    pub fn with_case(path: impl AsRef<Path>, case_insensitive: bool) -> Self {
        let cleaned = path_to_normalized_string(&path.as_ref().clean());
        if case_insensitive {
            Self(cleaned.to_lowercase())
        } else {
            Self(cleaned)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/') || self.as_path().is_absolute()
    }

    /// Directory containing this module; relative imports are joined onto it.
    pub fn dir(&self) -> &Path {
        self.as_path().parent().unwrap_or_else(|| Path::new("/"))
    }

    /// File name without directories, e.g. `file4.js`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Display form relative to a project root (`./dir1/file4.js`).
    pub fn display_relative(&self, root: &Path) -> String {
        let root = path_to_normalized_string(&root.clean());
        match self.0.strip_prefix(root.as_str()) {
            Some(rest) if rest.starts_with('/') => format!(".{}", rest),
            _ => self.0.clone(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
