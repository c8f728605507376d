//! Typed error handling for deadexport.
//!
//! Provides structured errors that library consumers can match on,
//! with full context about what went wrong and where.

use std::path::PathBuf;
use thiserror::Error;

use crate::module_id::ModuleId;

/// Main error type for deadexport operations.
///
/// The three analysis kinds (`UnresolvedPath`, `DuplicateModule`,
/// `InvalidGraph`) come from the core pipeline. The rest are ambient.
#[derive(Error, Debug)]
pub enum DeadexportError {
    /// An import specifier could not be located after trying every candidate.
    #[error("Unresolved import '{raw}' from {from}")]
    UnresolvedPath {
        from: ModuleId,
        raw: String,
        /// Candidate paths that were probed, in order
        tried: Vec<String>,
    },

    /// The same module was submitted twice with different declarations.
    #[error("Duplicate module {module}: {message}")]
    DuplicateModule { module: ModuleId, message: String },

    /// The dependency graph violates a structural invariant.
    #[error("Invalid graph: {message}")]
    InvalidGraph { message: String },

    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Declaration extraction failed for a source file
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
    },

    /// Cache-related errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl DeadexportError {
    /// Create an unresolved-path error.
    pub fn unresolved(from: &ModuleId, raw: impl Into<String>, tried: Vec<String>) -> Self {
        Self::UnresolvedPath {
            from: from.clone(),
            raw: raw.into(),
            tried,
        }
    }

    /// Create a duplicate-module error.
    pub fn duplicate(module: &ModuleId, message: impl Into<String>) -> Self {
        Self::DuplicateModule {
            module: module.clone(),
            message: message.into(),
        }
    }

    /// Create an invalid-graph error.
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Create a parse error with line info.
    pub fn parse_at(path: impl Into<PathBuf>, message: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (analysis can continue).
    ///
    /// `InvalidGraph` is never recoverable: the verdicts would be unsound.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedPath { .. }
                | Self::DuplicateModule { .. }
                | Self::Parse { .. }
                | Self::Cache { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for deadexport results.
pub type DeadexportResult<T> = Result<T, DeadexportError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadexportResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadexportResult<T> {
        self.map_err(|e| DeadexportError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = DeadexportError::io(
            PathBuf::from("/test/file.js"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, DeadexportError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/test/file.js")));
        assert!(err.to_string().contains("/test/file.js"));
    }

    #[test]
    fn test_unresolved_message() {
        let from = ModuleId::from_path("/project/index.js");
        let err = DeadexportError::unresolved(&from, "./missing", vec![]);
        let msg = err.to_string();
        assert!(msg.contains("./missing"));
        assert!(msg.contains("/project/index.js"));
    }

    #[test]
    fn test_parse_error_with_line() {
        let err = DeadexportError::parse_at("/src/a.js", "unterminated import", 10);
        if let DeadexportError::Parse { line, .. } = &err {
            assert_eq!(*line, Some(10));
        } else {
            panic!("Expected Parse error");
        }
    }

    #[test]
    fn test_is_recoverable() {
        let id = ModuleId::from_path("/a.js");
        assert!(DeadexportError::unresolved(&id, "./b", vec![]).is_recoverable());
        assert!(DeadexportError::duplicate(&id, "conflict").is_recoverable());
        assert!(DeadexportError::parse("/a.js", "error").is_recoverable());
        assert!(!DeadexportError::invalid_graph("dangling edge").is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let mapped = result.with_path("/missing/file.js");
        assert!(mapped.is_err());
    }
}
