//! Non-fatal findings attached to an analysis run.
//!
//! Recoverable errors (an import that resolves nowhere, a module submitted
//! twice) do not abort the run. They are recorded here and listed beside the
//! dead-export findings.

use std::fmt;

use serde::Serialize;

use crate::error::DeadexportError;
use crate::module_id::ModuleId;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An import or re-export specifier resolved to no file; the edge was dropped
    UnresolvedPath,
    /// A module was submitted twice with different declarations; the first was kept
    DuplicateModule,
    /// An import names something the target module does not export
    MissingExport,
    /// Declaration extraction failed; the module has no declarations
    ExtractionFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedPath => write!(f, "unresolved path"),
            Self::DuplicateModule => write!(f, "duplicate module"),
            Self::MissingExport => write!(f, "missing export"),
            Self::ExtractionFailed => write!(f, "extraction failed"),
        }
    }
}

/// A single diagnostic, keyed by the module it concerns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Diagnostic {
    pub module: ModuleId,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(module: &ModuleId, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            module: module.clone(),
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        if line > 0 {
            self.line = Some(line);
        }
        self
    }

    /// Convert a recoverable error raised while processing `module`.
    pub fn from_error(module: &ModuleId, err: &DeadexportError) -> Self {
        match err {
            DeadexportError::UnresolvedPath { .. } => {
                Self::new(module, DiagnosticKind::UnresolvedPath, err.to_string())
            }
            DeadexportError::DuplicateModule { .. } => {
                Self::new(module, DiagnosticKind::DuplicateModule, err.to_string())
            }
            DeadexportError::Parse { line, .. } => {
                let diag = Self::new(module, DiagnosticKind::ExtractionFailed, err.to_string());
                match line {
                    Some(l) => diag.at_line(*l),
                    None => diag,
                }
            }
            _ => Self::new(module, DiagnosticKind::ExtractionFailed, err.to_string()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{} {}: {}", self.module, line, self.kind, self.message),
            None => write!(f, "{} {}: {}", self.module, self.kind, self.message),
        }
    }
}
