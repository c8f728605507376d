//! Module identity resolution.
//!
//! Turns a raw import specifier (`./dir1/file4`, `../lib`, `/abs/x.js`) into
//! the [`ModuleId`] of the file it denotes. Resolution is a pure function of
//! its inputs plus a [`FileProbe`] answering "does this file exist".
//!
//! Candidate order:
//! 1. the joined path itself, if it already carries an extension
//! 2. the joined path plus each configured extension
//! 3. `<path>/index` plus each configured extension

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::error::{DeadexportError, DeadexportResult};
use crate::module_id::{path_to_normalized_string, ModuleId};

/// Extensions tried when an import omits one.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".d.ts"];

/// Answers file-existence questions for the resolver.
pub trait FileProbe: Send + Sync {
    /// Returns true if `path` (already cleaned, forward slashes) is a known file.
    fn is_file(&self, path: &str) -> bool;
}

/// In-memory probe over a fixed set of files, typically the scanned project.
#[derive(Debug, Clone, Default)]
pub struct KnownFiles {
    files: HashSet<String>,
    case_insensitive: bool,
}

impl KnownFiles {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::with_case(files, false)
    }

    pub fn with_case<I, P>(files: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = files
            .into_iter()
            .map(|p| ModuleId::with_case(p, case_insensitive).as_str().to_string())
            .collect();
        Self {
            files,
            case_insensitive,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileProbe for KnownFiles {
    fn is_file(&self, path: &str) -> bool {
        if self.case_insensitive {
            self.files.contains(&path.to_lowercase())
        } else {
            self.files.contains(path)
        }
    }
}

/// Resolver options.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Extensions appended to extensionless specifiers, in priority order
    pub extensions: Vec<String>,
    /// Lowercase canonical identifiers
    pub case_insensitive: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            case_insensitive: false,
        }
    }
}

/// Stateless specifier resolver.
pub struct Resolver<P: FileProbe> {
    probe: P,
    options: ResolverOptions,
}

impl<P: FileProbe> Resolver<P> {
    pub fn new(probe: P) -> Self {
        Self::with_options(probe, ResolverOptions::default())
    }

    pub fn with_options(probe: P, options: ResolverOptions) -> Self {
        Self { probe, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Canonical identifier for a path that is already known to exist.
    pub fn module_id(&self, path: impl AsRef<Path>) -> ModuleId {
        ModuleId::with_case(path, self.options.case_insensitive)
    }

    /// Resolve `raw` as written in module `from`.
    ///
    /// Idempotent: an already-canonical identifier resolves to itself.
    pub fn resolve(&self, from: &ModuleId, raw: &str) -> DeadexportResult<ModuleId> {
        if raw.trim().is_empty() {
            return Err(DeadexportError::unresolved(from, raw, Vec::new()));
        }

        let joined: PathBuf = if raw.starts_with('/') {
            PathBuf::from(raw)
        } else {
            from.dir().join(raw)
        };
        let base = path_to_normalized_string(&joined.clean());
        let base = base.trim_end_matches('/').to_string();

        let mut tried = Vec::new();
        for candidate in self.candidates(&base, raw.ends_with('/')) {
            if self.probe.is_file(&candidate) {
                return Ok(self.module_id(&candidate));
            }
            tried.push(candidate);
        }

        Err(DeadexportError::unresolved(from, raw, tried))
    }

    fn candidates(&self, base: &str, directory_only: bool) -> Vec<String> {
        let exts = &self.options.extensions;
        let mut out = Vec::with_capacity(exts.len() * 2 + 1);

        if !directory_only {
            if Path::new(base).extension().is_some() {
                out.push(base.to_string());
            }
            out.extend(exts.iter().map(|ext| format!("{}{}", base, ext)));
        }
        out.extend(exts.iter().map(|ext| format!("{}/index{}", base, ext)));
        out
    }
}

/// Returns true for specifiers naming an installed package rather than a file.
///
/// Only `.`-relative and `/`-absolute specifiers point into the project.
pub fn is_bare_specifier(raw: &str) -> bool {
    !(raw.starts_with('.') || raw.starts_with('/'))
}
