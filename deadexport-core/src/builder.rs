//! Builder pattern API for deadexport analysis.
//!
//! Provides a fluent interface for configuring and running the pipeline
//! (scan, extract, build graph, compute reachability):
//!
//! ```rust,ignore
//! use deadexport_core::prelude::*;
//!
//! let result = Deadexport::new("/path/to/project")
//!     .entries(["src/index.ts"])
//!     .with_cache(true)
//!     .analyze()?;
//!
//! for dead in &result.dead {
//!     println!("{} {}", dead.module, dead.export_name);
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache;
use crate::config::DeadexportConfig;
use crate::diagnostic::Diagnostic;
use crate::error::DeadexportError;
use crate::extract::{EsExtractor, ExtractedDeclarations};
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::module_id::ModuleId;
use crate::reach::{compute_reachability, ExportRecord, ReachabilityOptions};
use crate::resolve::{is_bare_specifier, KnownFiles, Resolver, ResolverOptions};
use crate::root::find_entry_modules;
use crate::scan::gather_source_files_with;

/// Builder for configuring unused-export analysis.
#[derive(Debug, Clone)]
pub struct Deadexport {
    /// Root path of the project to analyze
    root: PathBuf,

    /// Entry modules relative to `root`; detected when empty
    entries: Vec<String>,

    /// Whether to use incremental caching
    use_cache: bool,

    /// Custom excluded directories
    excluded_dirs: Vec<String>,

    /// Export/module name patterns left out of the dead list
    ignored_patterns: Vec<String>,

    /// Resolution and scan extensions; defaults when `None`
    extensions: Option<Vec<String>>,

    case_insensitive: bool,

    entry_exports_used: bool,

    /// Fail on the first unreadable or rejected file instead of recording it
    strict: bool,
}

impl Deadexport {
    /// Create a new analysis builder for the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
            use_cache: true,
            excluded_dirs: Vec::new(),
            ignored_patterns: Vec::new(),
            extensions: None,
            case_insensitive: false,
            entry_exports_used: false,
            strict: false,
        }
    }

    /// Apply settings from a loaded `deadexport.toml`.
    ///
    /// Call before the other setters so explicit values win.
    pub fn with_config(mut self, cfg: &DeadexportConfig) -> Self {
        if let Some(entries) = &cfg.entries {
            self.entries.extend(entries.iter().cloned());
        }
        if let Some(ignore) = &cfg.ignore {
            self.ignored_patterns.extend(ignore.iter().cloned());
        }
        if let Some(dirs) = &cfg.exclude_dirs {
            self.excluded_dirs.extend(dirs.iter().cloned());
        }
        if let Some(exts) = &cfg.extensions {
            self.extensions = Some(exts.clone());
        }
        if let Some(ci) = cfg.case_insensitive {
            self.case_insensitive = ci;
        }
        if let Some(used) = cfg.entry_exports_used {
            self.entry_exports_used = used;
        }
        self
    }

    /// Add entry modules, relative to the project root.
    pub fn entries(mut self, entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.entries.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Enable or disable incremental caching.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add patterns for exports or modules to ignore.
    pub fn ignore_patterns(
        mut self,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.ignored_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Override the source extensions, in resolution priority order.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Count every export of an entry module as used.
    pub fn entry_exports_used(mut self, enabled: bool) -> Self {
        self.entry_exports_used = enabled;
        self
    }

    /// Abort on the first file that cannot be read or that the extractor rejects.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        let root = fs::canonicalize(&self.root)
            .with_context(|| format!("Project root not found: {}", self.root.display()))?;

        let resolver_options = match &self.extensions {
            Some(exts) => ResolverOptions {
                extensions: exts.clone(),
                case_insensitive: self.case_insensitive,
            },
            None => ResolverOptions {
                case_insensitive: self.case_insensitive,
                ..ResolverOptions::default()
            },
        };

        // 1. Gather files
        let excludes: Vec<&str> = self.excluded_dirs.iter().map(String::as_str).collect();
        let files = gather_source_files_with(&root, &excludes, &resolver_options.extensions)
            .context("Failed to gather source files")?;

        // 2. Extract declarations (incremental if cache available)
        let cached = if self.use_cache {
            cache::load_cache(&root)
        } else {
            None
        };
        let extraction = cache::incremental_extract(
            &files,
            cached.as_ref(),
            &EsExtractor::new(),
            self.case_insensitive,
        );

        if self.use_cache {
            if let Err(e) = cache::save_cache(&root, &extraction.cache) {
                warn!(error = %e, "cache save failed");
            }
        }

        let mut diagnostics = Vec::new();
        let mut modules = extraction.modules;
        for (id, error) in extraction.failures {
            if self.strict {
                return Err(error).context("Unreadable source file in strict mode");
            }
            diagnostics.push(Diagnostic::from_error(&id, &error));
            modules.push((id, ExtractedDeclarations::default()));
        }

        // 3. Build the graph
        let probe = KnownFiles::with_case(&files, self.case_insensitive);
        let resolver = Resolver::with_options(probe, resolver_options);
        let outcome = GraphBuilder::new(&resolver).build(modules);
        diagnostics.extend(outcome.diagnostics);
        let graph = outcome.graph;

        // 4. Entries
        let entries = self.resolve_entries(&root, &resolver)?;
        if entries.is_empty() {
            warn!(root = %root.display(), "no entry modules found; every export is dead");
        }

        // 5. Reachability
        let reach = compute_reachability(
            &graph,
            &entries,
            ReachabilityOptions {
                entry_exports_used: self.entry_exports_used,
            },
        )
        .context("Reachability analysis failed")?;
        diagnostics.extend(reach.diagnostics().iter().cloned());
        diagnostics.sort();
        diagnostics.dedup();

        let live_modules = reach.live_modules().clone();
        let records = reach.into_records();
        let mut ignored = 0;
        let dead: Vec<ExportRecord> = records
            .iter()
            .filter(|r| !r.used)
            .filter(|r| {
                let skip = self.is_ignored(&r.export_name)
                    || self.is_ignored(&r.module.display_relative(&root));
                if skip {
                    ignored += 1;
                }
                !skip
            })
            .cloned()
            .collect();

        let stats = AnalysisStats {
            files: files.len(),
            modules: graph.module_count(),
            live_modules: live_modules.len(),
            edges: graph.edge_count(),
            exports: records.len(),
            used: records.iter().filter(|r| r.used).count(),
            dead: dead.len(),
            ignored,
            cache_hits: extraction.cache_hits,
        };
        info!(
            files = stats.files,
            exports = stats.exports,
            dead = stats.dead,
            diagnostics = diagnostics.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            root,
            entries,
            records,
            dead,
            diagnostics,
            stats,
            graph,
            live_modules,
        })
    }

    /// Configured entries resolved like imports from the root, else detected ones.
    fn resolve_entries(
        &self,
        root: &std::path::Path,
        resolver: &Resolver<KnownFiles>,
    ) -> Result<Vec<ModuleId>> {
        if self.entries.is_empty() {
            return Ok(find_entry_modules(root)
                .into_iter()
                .map(|p| resolver.module_id(p))
                .collect());
        }

        // A file name inside the root, so relative entries join onto the root.
        let anchor = resolver.module_id(root.join("package.json"));
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let spec = if is_bare_specifier(entry) {
                format!("./{}", entry)
            } else {
                entry.clone()
            };
            match resolver.resolve(&anchor, &spec) {
                Ok(id) => out.push(id),
                Err(DeadexportError::UnresolvedPath { tried, .. }) => {
                    bail!(DeadexportError::invalid_argument(format!(
                        "entry '{}' matches no source file (tried {})",
                        entry,
                        tried.join(", ")
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Check if a name matches any ignored pattern.
    fn is_ignored(&self, name: &str) -> bool {
        for pattern in self.ignored_patterns.iter().filter(|p| !p.is_empty()) {
            if let Some(prefix) = pattern.strip_suffix('*') {
                if name.starts_with(prefix) {
                    return true;
                }
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                if name.ends_with(suffix) {
                    return true;
                }
            } else if name.contains(pattern.as_str()) {
                return true;
            }
        }
        false
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub files: usize,
    pub modules: usize,
    pub live_modules: usize,
    pub edges: usize,
    pub exports: usize,
    pub used: usize,
    /// Dead exports after ignore patterns
    pub dead: usize,
    /// Dead exports suppressed by ignore patterns
    pub ignored: usize,
    pub cache_hits: usize,
}

/// Result of running unused-export analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Canonical root path that was analyzed
    pub root: PathBuf,

    /// Entry modules the analysis started from
    pub entries: Vec<ModuleId>,

    /// Verdict for every export, sorted by module then name
    pub records: Vec<ExportRecord>,

    /// Dead exports, minus ignored ones
    pub dead: Vec<ExportRecord>,

    /// Recovered problems (unresolved imports, extraction failures, ...)
    pub diagnostics: Vec<Diagnostic>,

    pub stats: AnalysisStats,

    /// The dependency graph, for visualization
    pub graph: DependencyGraph,

    /// Modules reachable from the entries
    pub live_modules: BTreeSet<ModuleId>,
}

impl AnalysisResult {
    /// Check if any dead export was found.
    pub fn has_dead_exports(&self) -> bool {
        !self.dead.is_empty()
    }

    pub fn dead_count(&self) -> usize {
        self.dead.len()
    }

    /// Percentage of exports that are dead.
    pub fn dead_percentage(&self) -> f64 {
        if self.stats.exports == 0 {
            0.0
        } else {
            (self.dead.len() as f64 / self.stats.exports as f64) * 100.0
        }
    }

    /// Display form of a module relative to the analyzed root.
    pub fn relative(&self, id: &ModuleId) -> String {
        id.display_relative(&self.root)
    }
}
