//! deadexport-core: unused export detection for ECMAScript module graphs
//!
//! Given a set of JavaScript/TypeScript modules linked by `import`/`export`
//! statements and a set of entry modules, finds every exported symbol that is
//! never transitively demanded from an entry.
//!
//! # Features
//!
//! - **Module resolution**: relative and absolute specifiers, omitted
//!   extensions, directory `index` files, `.d.ts`
//! - **Re-export chains**: `export { x } from`, `export *`, namespace imports,
//!   cycle-safe traversal
//! - **Diagnostics**: unresolved imports, missing exports, and extraction
//!   failures are reported beside the findings instead of aborting
//! - **Incremental caching**: only re-extract changed files
//! - **Graphviz output**: module graph colored by liveness
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deadexport_core::prelude::*;
//!
//! let result = Deadexport::new("/path/to/project")
//!     .entries(["src/index.ts"])
//!     .analyze()?;
//!
//! for dead in &result.dead {
//!     println!("{} {}", result.relative(&dead.module), dead.export_name);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`module_id`], [`resolve`]: canonical module identity and specifier resolution
//! - [`extract`]: the extractor contract and the built-in regex extractor
//! - [`graph`]: dependency graph construction
//! - [`reach`]: export reachability engine
//! - [`builder`]: fluent pipeline API
//! - [`cache`], [`scan`], [`root`], [`config`]: project discovery and state
//! - [`report`], [`visualize`]: output
//!
//! # Cargo Features
//!
//! - `dot` (default): Graphviz DOT output
//! - `full`: Enable all optional features

pub mod builder;
pub mod cache;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod extract;
pub mod graph;
pub mod logging;
pub mod module_id;
pub mod prelude;
pub mod reach;
pub mod report;
pub mod resolve;
pub mod root;
pub mod scan;

#[cfg(feature = "dot")]
pub mod visualize;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// Error types
pub use error::{DeadexportError, DeadexportResult, IoResultExt};

// Diagnostics
pub use diagnostic::{Diagnostic, DiagnosticKind};

// Module identity
pub use module_id::{normalize_path_string, path_to_normalized_string, ModuleId};
pub use resolve::{
    is_bare_specifier, FileProbe, KnownFiles, Resolver, ResolverOptions, DEFAULT_EXTENSIONS,
};

// Extraction
pub use extract::{
    DeclarationExtractor, EsExtractor, ExportDecl, ExportDeclKind, ExtractedDeclarations,
    ImportDecl, DEFAULT_EXPORT, NAMESPACE,
};

// Graph building
pub use graph::{
    reachable_from_roots, BuildOutcome, DependencyGraph, EdgeKind, ExportKind, ExportSymbol,
    GraphBuilder, ImportEdge, ModuleNode,
};

// Reachability
pub use reach::{
    compute_reachability, ExportRecord, ReachabilityOptions, ReachabilitySet, UsageSite, Verdict,
};

// Builder API
pub use builder::{AnalysisResult, AnalysisStats, Deadexport};

// Cache types
pub use cache::{
    file_hash, incremental_extract, load_cache, save_cache, CacheMetadata, CachedModule,
    DeadexportCache, ExtractionOutcome,
};

// Configuration
pub use config::{load_config, DeadexportConfig, OutputConfig};

// Logging
pub use logging::{init_structured_logging, log_error, log_event, log_info, log_warn};

// Reporting
pub use report::{json_value, print_json, print_plain, render_plain};

// Entry detection
pub use root::find_entry_modules;

// File scanning
pub use scan::{gather_source_files, gather_source_files_with, has_source_extension};

#[cfg(feature = "dot")]
pub use visualize::generate_dot;


#[cfg(test)]
mod proptests;
