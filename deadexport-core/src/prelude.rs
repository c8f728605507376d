//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use deadexport_core::prelude::*;
//! ```

// Core analysis types
pub use crate::error::{DeadexportError, DeadexportResult};
pub use crate::diagnostic::{Diagnostic, DiagnosticKind};
pub use crate::module_id::ModuleId;

// Resolution and extraction
pub use crate::extract::{DeclarationExtractor, EsExtractor, ExtractedDeclarations};
pub use crate::resolve::{FileProbe, KnownFiles, Resolver};

// Graph and reachability
pub use crate::graph::{DependencyGraph, GraphBuilder};
pub use crate::reach::{compute_reachability, ExportRecord, ReachabilityOptions};

// Configuration
pub use crate::config::{load_config, DeadexportConfig};

// Builder API
pub use crate::builder::{AnalysisResult, Deadexport};
