//! Dependency graph construction.
//!
//! Performance characteristics:
//! - Build: O(|M| + |D|) resolutions, where M = modules, D = declarations
//! - Module-level reachability: O(|V| + |E|) single multi-source BFS
//!
//! The graph is built once per run from extracted declarations and is
//! immutable afterwards. Every edge endpoint and every re-export target is
//! guaranteed to be a node, even when that module contributes no exports.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet, VecDeque};

use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::{DeadexportError, DeadexportResult};
use crate::extract::{ExportDeclKind, ExtractedDeclarations, NAMESPACE};
use crate::module_id::ModuleId;
use crate::resolve::{is_bare_specifier, FileProbe, Resolver};

/// What an exported name is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportKind {
    /// A binding defined by the exporting module.
    Value,
    /// A transparent conduit to `name` in module `target`.
    ReExport { target: ModuleId, name: String },
}

/// An exported symbol of exactly one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSymbol {
    pub module: ModuleId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ExportKind,
    pub line: usize,
}

impl ExportSymbol {
    pub fn is_reexport(&self) -> bool {
        matches!(self.kind, ExportKind::ReExport { .. })
    }
}

/// Why one module depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `import { name as alias } from '...'`, `import * as ns`, `require(...)`
    Import,
    /// Dependency created by a forwarding export (`export { x } from`, `export *`)
    ReExport,
    /// `import '...'` with no bindings
    SideEffect,
}

/// One imported name crossing from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEdge {
    pub from: ModuleId,
    pub to: ModuleId,
    pub imported_name: String,
    pub local_alias: String,
    pub kind: EdgeKind,
}

impl ImportEdge {
    pub fn import(
        from: &ModuleId,
        to: &ModuleId,
        imported_name: impl Into<String>,
        local_alias: impl Into<String>,
    ) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            imported_name: imported_name.into(),
            local_alias: local_alias.into(),
            kind: EdgeKind::Import,
        }
    }

    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_self_import(&self) -> bool {
        self.from == self.to
    }
}

/// A module node: its export surface and its `export *` targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleNode {
    pub id: ModuleId,
    pub exports: BTreeMap<String, ExportSymbol>,
    pub star_targets: Vec<ModuleId>,
    /// False for nodes added only because an edge points at them
    pub submitted: bool,
}

impl ModuleNode {
    pub fn new(id: &ModuleId) -> Self {
        Self {
            id: id.clone(),
            exports: BTreeMap::new(),
            star_targets: Vec::new(),
            submitted: true,
        }
    }

    fn placeholder(id: &ModuleId) -> Self {
        Self {
            submitted: false,
            ..Self::new(id)
        }
    }

    /// Add an export, replacing any earlier export of the same name.
    pub fn add_export(&mut self, name: impl Into<String>, kind: ExportKind, line: usize) {
        let name = name.into();
        self.exports.insert(
            name.clone(),
            ExportSymbol {
                module: self.id.clone(),
                name,
                kind,
                line,
            },
        );
    }

    pub fn export(&self, name: &str) -> Option<&ExportSymbol> {
        self.exports.get(name)
    }
}

/// Module-to-module graph annotated with the symbols crossing each edge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    modules: BTreeMap<ModuleId, ModuleNode>,
    edges: Vec<ImportEdge>,
}

impl DependencyGraph {
    /// Assemble a graph from raw parts without checking invariants.
    ///
    /// [`GraphBuilder`] is the normal way to obtain a graph. Graphs assembled
    /// here are checked by [`DependencyGraph::validate`] before analysis.
    pub fn from_parts(modules: Vec<ModuleNode>, edges: Vec<ImportEdge>) -> Self {
        let modules = modules
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();
        Self { modules, edges }
    }

    pub fn module(&self, id: &str) -> Option<&ModuleNode> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Canonical identifier stored in the graph for `id`.
    pub fn module_id(&self, id: &str) -> Option<&ModuleId> {
        self.modules.get_key_value(id).map(|(k, _)| k)
    }

    /// Modules in identifier order.
    pub fn modules(&self) -> impl Iterator<Item = (&ModuleId, &ModuleNode)> {
        self.modules.iter()
    }

    pub fn edges(&self) -> &[ImportEdge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ImportEdge> + 'a {
        self.edges.iter().filter(move |e| e.from.as_str() == id)
    }

    pub fn edges_into<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ImportEdge> + 'a {
        self.edges.iter().filter(move |e| e.to.as_str() == id)
    }

    pub fn export(&self, module: &str, name: &str) -> Option<&ExportSymbol> {
        self.modules.get(module).and_then(|m| m.exports.get(name))
    }

    /// Every export in module order, then name order.
    pub fn exports(&self) -> impl Iterator<Item = &ExportSymbol> {
        self.modules.values().flat_map(|m| m.exports.values())
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn export_count(&self) -> usize {
        self.modules.values().map(|m| m.exports.len()).sum()
    }

    /// Check the structural invariants the reachability engine relies on.
    pub fn validate(&self) -> DeadexportResult<()> {
        for (id, node) in &self.modules {
            for symbol in node.exports.values() {
                if &symbol.module != id {
                    return Err(DeadexportError::invalid_graph(format!(
                        "export '{}' of {} is attributed to {}",
                        symbol.name, id, symbol.module
                    )));
                }
                if let ExportKind::ReExport { target, .. } = &symbol.kind {
                    if !self.modules.contains_key(target) {
                        return Err(DeadexportError::invalid_graph(format!(
                            "re-export '{}' of {} targets missing module {}",
                            symbol.name, id, target
                        )));
                    }
                }
            }
            let missing_star = node
                .star_targets
                .iter()
                .find(|t| !self.modules.contains_key(*t));
            if let Some(target) = missing_star {
                return Err(DeadexportError::invalid_graph(format!(
                    "star re-export of {} targets missing module {}",
                    id, target
                )));
            }
        }

        for edge in &self.edges {
            for end in [&edge.from, &edge.to] {
                if !self.modules.contains_key(end) {
                    return Err(DeadexportError::invalid_graph(format!(
                        "edge {} -> {} ('{}') references missing module {}",
                        edge.from, edge.to, edge.imported_name, end
                    )));
                }
            }
        }

        Ok(())
    }

    /// Module-level view as a petgraph `DiGraphMap`.
    ///
    /// Uses `DiGraphMap<&str, ()>`: string slices borrow from the graph and
    /// parallel edges collapse into one.
    pub fn module_graph(&self) -> DiGraphMap<&str, ()> {
        self.module_graph_where(|_| true)
    }

    /// Module-level view over edges that load the target at run time.
    ///
    /// `ReExport` edges are left out: forwarding a binding does not execute
    /// the module it comes from unless someone imports it.
    pub fn execution_graph(&self) -> DiGraphMap<&str, ()> {
        self.module_graph_where(|edge| edge.kind != EdgeKind::ReExport)
    }

    fn module_graph_where(&self, keep: impl Fn(&ImportEdge) -> bool) -> DiGraphMap<&str, ()> {
        let mut g = DiGraphMap::new();
        for id in self.modules.keys() {
            g.add_node(id.as_str());
        }
        for edge in self.edges.iter().filter(|e| keep(e)) {
            if self.modules.contains_key(&edge.from) && self.modules.contains_key(&edge.to) {
                g.add_edge(edge.from.as_str(), edge.to.as_str(), ());
            }
        }
        g
    }
}

/// Performs multi-source BFS to find all modules reachable from a set of roots.
///
/// Complexity: O(|V| + |E|) regardless of the number of roots.
/// Roots missing from the graph are skipped with a warning.
pub fn reachable_from_roots<'a>(
    g: &DiGraphMap<&'a str, ()>,
    roots: impl IntoIterator<Item = &'a str>,
) -> HashSet<&'a str> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for root in roots {
        if g.contains_node(root) {
            if visited.insert(root) {
                queue.push_back(root);
            }
        } else {
            warn!(root = %root, "entry module not found in graph");
        }
    }

    while let Some(node) = queue.pop_front() {
        for n in g.neighbors(node) {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }
    }

    visited
}

/// Result of a graph build: the graph plus every recovered problem.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub graph: DependencyGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a [`DependencyGraph`] from per-module declarations.
///
/// The resolver (and the file probe inside it) is passed in explicitly, so
/// independent runs never share state.
pub struct GraphBuilder<'r, P: FileProbe> {
    resolver: &'r Resolver<P>,
}

impl<'r, P: FileProbe> GraphBuilder<'r, P> {
    pub fn new(resolver: &'r Resolver<P>) -> Self {
        Self { resolver }
    }

    /// Build the graph. Submissions are processed in order; a module submitted
    /// again with different declarations is reported and skipped.
    pub fn build<I>(&self, modules: I) -> BuildOutcome
    where
        I: IntoIterator<Item = (ModuleId, ExtractedDeclarations)>,
    {
        let mut diagnostics = Vec::new();
        let mut accepted: BTreeMap<ModuleId, ExtractedDeclarations> = BTreeMap::new();

        for (id, decls) in modules {
            match accepted.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(decls);
                }
                Entry::Occupied(existing) => {
                    if existing.get() == &decls {
                        debug!(module = %existing.key(), "identical resubmission ignored");
                    } else {
                        let err = DeadexportError::duplicate(
                            existing.key(),
                            "submitted twice with conflicting declarations; keeping the first",
                        );
                        warn!(error = %err, "duplicate module");
                        diagnostics.push(Diagnostic::from_error(existing.key(), &err));
                    }
                }
            }
        }

        let mut nodes: BTreeMap<ModuleId, ModuleNode> = BTreeMap::new();
        let mut edges: Vec<ImportEdge> = Vec::new();

        for (id, decls) in &accepted {
            let node = self.build_node(id, decls, &mut edges, &mut diagnostics);
            nodes.insert(id.clone(), node);
        }

        // Every edge endpoint must be a node, even one that was never submitted.
        for edge in &edges {
            if !nodes.contains_key(&edge.to) {
                debug!(module = %edge.to, "adding placeholder node for edge target");
                nodes.insert(edge.to.clone(), ModuleNode::placeholder(&edge.to));
            }
        }

        debug!(
            modules = nodes.len(),
            edges = edges.len(),
            diagnostics = diagnostics.len(),
            "dependency graph built"
        );

        BuildOutcome {
            graph: DependencyGraph {
                modules: nodes,
                edges,
            },
            diagnostics,
        }
    }

    fn build_node(
        &self,
        id: &ModuleId,
        decls: &ExtractedDeclarations,
        edges: &mut Vec<ImportEdge>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ModuleNode {
        let mut node = ModuleNode::new(id);

        // Exports: last declaration of a name wins.
        for decl in &decls.exports {
            let kind = match &decl.kind {
                ExportDeclKind::Value => ExportKind::Value,
                ExportDeclKind::ReExport { source, .. } if is_bare_specifier(source) => {
                    ExportKind::Value
                }
                ExportDeclKind::ReExport { source, name } => {
                    match self.resolve(id, source, decl.line, diagnostics) {
                        Some(target) => ExportKind::ReExport {
                            target,
                            name: name.clone(),
                        },
                        None => ExportKind::Value,
                    }
                }
            };
            node.add_export(decl.name.clone(), kind, decl.line);
        }

        // Forwarding edges come from the surviving export table only.
        for symbol in node.exports.values() {
            if let ExportKind::ReExport { target, name } = &symbol.kind {
                edges.push(
                    ImportEdge::import(id, target, name.clone(), symbol.name.clone())
                        .with_kind(EdgeKind::ReExport),
                );
            }
        }

        for source in &decls.star_reexports {
            if is_bare_specifier(source) {
                continue;
            }
            if let Some(target) = self.resolve(id, source, 0, diagnostics) {
                if !node.star_targets.contains(&target) {
                    edges.push(
                        ImportEdge::import(id, &target, NAMESPACE, NAMESPACE)
                            .with_kind(EdgeKind::ReExport),
                    );
                    node.star_targets.push(target);
                }
            }
        }

        for import in &decls.imports {
            if is_bare_specifier(&import.source) {
                debug!(module = %id, source = %import.source, "skipping package import");
                continue;
            }
            let Some(target) = self.resolve(id, &import.source, import.line, diagnostics) else {
                continue;
            };
            let kind = if import.is_side_effect() {
                EdgeKind::SideEffect
            } else {
                EdgeKind::Import
            };
            edges.push(
                ImportEdge::import(id, &target, import.name.clone(), import.alias.clone())
                    .with_kind(kind),
            );
        }

        node
    }

    /// Resolve one specifier, turning failure into a diagnostic.
    fn resolve(
        &self,
        id: &ModuleId,
        raw: &str,
        line: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ModuleId> {
        match self.resolver.resolve(id, raw) {
            Ok(target) => Some(target),
            Err(err) => {
                warn!(module = %id, specifier = %raw, "dropping unresolved import");
                diagnostics.push(Diagnostic::from_error(id, &err).at_line(line));
                None
            }
        }
    }
}

/// Convenience: diagnostics of a given kind.
pub fn diagnostics_of(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.kind == kind).collect()
}
