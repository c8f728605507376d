//! Export reachability analysis.
//!
//! Decides, for every `(module, export)` pair in a [`DependencyGraph`], whether
//! the export is transitively demanded by an import reachable from the entry
//! modules.
//!
//! The traversal is an explicit work queue over an arena of demand keys.
//! Each key carries the set of import sites that caused it; a key is queued
//! again only when that set grows, so re-export cycles terminate.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::DeadexportResult;
use crate::extract::{DEFAULT_EXPORT, NAMESPACE};
use crate::graph::{reachable_from_roots, DependencyGraph, EdgeKind, ExportKind};
use crate::module_id::ModuleId;

/// Knobs for [`compute_reachability`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachabilityOptions {
    /// Treat every export of an entry module as used
    pub entry_exports_used: bool,
}

/// A place that demanded an export: the importing module and the name it asked for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UsageSite {
    pub module: ModuleId,
    pub name: String,
}

/// Verdict for one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub used: bool,
    /// Import sites (or entry exports) that caused `used`, sorted
    pub triggers: Vec<UsageSite>,
}

/// One row of the engine's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    pub module: ModuleId,
    pub export_name: String,
    #[serde(flatten)]
    pub kind: ExportKind,
    pub used: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<UsageSite>,
    pub line: usize,
}

/// Result of a reachability run. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ReachabilitySet {
    verdicts: BTreeMap<(ModuleId, String), Verdict>,
    records: Vec<ExportRecord>,
    live_modules: BTreeSet<ModuleId>,
    diagnostics: Vec<Diagnostic>,
}

impl ReachabilitySet {
    pub fn is_used(&self, module: &str, name: &str) -> bool {
        self.verdict(module, name).map(|v| v.used).unwrap_or(false)
    }

    pub fn verdict(&self, module: &str, name: &str) -> Option<&Verdict> {
        self.verdicts
            .get(&(ModuleId::from_path(module), name.to_string()))
    }

    /// All verdicts keyed by `(module, export name)`.
    pub fn verdicts(&self) -> &BTreeMap<(ModuleId, String), Verdict> {
        &self.verdicts
    }

    /// Records sorted by module, then export name.
    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ExportRecord> {
        self.records
    }

    pub fn dead(&self) -> impl Iterator<Item = &ExportRecord> {
        self.records.iter().filter(|r| !r.used)
    }

    pub fn is_live(&self, module: &str) -> bool {
        self.live_modules.contains(module)
    }

    pub fn live_modules(&self) -> &BTreeSet<ModuleId> {
        &self.live_modules
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn used_count(&self) -> usize {
        self.records.iter().filter(|r| r.used).count()
    }

    pub fn dead_count(&self) -> usize {
        self.records.len() - self.used_count()
    }
}

/// What a demand asks of a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Wanted {
    Name(String),
    /// `import * as ns`: every export
    All,
    /// Namespace seen through `export *`: every export but `default`
    AllButDefault,
}

type DemandKey = (ModuleId, Wanted);

/// Arena of demand keys with per-key site sets and queue marks.
#[derive(Default)]
struct DemandArena {
    keys: Vec<DemandKey>,
    index: HashMap<DemandKey, usize>,
    sites: Vec<BTreeSet<usize>>,
    queued: Vec<bool>,
    /// Modules that named this key directly (import or re-export), for diagnostics
    requested_by: Vec<BTreeSet<ModuleId>>,
    queue: VecDeque<usize>,
}

impl DemandArena {
    fn key_index(&mut self, key: DemandKey) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.keys.len();
        self.index.insert(key.clone(), i);
        self.keys.push(key);
        self.sites.push(BTreeSet::new());
        self.queued.push(false);
        self.requested_by.push(BTreeSet::new());
        i
    }

    /// Merge `sites` into the key; queue it if anything new arrived.
    fn demand(&mut self, key: DemandKey, sites: &BTreeSet<usize>) -> usize {
        let i = self.key_index(key);
        let before = self.sites[i].len();
        self.sites[i].extend(sites.iter().copied());
        if self.sites[i].len() > before && !self.queued[i] {
            self.queued[i] = true;
            self.queue.push_back(i);
        }
        i
    }

    fn pop(&mut self) -> Option<usize> {
        let i = self.queue.pop_front()?;
        self.queued[i] = false;
        Some(i)
    }
}

/// Interned usage sites, so site sets stay small integer sets.
#[derive(Default)]
struct SiteTable {
    table: Vec<UsageSite>,
    index: HashMap<UsageSite, usize>,
}

impl SiteTable {
    fn intern(&mut self, site: UsageSite) -> usize {
        if let Some(&i) = self.index.get(&site) {
            return i;
        }
        let i = self.table.len();
        self.index.insert(site.clone(), i);
        self.table.push(site);
        i
    }
}

/// Mark everything `roots` executes as live and seed the imports of each
/// newly live module.
fn activate<'a>(
    graph: &DependencyGraph,
    execution: &DiGraphMap<&'a str, ()>,
    roots: impl IntoIterator<Item = &'a str>,
    live: &mut BTreeSet<ModuleId>,
    sites: &mut SiteTable,
    arena: &mut DemandArena,
) {
    let mut fresh: Vec<ModuleId> = reachable_from_roots(execution, roots)
        .into_iter()
        .filter_map(|id| graph.module_id(id))
        .filter(|id| !live.contains(*id))
        .cloned()
        .collect();
    fresh.sort();

    for module in fresh {
        for edge in graph.edges_from(module.as_str()) {
            if edge.kind != EdgeKind::Import {
                continue;
            }
            if edge.is_self_import() {
                debug!(module = %edge.from, name = %edge.imported_name, "ignoring self-import");
                continue;
            }
            let site = sites.intern(UsageSite {
                module: edge.from.clone(),
                name: edge.imported_name.clone(),
            });
            let wanted = if edge.imported_name == NAMESPACE {
                Wanted::All
            } else {
                Wanted::Name(edge.imported_name.clone())
            };
            let i = arena.demand((edge.to.clone(), wanted), &BTreeSet::from([site]));
            arena.requested_by[i].insert(edge.from.clone());
        }
        live.insert(module);
    }
}

/// Compute the reachability of every export in `graph` from `entries`.
///
/// Fails only when the graph violates its structural invariants.
pub fn compute_reachability(
    graph: &DependencyGraph,
    entries: &[ModuleId],
    options: ReachabilityOptions,
) -> DeadexportResult<ReachabilitySet> {
    graph.validate()?;

    // Liveness follows execution only: imports and side-effect imports. A
    // re-export edge loads its target only once a forwarded binding is used.
    let execution = graph.execution_graph();
    let mut live: BTreeSet<ModuleId> = BTreeSet::new();
    let mut site_table = SiteTable::default();
    let mut arena = DemandArena::default();

    activate(
        graph,
        &execution,
        entries.iter().map(|e| e.as_str()),
        &mut live,
        &mut site_table,
        &mut arena,
    );
    debug!(entries = entries.len(), live = live.len(), "live modules computed");

    if options.entry_exports_used {
        for entry in entries {
            let Some(node) = graph.module(entry.as_str()) else {
                continue;
            };
            for name in node.exports.keys() {
                let site = site_table.intern(UsageSite {
                    module: node.id.clone(),
                    name: name.clone(),
                });
                let key = (node.id.clone(), Wanted::Name(name.clone()));
                arena.demand(key, &BTreeSet::from([site]));
            }
        }
    }

    let mut used: BTreeMap<(ModuleId, String), BTreeSet<usize>> = BTreeMap::new();

    while let Some(i) = arena.pop() {
        let (module, wanted) = arena.keys[i].clone();
        let sites = arena.sites[i].clone();
        let Some(node) = graph.module(module.as_str()) else {
            continue;
        };

        match wanted {
            Wanted::Name(name) => match node.export(&name) {
                Some(symbol) => {
                    if !live.contains(&module) {
                        debug!(module = %module, name = %name, "module loaded through re-export");
                        activate(
                            graph,
                            &execution,
                            [node.id.as_str()],
                            &mut live,
                            &mut site_table,
                            &mut arena,
                        );
                    }
                    used.entry((module.clone(), name.clone()))
                        .or_default()
                        .extend(sites.iter().copied());
                    if let ExportKind::ReExport { target, name: original } = &symbol.kind {
                        let key = (target.clone(), Wanted::Name(original.clone()));
                        let j = arena.demand(key, &sites);
                        arena.requested_by[j].insert(module.clone());
                    }
                }
                None if name != DEFAULT_EXPORT => {
                    for target in &node.star_targets {
                        arena.demand((target.clone(), Wanted::Name(name.clone())), &sites);
                    }
                }
                None => {}
            },
            Wanted::All | Wanted::AllButDefault => {
                let skip_default = wanted == Wanted::AllButDefault;
                for name in node.exports.keys() {
                    if skip_default && name == DEFAULT_EXPORT {
                        continue;
                    }
                    arena.demand((module.clone(), Wanted::Name(name.clone())), &sites);
                }
                for target in &node.star_targets {
                    arena.demand((target.clone(), Wanted::AllButDefault), &sites);
                }
            }
        }
    }

    let diagnostics = missing_export_diagnostics(graph, &arena);

    let mut verdicts = BTreeMap::new();
    let mut records = Vec::with_capacity(graph.export_count());
    for symbol in graph.exports() {
        let key = (symbol.module.clone(), symbol.name.clone());
        let triggers: Vec<UsageSite> = used
            .get(&key)
            .map(|s| s.iter().map(|&i| site_table.table[i].clone()).collect::<BTreeSet<_>>())
            .unwrap_or_default()
            .into_iter()
            .collect();
        let is_used = used.contains_key(&key);
        let reason = if is_used {
            used_reason(&symbol.kind, &triggers)
        } else {
            dead_reason(graph, &symbol.module, &symbol.name)
        };
        records.push(ExportRecord {
            module: symbol.module.clone(),
            export_name: symbol.name.clone(),
            kind: symbol.kind.clone(),
            used: is_used,
            reason,
            triggers: triggers.clone(),
            line: symbol.line,
        });
        verdicts.insert(key, Verdict { used: is_used, triggers });
    }

    let set = ReachabilitySet {
        verdicts,
        records,
        live_modules: live,
        diagnostics,
    };
    info!(
        exports = set.records.len(),
        used = set.used_count(),
        dead = set.dead_count(),
        "reachability computed"
    );
    Ok(set)
}

/// One diagnostic per (requesting module, demanded name) that no module provides.
fn missing_export_diagnostics(graph: &DependencyGraph, arena: &DemandArena) -> Vec<Diagnostic> {
    let mut out = BTreeSet::new();
    for (i, (module, wanted)) in arena.keys.iter().enumerate() {
        let Wanted::Name(name) = wanted else {
            continue;
        };
        if arena.requested_by[i].is_empty() || provides(graph, module, name) {
            continue;
        }
        for requester in &arena.requested_by[i] {
            let diag = Diagnostic::new(
                requester,
                DiagnosticKind::MissingExport,
                format!("'{}' is not exported by {}", name, module),
            );
            warn!(module = %requester, target = %module, name = %name, "import of missing export");
            out.insert(diag);
        }
    }
    out.into_iter().collect()
}

/// Does `module` export `name`, directly or through `export *`?
fn provides(graph: &DependencyGraph, module: &ModuleId, name: &str) -> bool {
    let mut seen = BTreeSet::new();
    let mut stack = vec![module];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let Some(node) = graph.module(current.as_str()) else {
            continue;
        };
        if node.exports.contains_key(name) {
            return true;
        }
        if name != DEFAULT_EXPORT {
            stack.extend(node.star_targets.iter());
        }
    }
    false
}

fn used_reason(kind: &ExportKind, triggers: &[UsageSite]) -> String {
    let via = match triggers.first() {
        Some(site) if site.name == NAMESPACE => format!("namespace import in {}", site.module),
        Some(site) => format!("imported as '{}' by {}", site.name, site.module),
        None => "used".to_string(),
    };
    let more = match triggers.len() {
        0 | 1 => String::new(),
        n => format!(" (+{} more)", n - 1),
    };
    match kind {
        ExportKind::ReExport { target, name } => {
            format!("{}{}; forwarded to {}#{}", via, more, target, name)
        }
        ExportKind::Value => format!("{}{}", via, more),
    }
}

fn dead_reason(graph: &DependencyGraph, module: &ModuleId, name: &str) -> String {
    let mut imported = false;
    let mut reexported = false;
    for edge in graph.edges_into(module.as_str()) {
        if edge.is_self_import() {
            continue;
        }
        if edge.imported_name != name && edge.imported_name != NAMESPACE {
            continue;
        }
        match edge.kind {
            EdgeKind::Import => imported = true,
            EdgeKind::ReExport => reexported = true,
            EdgeKind::SideEffect => {}
        }
    }
    if imported {
        "imported only by unreachable modules".to_string()
    } else if reexported {
        "re-exported but never used".to_string()
    } else {
        "never imported".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExportDecl, ExtractedDeclarations, ImportDecl};
    use crate::graph::{GraphBuilder, ImportEdge, ModuleNode};
    use crate::resolve::{KnownFiles, Resolver};

    fn id(path: &str) -> ModuleId {
        ModuleId::from_path(path)
    }

    fn build(files: Vec<(&str, ExtractedDeclarations)>) -> DependencyGraph {
        let resolver = Resolver::new(KnownFiles::new(files.iter().map(|(p, _)| *p)));
        GraphBuilder::new(&resolver)
            .build(files.into_iter().map(|(p, d)| (id(p), d)))
            .graph
    }

    fn run(graph: &DependencyGraph, entries: &[&str]) -> ReachabilitySet {
        let entries: Vec<ModuleId> = entries.iter().map(|e| id(e)).collect();
        compute_reachability(graph, &entries, ReachabilityOptions::default()).unwrap()
    }

    #[test]
    fn test_file3_file4_scenario() {
        let g = build(vec![
            (
                "/projectA/file3.js",
                ExtractedDeclarations::new()
                    .import(ImportDecl::named("./dir1/file4", "usedFunctionFive"))
                    .export(ExportDecl::value("unusedFunctionFour"))
                    .export(ExportDecl::value("usedFunctionFour")),
            ),
            (
                "/projectA/dir1/file4.js",
                ExtractedDeclarations::new().export(ExportDecl::value("usedFunctionFive")),
            ),
        ]);
        let set = run(&g, &["/projectA/file3.js"]);
        assert!(!set.is_used("/projectA/file3.js", "unusedFunctionFour"));
        assert!(!set.is_used("/projectA/file3.js", "usedFunctionFour"));
        assert!(set.is_used("/projectA/dir1/file4.js", "usedFunctionFive"));
        assert_eq!(
            set.verdict("/projectA/dir1/file4.js", "usedFunctionFive").unwrap().triggers,
            vec![UsageSite {
                module: id("/projectA/file3.js"),
                name: "usedFunctionFive".into()
            }]
        );
    }

    #[test]
    fn test_index_file1_file2_scenario() {
        let mut index = ExtractedDeclarations::new();
        for n in ["One", "Two", "Three", "Four", "Five"] {
            index = index.import(ImportDecl::named("./file1", format!("usedFunction{}", n)));
        }
        index = index.import(ImportDecl::named("./file2", "usedFunctionThree"));
        let mut file1 = ExtractedDeclarations::new().export(ExportDecl::value("helperSix"));
        for n in ["One", "Two", "Three", "Four", "Five"] {
            file1 = file1.export(ExportDecl::value(format!("usedFunction{}", n)));
        }
        let g = build(vec![
            ("/projectB/index.js", index),
            ("/projectB/file1.js", file1),
            (
                "/projectB/file2.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::value("usedFunctionThree"))
                    .export(ExportDecl::value("unusedFunctionThree")),
            ),
        ]);
        let set = run(&g, &["/projectB/index.js"]);
        assert!(set.is_used("/projectB/file2.js", "usedFunctionThree"));
        assert!(set.is_used("/projectB/file1.js", "usedFunctionThree"));
        assert!(!set.is_used("/projectB/file1.js", "helperSix"));
        assert!(!set.is_used("/projectB/file2.js", "unusedFunctionThree"));
        assert_eq!(set.dead_count(), 2);
    }

    #[test]
    fn test_reexport_chain_marks_both_ends() {
        let g = build(vec![
            (
                "/p/main.js",
                ExtractedDeclarations::new().import(ImportDecl::named("./barrel", "run")),
            ),
            (
                "/p/barrel.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::reexport("run", "./core", "start"))
                    .export(ExportDecl::reexport("stop", "./core", "stop")),
            ),
            (
                "/p/core.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::value("start"))
                    .export(ExportDecl::value("stop")),
            ),
        ]);
        let set = run(&g, &["/p/main.js"]);
        assert!(set.is_used("/p/barrel.js", "run"));
        assert!(set.is_used("/p/core.js", "start"));
        assert!(!set.is_used("/p/barrel.js", "stop"));
        assert!(!set.is_used("/p/core.js", "stop"));
        let stop = set
            .records()
            .iter()
            .find(|r| r.module.as_str() == "/p/core.js" && r.export_name == "stop")
            .unwrap();
        assert_eq!(stop.reason, "re-exported but never used");
    }

    fn cycle(with_consumer: bool) -> DependencyGraph {
        let mut files = vec![
            (
                "/c/a.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::reexport("x", "./b", "x"))
                    .export(ExportDecl::value("y")),
            ),
            (
                "/c/b.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::reexport("y", "./a", "y"))
                    .export(ExportDecl::value("x")),
            ),
        ];
        let main = if with_consumer {
            ExtractedDeclarations::new().import(ImportDecl::named("./a", "x"))
        } else {
            ExtractedDeclarations::new()
        };
        files.push(("/c/main.js", main));
        build(files)
    }

    #[test]
    fn test_cycle_without_consumer_is_dead() {
        let set = run(&cycle(false), &["/c/main.js"]);
        assert_eq!(set.used_count(), 0);
        assert_eq!(set.dead_count(), 4);
    }

    #[test]
    fn test_cycle_with_consumer_marks_forwarded_endpoint() {
        let set = run(&cycle(true), &["/c/main.js"]);
        assert!(set.is_used("/c/a.js", "x"));
        assert!(set.is_used("/c/b.js", "x"));
        assert!(!set.is_used("/c/a.js", "y"));
        assert!(!set.is_used("/c/b.js", "y"));
    }

    #[test]
    fn test_pure_reexport_loop_terminates() {
        let g = build(vec![
            ("/l/main.js", ExtractedDeclarations::new().import(ImportDecl::named("./a", "x"))),
            ("/l/a.js", ExtractedDeclarations::new().export(ExportDecl::reexport("x", "./b", "x"))),
            ("/l/b.js", ExtractedDeclarations::new().export(ExportDecl::reexport("x", "./a", "x"))),
        ]);
        let set = run(&g, &["/l/main.js"]);
        assert!(set.is_used("/l/a.js", "x"));
        assert!(set.is_used("/l/b.js", "x"));
    }

    #[test]
    fn test_imports_from_unreachable_module_do_not_count() {
        let g = build(vec![
            ("/p/main.js", ExtractedDeclarations::new()),
            (
                "/p/orphan.js",
                ExtractedDeclarations::new().import(ImportDecl::named("./lib", "helper")),
            ),
            ("/p/lib.js", ExtractedDeclarations::new().export(ExportDecl::value("helper"))),
        ]);
        let set = run(&g, &["/p/main.js"]);
        assert!(!set.is_used("/p/lib.js", "helper"));
        assert!(!set.is_live("/p/orphan.js"));
        let record = set.dead().next().unwrap();
        assert_eq!(record.reason, "imported only by unreachable modules");
    }

    fn barrel_over_heavy(main: ExtractedDeclarations) -> DependencyGraph {
        build(vec![
            ("/p/main.js", main),
            (
                "/p/barrel.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::value("x"))
                    .export(ExportDecl::reexport("y", "./heavy", "y")),
            ),
            (
                "/p/heavy.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::value("y"))
                    .import(ImportDecl::named("./util", "z")),
            ),
            ("/p/util.js", ExtractedDeclarations::new().export(ExportDecl::value("z"))),
        ])
    }

    #[test]
    fn test_reexport_edge_alone_does_not_make_module_live() {
        let g = barrel_over_heavy(
            ExtractedDeclarations::new().import(ImportDecl::named("./barrel", "x")),
        );
        let set = run(&g, &["/p/main.js"]);
        assert!(set.is_used("/p/barrel.js", "x"));
        assert!(set.is_live("/p/barrel.js"));
        assert!(!set.is_live("/p/heavy.js"));
        assert!(!set.is_used("/p/heavy.js", "y"));
        assert!(!set.is_used("/p/util.js", "z"));
    }

    #[test]
    fn test_used_forwarded_binding_loads_its_module() {
        let g = barrel_over_heavy(
            ExtractedDeclarations::new().import(ImportDecl::named("./barrel", "y")),
        );
        let set = run(&g, &["/p/main.js"]);
        assert!(set.is_live("/p/heavy.js"));
        assert!(set.is_used("/p/heavy.js", "y"));
        assert!(set.is_used("/p/util.js", "z"));
        assert!(!set.is_used("/p/barrel.js", "x"));
    }

    #[test]
    fn test_self_import_is_noop() {
        let g = DependencyGraph::from_parts(
            vec![{
                let mut n = ModuleNode::new(&id("/p/a.js"));
                n.add_export("x", ExportKind::Value, 1);
                n
            }],
            vec![ImportEdge::import(&id("/p/a.js"), &id("/p/a.js"), "x", "x")],
        );
        let set = run(&g, &["/p/a.js"]);
        assert!(!set.is_used("/p/a.js", "x"));
    }

    #[test]
    fn test_namespace_import_uses_all_exports() {
        let g = build(vec![
            (
                "/p/main.js",
                ExtractedDeclarations::new().import(ImportDecl::namespace("./util", "u")),
            ),
            (
                "/p/util.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::value("a"))
                    .export(ExportDecl::value("default"))
                    .star("./more"),
            ),
            (
                "/p/more.js",
                ExtractedDeclarations::new()
                    .export(ExportDecl::value("b"))
                    .export(ExportDecl::value("default")),
            ),
        ]);
        let set = run(&g, &["/p/main.js"]);
        assert!(set.is_used("/p/util.js", "a"));
        assert!(set.is_used("/p/util.js", "default"));
        assert!(set.is_used("/p/more.js", "b"));
        assert!(!set.is_used("/p/more.js", "default"));
    }

    #[test]
    fn test_star_reexport_forwards_named_demand() {
        let g = build(vec![
            ("/p/main.js", ExtractedDeclarations::new().import(ImportDecl::named("./index", "b"))),
            ("/p/index.js", ExtractedDeclarations::new().star("./one").star("./two")),
            ("/p/one.js", ExtractedDeclarations::new().export(ExportDecl::value("a"))),
            ("/p/two.js", ExtractedDeclarations::new().export(ExportDecl::value("b"))),
        ]);
        let set = run(&g, &["/p/main.js"]);
        assert!(set.is_used("/p/two.js", "b"));
        assert!(!set.is_used("/p/one.js", "a"));
        assert!(set.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_export_diagnostic() {
        let g = build(vec![
            (
                "/p/main.js",
                ExtractedDeclarations::new().import(ImportDecl::named("./lib", "ghost")),
            ),
            ("/p/lib.js", ExtractedDeclarations::new().export(ExportDecl::value("real"))),
        ]);
        let set = run(&g, &["/p/main.js"]);
        assert_eq!(set.diagnostics().len(), 1);
        assert_eq!(set.diagnostics()[0].kind, DiagnosticKind::MissingExport);
        assert_eq!(set.diagnostics()[0].module, id("/p/main.js"));
    }

    #[test]
    fn test_entry_exports_used_option() {
        let g = build(vec![(
            "/p/index.js",
            ExtractedDeclarations::new().export(ExportDecl::value("api")),
        )]);
        let entries = vec![id("/p/index.js")];
        let off = compute_reachability(&g, &entries, ReachabilityOptions::default()).unwrap();
        assert!(!off.is_used("/p/index.js", "api"));
        let on = compute_reachability(
            &g,
            &entries,
            ReachabilityOptions {
                entry_exports_used: true,
            },
        )
        .unwrap();
        assert!(on.is_used("/p/index.js", "api"));
    }

    #[test]
    fn test_sibling_duplicates_tracked_independently() {
        let g = build(vec![
            (
                "/p/main.js",
                ExtractedDeclarations::new().import(ImportDecl::named("./left", "same")),
            ),
            ("/p/left.js", ExtractedDeclarations::new().export(ExportDecl::value("same"))),
            ("/p/right.js", ExtractedDeclarations::new().export(ExportDecl::value("same"))),
        ]);
        let set = run(&g, &["/p/main.js"]);
        assert!(set.is_used("/p/left.js", "same"));
        assert!(!set.is_used("/p/right.js", "same"));
    }

    #[test]
    fn test_invalid_graph_is_fatal() {
        let g = DependencyGraph::from_parts(
            vec![ModuleNode::new(&id("/p/a.js"))],
            vec![ImportEdge::import(&id("/p/a.js"), &id("/p/b.js"), "x", "x")],
        );
        let result = compute_reachability(&g, &[id("/p/a.js")], ReachabilityOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_records_sorted_and_deterministic() {
        let make = || {
            build(vec![
                (
                    "/p/z.js",
                    ExtractedDeclarations::new()
                        .export(ExportDecl::value("b"))
                        .export(ExportDecl::value("a")),
                ),
                ("/p/a.js", ExtractedDeclarations::new().import(ImportDecl::named("./z", "b"))),
            ])
        };
        let first = run(&make(), &["/p/a.js"]);
        let second = run(&make(), &["/p/a.js"]);
        assert_eq!(first.records(), second.records());
        let names: Vec<_> = first.records().iter().map(|r| r.export_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            serde_json::to_string(first.records()).unwrap(),
            serde_json::to_string(second.records()).unwrap()
        );
    }
}
