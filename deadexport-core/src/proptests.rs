//! Property-based tests for resolution and reachability using proptest.
//!
//! Graphs are generated as small sets of modules that export names from a
//! fixed pool, import from each other, and forward names through re-exports
//! (cycles included).

use crate::extract::{ExportDecl, ExtractedDeclarations, ImportDecl, NAMESPACE};
use crate::graph::{DependencyGraph, EdgeKind, ExportKind, GraphBuilder};
use crate::module_id::ModuleId;
use crate::reach::{compute_reachability, ReachabilityOptions};
use crate::resolve::{KnownFiles, Resolver};
use proptest::prelude::*;

const NAMES: &[&str] = &["a", "b", "c", "d", "default"];

#[derive(Debug, Clone)]
struct ModuleShape {
    /// (exported name, optional (target module index, original name))
    exports: Vec<(usize, Option<(usize, usize)>)>,
    /// (target module index, imported name index; NAMES.len() means namespace)
    imports: Vec<(usize, usize)>,
}

fn path(i: usize) -> String {
    format!("/g/m{}.js", i)
}

fn module_strategy(n: usize) -> impl Strategy<Value = ModuleShape> {
    let export = (
        0..NAMES.len(),
        prop::option::weighted(0.4, (0..n, 0..NAMES.len())),
    );
    let import = (0..n, 0..=NAMES.len());
    (
        prop::collection::vec(export, 0..4),
        prop::collection::vec(import, 0..4),
    )
        .prop_map(|(exports, imports)| ModuleShape { exports, imports })
}

fn project_strategy() -> impl Strategy<Value = (Vec<ModuleShape>, usize)> {
    (2usize..8).prop_flat_map(|n| (prop::collection::vec(module_strategy(n), n), 0..n))
}

fn build(specs: &[ModuleShape]) -> DependencyGraph {
    let files: Vec<String> = (0..specs.len()).map(path).collect();
    let resolver = Resolver::new(KnownFiles::new(&files));
    let modules = specs.iter().enumerate().map(|(i, spec)| {
        let mut decls = ExtractedDeclarations::new();
        for (name, forward) in &spec.exports {
            decls = decls.export(match forward {
                Some((target, original)) => {
                    ExportDecl::reexport(NAMES[*name], format!("./m{}", target), NAMES[*original])
                }
                None => ExportDecl::value(NAMES[*name]),
            });
        }
        for (target, name) in &spec.imports {
            let source = format!("./m{}", target);
            decls = decls.import(match NAMES.get(*name) {
                Some(n) => ImportDecl::named(source, *n),
                None => ImportDecl::namespace(source, "ns"),
            });
        }
        (ModuleId::from_path(path(i)), decls)
    });
    GraphBuilder::new(&resolver).build(modules).graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Resolving an already-canonical identifier returns it unchanged.
    #[test]
    fn prop_resolve_canonical_is_identity(parts in prop::collection::vec("[a-z]{1,6}", 1..4)) {
        let file = format!("/r/{}.ts", parts.join("/"));
        let resolver = Resolver::new(KnownFiles::new([file.as_str()]));
        let from = ModuleId::from_path("/r/index.ts");
        let id = resolver.resolve(&from, &file).unwrap();
        prop_assert_eq!(id.as_str(), file.as_str());
        let again = resolver.resolve(&from, id.as_str()).unwrap();
        prop_assert_eq!(again, id);
    }

    /// Every name demanded by a live import or a used re-export is marked used.
    #[test]
    fn prop_soundness((specs, entry) in project_strategy()) {
        let graph = build(&specs);
        let entries = [ModuleId::from_path(path(entry))];
        let set = compute_reachability(&graph, &entries, ReachabilityOptions::default()).unwrap();

        for edge in graph.edges() {
            if edge.kind != EdgeKind::Import
                || edge.is_self_import()
                || !set.is_live(edge.from.as_str())
            {
                continue;
            }
            let node = graph.module(edge.to.as_str()).unwrap();
            if edge.imported_name == NAMESPACE {
                for name in node.exports.keys() {
                    prop_assert!(set.is_used(edge.to.as_str(), name));
                }
            } else if node.export(&edge.imported_name).is_some() {
                prop_assert!(set.is_used(edge.to.as_str(), &edge.imported_name));
            }
        }

        for symbol in graph.exports() {
            if let ExportKind::ReExport { target, name } = &symbol.kind {
                if set.is_used(symbol.module.as_str(), &symbol.name)
                    && graph.export(target.as_str(), name).is_some()
                {
                    prop_assert!(set.is_used(target.as_str(), name));
                }
            }
        }
    }

    /// An export nothing refers to is never marked used.
    #[test]
    fn prop_completeness((specs, entry) in project_strategy()) {
        let graph = build(&specs);
        let entries = [ModuleId::from_path(path(entry))];
        let set = compute_reachability(&graph, &entries, ReachabilityOptions::default()).unwrap();

        for symbol in graph.exports() {
            let referenced = graph.edges_into(symbol.module.as_str()).any(|e| {
                (!e.is_self_import() || e.kind == EdgeKind::ReExport)
                    && (e.imported_name == symbol.name || e.imported_name == NAMESPACE)
            });
            if !referenced {
                prop_assert!(!set.is_used(symbol.module.as_str(), &symbol.name));
            }
        }
    }

    /// Two runs over the same input give identical records.
    #[test]
    fn prop_deterministic((specs, entry) in project_strategy()) {
        let entries = [ModuleId::from_path(path(entry))];
        let options = ReachabilityOptions::default();
        let first = compute_reachability(&build(&specs), &entries, options).unwrap();
        let second = compute_reachability(&build(&specs), &entries, options).unwrap();
        prop_assert_eq!(first.records(), second.records());
        prop_assert_eq!(first.diagnostics(), second.diagnostics());
    }

    /// With entry exports counted, nothing an entry exports is dead.
    #[test]
    fn prop_entry_exports_used((specs, entry) in project_strategy()) {
        let graph = build(&specs);
        let entry_id = ModuleId::from_path(path(entry));
        let set = compute_reachability(
            &graph,
            std::slice::from_ref(&entry_id),
            ReachabilityOptions { entry_exports_used: true },
        )
        .unwrap();
        for name in graph.module(entry_id.as_str()).unwrap().exports.keys() {
            prop_assert!(set.is_used(entry_id.as_str(), name));
        }
    }
}
