//! Graphviz DOT visualization of the module dependency graph.
//!
//! Uses a pre-allocated buffer and the `std::fmt::Write` trait for formatting.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::builder::AnalysisResult;
use crate::graph::EdgeKind;
use crate::module_id::ModuleId;

/// Generate a Graphviz DOT representation of the analyzed project.
///
/// - live modules with no dead exports are lightgreen
/// - live modules with dead exports are khaki
/// - unreachable modules are lightcoral
/// - re-export edges are dashed, side-effect imports dotted
///
/// Node labels carry the dead/total export count.
pub fn generate_dot(result: &AnalysisResult) -> String {
    let node_count = result.graph.module_count();
    let edge_count = result.graph.edge_count();
    let estimated_capacity = (node_count * 100) + (edge_count * 60) + 150;

    let mut dot = String::with_capacity(estimated_capacity);

    if let Err(e) = write_dot_content(&mut dot, result) {
        tracing::error!(error = %e, "failed to generate DOT string");
        return "digraph deadexport {\n}\n".to_string();
    }

    dot
}

fn write_dot_content(dot: &mut String, result: &AnalysisResult) -> std::fmt::Result {
    let mut dead_counts: BTreeMap<&ModuleId, usize> = BTreeMap::new();
    for record in &result.dead {
        *dead_counts.entry(&record.module).or_default() += 1;
    }

    writeln!(dot, "digraph deadexport {{")?;
    writeln!(dot, "  rankdir=LR;")?;
    writeln!(
        dot,
        "  node [shape=box, style=filled, fontname=\"JetBrains Mono\"];"
    )?;
    writeln!(dot)?;

    for (id, node) in result.graph.modules() {
        let dead = dead_counts.get(id).copied().unwrap_or(0);
        let color = if !result.live_modules.contains(id) {
            "lightcoral"
        } else if dead > 0 {
            "khaki"
        } else {
            "lightgreen"
        };
        let name = result.relative(id);
        writeln!(
            dot,
            "  \"{}\" [label=\"{}\\n{}/{} dead\", fillcolor={}];",
            escape(&name),
            escape(&name),
            dead,
            node.exports.len(),
            color
        )?;
    }

    writeln!(dot)?;

    // Parallel edges (one per imported name) collapse into one arrow.
    let mut drawn: BTreeSet<(&ModuleId, &ModuleId, EdgeKind)> = BTreeSet::new();
    for edge in result.graph.edges() {
        if !drawn.insert((&edge.from, &edge.to, edge.kind)) {
            continue;
        }
        let style = match edge.kind {
            EdgeKind::Import => "",
            EdgeKind::ReExport => " [style=dashed]",
            EdgeKind::SideEffect => " [style=dotted]",
        };
        writeln!(
            dot,
            "  \"{}\" -> \"{}\"{};",
            escape(&result.relative(&edge.from)),
            escape(&result.relative(&edge.to)),
            style
        )?;
    }

    writeln!(dot, "}}")?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
