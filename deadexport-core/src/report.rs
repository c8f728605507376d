//! Output formatting - plaintext and JSON.

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::builder::AnalysisResult;

/// Renders dead exports and diagnostics as plain text.
pub fn render_plain(result: &AnalysisResult) -> String {
    let mut out = String::new();

    if result.dead.is_empty() {
        out.push_str("No dead exports found.\n");
    } else {
        let _ = writeln!(out, "DEAD EXPORTS ({}):", result.dead.len());
        let mut current = None;
        for record in &result.dead {
            if current != Some(&record.module) {
                let _ = writeln!(out, "{}", result.relative(&record.module));
                current = Some(&record.module);
            }
            let _ = writeln!(
                out,
                "  - {} (line {}): {}",
                record.export_name, record.line, record.reason
            );
        }
    }

    if !result.diagnostics.is_empty() {
        let _ = writeln!(out, "\nDIAGNOSTICS ({}):", result.diagnostics.len());
        for diag in &result.diagnostics {
            let location = match diag.line {
                Some(line) => format!("{}:{}", result.relative(&diag.module), line),
                None => result.relative(&diag.module),
            };
            let _ = writeln!(out, "- {} [{}] {}", location, diag.kind, diag.message);
        }
    }

    let _ = writeln!(
        out,
        "\n{} files, {} exports, {} used, {} dead ({:.1}%), {} ignored",
        result.stats.files,
        result.stats.exports,
        result.stats.used,
        result.stats.dead,
        result.dead_percentage(),
        result.stats.ignored
    );
    out
}

/// Builds the JSON document for a run.
///
/// Module paths are shown relative to the analyzed root.
pub fn json_value(result: &AnalysisResult) -> Value {
    let record = |r: &crate::reach::ExportRecord| {
        json!({
            "module": result.relative(&r.module),
            "export": r.export_name,
            "used": r.used,
            "reason": r.reason,
            "line": r.line,
        })
    };

    json!({
        "root": result.root.display().to_string(),
        "entries": result.entries.iter().map(|e| result.relative(e)).collect::<Vec<_>>(),
        "dead": result.dead.iter().map(record).collect::<Vec<_>>(),
        "exports": result.records.iter().map(record).collect::<Vec<_>>(),
        "diagnostics": result.diagnostics.iter().map(|d| json!({
            "module": result.relative(&d.module),
            "kind": d.kind,
            "message": d.message,
            "line": d.line,
        })).collect::<Vec<_>>(),
        "stats": result.stats,
    })
}

/// Prints dead exports in plain text format.
pub fn print_plain(result: &AnalysisResult) {
    print!("{}", render_plain(result));
}

/// Prints the full result in JSON format.
///
/// Falls back to a minimal document if pretty serialization fails.
pub fn print_json(result: &AnalysisResult) {
    let value = json_value(result);
    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            println!("{{\"dead\": {}}}", result.dead.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{AnalysisResult, AnalysisStats};
    use crate::diagnostic::{Diagnostic, DiagnosticKind};
    use crate::graph::{DependencyGraph, ExportKind};
    use crate::module_id::ModuleId;
    use crate::reach::ExportRecord;
    use std::path::PathBuf;

    fn record(module: &str, name: &str, used: bool) -> ExportRecord {
        ExportRecord {
            module: ModuleId::from_path(module),
            export_name: name.to_string(),
            kind: ExportKind::Value,
            used,
            reason: if used { "imported".into() } else { "never imported".into() },
            triggers: Vec::new(),
            line: 3,
        }
    }

    fn sample() -> AnalysisResult {
        let records = vec![
            record("/proj/file3.js", "unusedFunctionFour", false),
            record("/proj/file3.js", "usedFunctionFour", false),
            record("/proj/dir1/file4.js", "usedFunctionFive", true),
        ];
        let dead: Vec<_> = records.iter().filter(|r| !r.used).cloned().collect();
        AnalysisResult {
            root: PathBuf::from("/proj"),
            entries: vec![ModuleId::from_path("/proj/file3.js")],
            stats: AnalysisStats {
                files: 2,
                exports: 3,
                used: 1,
                dead: 2,
                ..AnalysisStats::default()
            },
            records,
            dead,
            diagnostics: vec![Diagnostic::new(
                &ModuleId::from_path("/proj/file3.js"),
                DiagnosticKind::UnresolvedPath,
                "Unresolved import './gone'",
            )
            .at_line(2)],
            graph: DependencyGraph::default(),
            live_modules: Default::default(),
        }
    }

    #[test]
    fn test_plain_groups_by_module() {
        let text = render_plain(&sample());
        assert!(text.starts_with("DEAD EXPORTS (2):\n./file3.js\n"));
        assert!(text.contains("  - unusedFunctionFour (line 3): never imported"));
        assert!(text.contains("- ./file3.js:2 [unresolved path]"));
        assert!(!text.contains("usedFunctionFive"));
    }

    #[test]
    fn test_plain_no_dead() {
        let mut result = sample();
        result.dead.clear();
        result.diagnostics.clear();
        assert!(render_plain(&result).starts_with("No dead exports found."));
    }

    #[test]
    fn test_json_shape() {
        let value = json_value(&sample());
        assert_eq!(value["dead"].as_array().unwrap().len(), 2);
        assert_eq!(value["exports"].as_array().unwrap().len(), 3);
        assert_eq!(value["dead"][0]["module"], "./file3.js");
        assert_eq!(value["diagnostics"][0]["kind"], "unresolved_path");
        assert_eq!(value["stats"]["used"], 1);
        assert_eq!(value["entries"][0], "./file3.js");
    }
}
