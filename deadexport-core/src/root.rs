//! Entry module detection for JavaScript/TypeScript projects.
//!
//! Resolution order:
//! - `package.json` fields `main`, `module`, `source`, and `exports`
//!   (a string, or the `"."` entry of an exports map)
//! - `index.*` at the project root
//! - `src/index.*`
//!
//! Never panics; an unreadable or malformed `package.json` is skipped with a
//! warning.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::module_id::ModuleId;
use crate::resolve::{FileProbe, Resolver};

/// Extensions tried for conventional `index` entry files.
const INDEX_EXTENSIONS: &[&str] = &["js", "ts", "mjs", "jsx", "tsx"];

/// Probe backed by the real filesystem.
struct DiskProbe;

impl FileProbe for DiskProbe {
    fn is_file(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }
}

/// Detect the entry modules of a project.
///
/// Returns cleaned paths, sorted and deduplicated. Empty when nothing is found.
pub fn find_entry_modules(project_root: &Path) -> Vec<PathBuf> {
    let mut out = package_json_entries(project_root);

    if out.is_empty() {
        for dir in [project_root.to_path_buf(), project_root.join("src")] {
            out.extend(
                INDEX_EXTENSIONS
                    .iter()
                    .map(|ext| dir.join(format!("index.{}", ext)))
                    .filter(|p| p.is_file()),
            );
            if !out.is_empty() {
                break;
            }
        }
    }

    let mut out: Vec<PathBuf> = out
        .into_iter()
        .map(|p| ModuleId::from_path(p).to_path_buf())
        .collect();
    out.sort();
    out.dedup();
    debug!(root = %project_root.display(), entries = out.len(), "entry modules detected");
    out
}

/// Entry paths declared by `package.json`, resolved against the filesystem.
fn package_json_entries(project_root: &Path) -> Vec<PathBuf> {
    let manifest = project_root.join("package.json");
    if !manifest.is_file() {
        return Vec::new();
    }

    let parsed = fs::read_to_string(&manifest)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
    let json = match parsed {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %manifest.display(), error = %e, "ignoring unreadable package.json");
            return Vec::new();
        }
    };

    let resolver = Resolver::new(DiskProbe);
    let from = ModuleId::from_path(&manifest);

    declared_entries(&json)
        .into_iter()
        .filter_map(|raw| {
            let spec = if raw.starts_with('.') || raw.starts_with('/') {
                raw.clone()
            } else {
                format!("./{}", raw)
            };
            match resolver.resolve(&from, &spec) {
                Ok(id) => Some(id.to_path_buf()),
                Err(_) => {
                    warn!(entry = %raw, "package.json entry does not exist");
                    None
                }
            }
        })
        .collect()
}

/// Raw entry strings named by a parsed `package.json`.
fn declared_entries(json: &Value) -> Vec<String> {
    let mut out = Vec::new();
    for field in ["main", "module", "source"] {
        if let Some(s) = json.get(field).and_then(Value::as_str) {
            out.push(s.to_string());
        }
    }

    match json.get("exports") {
        Some(Value::String(s)) => out.push(s.clone()),
        Some(Value::Object(map)) => {
            let target = map.get(".").unwrap_or(&Value::Null);
            collect_export_targets(target, &mut out);
        }
        _ => {}
    }
    out
}

/// Strings under a conditional export (`{ "import": ..., "require": ... }`).
fn collect_export_targets(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Object(map) => {
            for (condition, v) in map {
                // Type declarations are not runtime entries.
                if condition != "types" {
                    collect_export_targets(v, out);
                }
            }
        }
        _ => {}
    }
}
