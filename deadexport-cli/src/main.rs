//! deadexport CLI - unused export detector for JavaScript and TypeScript projects.
//!
//! Features:
//! - Entry detection from `package.json` or `index.*`
//! - Re-export chains, `export *` and namespace imports
//! - Incremental caching for faster re-analysis
//! - Graphviz DOT visualization

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use deadexport_core::{
    generate_dot, init_structured_logging, load_config, print_json, print_plain, Deadexport,
    DeadexportConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Unused export detector for JavaScript and TypeScript")]
pub struct Cli {
    /// Path to the root of the project
    #[arg(default_value = ".")]
    path: String,

    /// Entry module, relative to the root (repeatable; detected when omitted)
    #[arg(long = "entry", value_name = "FILE")]
    entries: Vec<String>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Export names or module paths to ignore (`foo*`, `*foo`, substring)
    #[arg(long, num_args = 1..)]
    ignore: Vec<String>,

    /// Additional directories to skip while scanning
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,

    /// Disable the incremental cache
    #[arg(long)]
    no_cache: bool,

    /// Generate Graphviz DOT output for the module graph
    #[arg(long)]
    dot: bool,

    /// Write DOT output to a specified file instead of stdout
    #[arg(long)]
    dot_file: Option<String>,

    /// Count every export of an entry module as used
    #[arg(long)]
    entry_exports_used: bool,

    /// Match module paths case-insensitively
    #[arg(long)]
    case_insensitive: bool,

    /// Fail on the first file that cannot be read or parsed instead of reporting it
    #[arg(long)]
    strict: bool,
}

/// Security: Validates output file paths to prevent path traversal attacks.
///
/// Rejects:
/// - Absolute paths (must be relative to current directory)
/// - Paths containing `..` (parent directory traversal)
/// - Paths with null bytes (injection attacks)
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);

    if p.is_absolute() {
        return Err(anyhow!(
            "Output path must be relative, not absolute: {}",
            path
        ));
    }

    for component in p.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(anyhow!(
                "Path traversal (..) not allowed in output paths: {}",
                path
            ));
        }
    }

    // Backslash separators are not components on unix
    let normalized = path.replace('\\', "/");
    if normalized.contains("/../") || normalized.starts_with("../") {
        return Err(anyhow!("Path traversal attempt detected: {}", path));
    }

    Ok(p)
}

/// `deadexport.toml` from the project root; a broken file is reported and skipped.
fn load_project_config(root: &Path) -> Option<DeadexportConfig> {
    match load_config(root) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[WARN] config load failed: {:#}", e);
            None
        }
    }
}

/// Combine the config file with command-line flags. Flags win.
fn build_analysis(cli: &Cli, root: &Path, cfg: Option<&DeadexportConfig>) -> Deadexport {
    let mut builder = Deadexport::new(root);
    if let Some(cfg) = cfg {
        if cli.entries.is_empty() {
            builder = builder.with_config(cfg);
        } else {
            // Explicit entries replace configured ones.
            builder = builder.with_config(&DeadexportConfig {
                entries: None,
                ..cfg.clone()
            });
        }
    }

    builder = builder
        .entries(cli.entries.iter().cloned())
        .ignore_patterns(cli.ignore.iter().cloned())
        .exclude_dirs(cli.exclude.iter().cloned())
        .with_cache(!cli.no_cache);
    if cli.entry_exports_used {
        builder = builder.entry_exports_used(true);
    }
    if cli.case_insensitive {
        builder = builder.case_insensitive(true);
    }
    builder.strict(cli.strict)
}

fn wants_json(cli: &Cli, cfg: Option<&DeadexportConfig>) -> bool {
    cli.json || cfg.map(DeadexportConfig::wants_json).unwrap_or(false)
}

fn main() -> Result<()> {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadexport internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    // 1. Project root
    let root = fs::canonicalize(&cli.path)
        .with_context(|| format!("Project root not found: {}", cli.path))?;

    // 2. Config from deadexport.toml if present
    let cfg = load_project_config(&root);

    // 3. Analysis
    let result = build_analysis(&cli, &root, cfg.as_ref())
        .analyze()
        .with_context(|| format!("Analysis failed for: {}", root.display()))?;

    // 4. Report results
    if wants_json(&cli, cfg.as_ref()) {
        print_json(&result);
    } else {
        print_plain(&result);
    }

    // 5. DOT/Graphviz output (safe - don't crash on write errors)
    if cli.dot || cli.dot_file.is_some() {
        let dot = generate_dot(&result);
        if let Some(ref file) = cli.dot_file {
            match validate_output_path(file) {
                Ok(safe_path) => {
                    if let Err(e) = fs::write(&safe_path, &dot) {
                        eprintln!("[WARN] DOT write failed to {}: {}", safe_path.display(), e);
                    } else {
                        eprintln!("DOT graph saved to: {}", safe_path.display());
                    }
                }
                Err(e) => {
                    eprintln!("[ERROR] Invalid output path: {}", e);
                    std::process::exit(2);
                }
            }
        } else {
            println!("{}", dot);
        }
    }

    // 6. Exit code (CI-friendly)
    std::process::exit(if result.has_dead_exports() { 1 } else { 0 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::File::create(path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("deadexport_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn sample_project(name: &str) -> PathBuf {
        let dir = create_temp_dir(name);
        create_file(&dir.join("index.js"), "import { a } from './lib';\n");
        create_file(&dir.join("main.js"), "import { b } from './lib';\n");
        create_file(
            &dir.join("lib.js"),
            "export const a = 1;\nexport const b = 2;\nexport const mockData = 3;\n",
        );
        dir
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("deadexport").chain(args.iter().copied()))
    }

    fn dead_names(cli: &Cli, root: &Path, cfg: Option<&DeadexportConfig>) -> Vec<String> {
        build_analysis(cli, root, cfg)
            .analyze()
            .unwrap()
            .dead
            .into_iter()
            .map(|r| r.export_name)
            .collect()
    }

    // --- argument parsing ---

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.path, ".");
        assert!(cli.entries.is_empty());
        assert!(!cli.json);
        assert!(!cli.no_cache);
    }

    #[test]
    fn test_cli_repeatable_entries() {
        let cli = parse(&["proj", "--entry", "a.js", "--entry", "b.ts", "--ignore", "x", "y"]);
        assert_eq!(cli.path, "proj");
        assert_eq!(cli.entries, vec!["a.js", "b.ts"]);
        assert_eq!(cli.ignore, vec!["x", "y"]);
    }

    // --- validate_output_path ---

    #[test]
    fn test_validate_output_path_accepts_relative() {
        assert_eq!(
            validate_output_path("out/graph.dot").unwrap(),
            PathBuf::from("out/graph.dot")
        );
    }

    #[test]
    fn test_validate_output_path_rejects_traversal() {
        assert!(validate_output_path("../graph.dot").is_err());
        assert!(validate_output_path("out/../../graph.dot").is_err());
        assert!(validate_output_path("bad\0name").is_err());
    }

    #[test]
    fn test_validate_output_path_rejects_absolute() {
        let abs = std::env::temp_dir().join("graph.dot");
        assert!(validate_output_path(&abs.to_string_lossy()).is_err());
    }

    // --- config and flag merging ---

    #[test]
    fn test_detected_entry() {
        let dir = sample_project("detected");
        let cli = parse(&["--no-cache"]);
        assert_eq!(dead_names(&cli, &dir, None), vec!["b", "mockData"]);
    }

    #[test]
    fn test_flag_entry_overrides_config_entry() {
        let dir = sample_project("override");
        let cfg = DeadexportConfig {
            entries: Some(vec!["index.js".to_string()]),
            ignore: Some(vec!["mock*".to_string()]),
            ..DeadexportConfig::default()
        };

        let from_config = parse(&["--no-cache"]);
        assert_eq!(dead_names(&from_config, &dir, Some(&cfg)), vec!["b"]);

        let from_flag = parse(&["--no-cache", "--entry", "main.js"]);
        assert_eq!(dead_names(&from_flag, &dir, Some(&cfg)), vec!["a"]);
    }

    #[test]
    fn test_ignore_flag_adds_to_config() {
        let dir = sample_project("ignore");
        let cfg = DeadexportConfig {
            ignore: Some(vec!["mock*".to_string()]),
            ..DeadexportConfig::default()
        };
        let cli = parse(&["--no-cache", "--ignore", "b"]);
        assert!(dead_names(&cli, &dir, Some(&cfg)).is_empty());
    }

    #[test]
    fn test_broken_config_is_skipped() {
        let dir = sample_project("broken_cfg");
        create_file(&dir.join("deadexport.toml"), "entries = [unterminated");
        assert!(load_project_config(&dir).is_none());
    }

    #[test]
    fn test_json_from_config_output_section() {
        let dir = sample_project("json_cfg");
        create_file(&dir.join("deadexport.toml"), "[output]\nformat = \"json\"\n");
        let cfg = load_project_config(&dir);
        assert!(wants_json(&parse(&[]), cfg.as_ref()));
        assert!(!wants_json(&parse(&[]), None));
        assert!(wants_json(&parse(&["--json"]), None));
    }
}
