//! Declaration extraction.
//!
//! The extractor contract turns one module's source text into its export and
//! import declarations. The graph builder only ever sees
//! [`ExtractedDeclarations`]; how they were produced is up to the
//! [`DeclarationExtractor`] implementation.
//!
//! [`EsExtractor`] is the built-in implementation for ECMAScript and
//! TypeScript sources. It is pattern-driven rather than a full parser:
//! comments are blanked first (offsets preserved), then each statement form
//! is matched with a pre-compiled regex.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DeadexportError, DeadexportResult};
use crate::module_id::ModuleId;

/// Imported name denoting the whole module namespace (`import * as ns`).
pub const NAMESPACE: &str = "*";

/// Export name used for `export default`.
pub const DEFAULT_EXPORT: &str = "default";

/// What an export declaration binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportDeclKind {
    /// Declares a new binding in this module.
    Value,
    /// Forwards `name` from the module at raw specifier `source`.
    ReExport { source: String, name: String },
}

/// One exported name of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDecl {
    pub name: String,
    #[serde(flatten)]
    pub kind: ExportDeclKind,
    /// Line number (1-indexed), 0 when unknown
    #[serde(default)]
    pub line: usize,
}

impl ExportDecl {
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExportDeclKind::Value,
            line: 0,
        }
    }

    pub fn reexport(
        name: impl Into<String>,
        source: impl Into<String>,
        original: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ExportDeclKind::ReExport {
                source: source.into(),
                name: original.into(),
            },
            line: 0,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// One imported name of a module.
///
/// `name` is the name exported by the source module (`default`, `*` for a
/// namespace, or empty for a side-effect-only import); `alias` is the local
/// binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub source: String,
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub line: usize,
}

impl ImportDecl {
    pub fn named(source: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: source.into(),
            alias: name.clone(),
            name,
            line: 0,
        }
    }

    pub fn aliased(
        source: impl Into<String>,
        name: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            alias: alias.into(),
            line: 0,
        }
    }

    pub fn namespace(source: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::aliased(source, NAMESPACE, alias)
    }

    pub fn side_effect(source: impl Into<String>) -> Self {
        Self::aliased(source, "", "")
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    pub fn is_side_effect(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_namespace(&self) -> bool {
        self.name == NAMESPACE
    }
}

/// Everything the graph builder needs to know about one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDeclarations {
    pub exports: Vec<ExportDecl>,
    /// Raw specifiers of `export * from '...'` statements
    #[serde(default)]
    pub star_reexports: Vec<String>,
    pub imports: Vec<ImportDecl>,
}

impl ExtractedDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(mut self, decl: ExportDecl) -> Self {
        self.exports.push(decl);
        self
    }

    pub fn import(mut self, decl: ImportDecl) -> Self {
        self.imports.push(decl);
        self
    }

    pub fn star(mut self, source: impl Into<String>) -> Self {
        self.star_reexports.push(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.star_reexports.is_empty() && self.imports.is_empty()
    }
}

/// Produces the declarations of a single module.
///
/// Implementations must be pure functions of `(id, source)` so extraction can
/// run on many files concurrently.
pub trait DeclarationExtractor: Send + Sync {
    fn extract(&self, id: &ModuleId, source: &str) -> DeadexportResult<ExtractedDeclarations>;
}

/// Pattern-driven extractor for `.js`/`.mjs`/`.cjs`/`.jsx`/`.ts`/`.tsx` sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct EsExtractor;

impl EsExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Pre-compiled statement patterns.
struct EsPatterns {
    import_from: Regex,
    import_bare: Regex,
    import_call: Regex,
    import_start: Regex,
    export_from: Regex,
    export_star: Regex,
    export_list: Regex,
    export_decl: Regex,
    export_destructure: Regex,
    export_default: Regex,
    cjs_named: Regex,
    cjs_default: Regex,
}

fn patterns() -> &'static EsPatterns {
    static PATTERNS: OnceLock<EsPatterns> = OnceLock::new();
    // SAFETY: These regex patterns are hardcoded and covered by the tests below.
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("Hardcoded regex pattern is valid");
        EsPatterns {
            import_from: re(
                r#"(?m)^[ \t]*import\s+(?:type\s+)?([\w$\s{},*]+?)\s*from\s*['"]([^'"\n]+)['"]"#,
            ),
            import_bare: re(r#"(?m)^[ \t]*import\s*['"]([^'"\n]+)['"]"#),
            import_call: re(r#"\b(?:require|import)\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#),
            import_start: re(r"(?m)^[ \t]*import\b"),
            export_from: re(
                r#"(?m)^[ \t]*export\s+(?:type\s+)?\{([^}]*)\}\s*from\s*['"]([^'"\n]+)['"]"#,
            ),
            export_star: re(
                r#"(?m)^[ \t]*export\s+\*\s*(?:as\s+([\w$]+)\s+)?from\s*['"]([^'"\n]+)['"]"#,
            ),
            export_list: re(r"(?m)^[ \t]*export\s+(?:type\s+)?\{([^}]*)\}"),
            export_decl: re(
                r"(?m)^[ \t]*export\s+(?:declare\s+)?(?:async\s+)?(?:abstract\s+)?(?:function\s*\*?|class|const|let|var|interface|type|enum|namespace)\s+([\w$]+)",
            ),
            export_destructure: re(r"(?m)^[ \t]*export\s+(?:const|let|var)\s+[{\[]([^}\]]*)[}\]]"),
            export_default: re(r"(?m)^[ \t]*export\s+default\b\s*([\w$]+)?"),
            cjs_named: re(r"(?m)^[ \t]*(?:module\.)?exports\.([\w$]+)\s*="),
            cjs_default: re(r"(?m)^[ \t]*module\.exports\s*="),
        }
    })
}

/// Keywords that can follow `export default` without naming a binding.
const DEFAULT_KEYWORDS: &[&str] = &["function", "class", "async", "new", "await", "typeof"];

impl DeclarationExtractor for EsExtractor {
    fn extract(&self, id: &ModuleId, source: &str) -> DeadexportResult<ExtractedDeclarations> {
        let text = blank_comments(source).map_err(|line| {
            DeadexportError::parse_at(id.to_path_buf(), "unterminated block comment", line)
        })?;
        let p = patterns();
        let lines = LineIndex::new(&text);

        // Imports first: local exports of imported bindings become re-exports.
        let mut imports: Vec<(usize, ImportDecl)> = Vec::new();
        let mut covered: Vec<usize> = Vec::new();

        for caps in p.import_from.captures_iter(&text) {
            let (Some(m), Some(clause), Some(src)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            covered.push(m.start());
            let line = lines.line_of(m.start());
            for decl in parse_import_clause(clause.as_str(), src.as_str()) {
                imports.push((m.start(), decl.at_line(line)));
            }
        }
        for caps in p.import_bare.captures_iter(&text) {
            let (Some(m), Some(src)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            covered.push(m.start());
            imports.push((
                m.start(),
                ImportDecl::side_effect(src.as_str()).at_line(lines.line_of(m.start())),
            ));
        }
        for caps in p.import_call.captures_iter(&text) {
            let (Some(m), Some(src)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            covered.push(m.start());
            imports.push((
                m.start(),
                ImportDecl::namespace(src.as_str(), "").at_line(lines.line_of(m.start())),
            ));
        }

        // Any remaining statement-level `import` is one we could not read.
        for m in p.import_start.find_iter(&text) {
            let rest = text[m.end()..].trim_start();
            if rest.starts_with('(') || rest.starts_with('.') || rest.starts_with('=') {
                continue;
            }
            if !covered.contains(&m.start()) {
                return Err(DeadexportError::parse_at(
                    id.to_path_buf(),
                    "unreadable import statement",
                    lines.line_of(m.start()),
                ));
            }
        }

        imports.sort_by_key(|(offset, _)| *offset);
        let bindings: HashMap<&str, &ImportDecl> = imports
            .iter()
            .filter(|(_, d)| !d.alias.is_empty())
            .map(|(_, d)| (d.alias.as_str(), d))
            .collect();

        let mut exports: Vec<(usize, ExportDecl)> = Vec::new();
        let mut stars: Vec<(usize, String)> = Vec::new();
        let mut from_lists: Vec<usize> = Vec::new();

        for caps in p.export_from.captures_iter(&text) {
            let (Some(m), Some(list), Some(src)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            from_lists.push(m.start());
            let line = lines.line_of(m.start());
            for (original, exported) in parse_specifier_list(list.as_str()) {
                exports.push((
                    m.start(),
                    ExportDecl::reexport(exported, src.as_str(), original).at_line(line),
                ));
            }
        }

        for caps in p.export_star.captures_iter(&text) {
            let (Some(m), Some(src)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            match caps.get(1) {
                Some(ns) => exports.push((
                    m.start(),
                    ExportDecl::reexport(ns.as_str(), src.as_str(), NAMESPACE)
                        .at_line(lines.line_of(m.start())),
                )),
                None => stars.push((m.start(), src.as_str().to_string())),
            }
        }

        for caps in p.export_list.captures_iter(&text) {
            let (Some(m), Some(list)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if from_lists.contains(&m.start()) {
                continue;
            }
            let line = lines.line_of(m.start());
            for (local, exported) in parse_specifier_list(list.as_str()) {
                exports.push((m.start(), local_export(&bindings, &local, exported, line)));
            }
        }

        for caps in p.export_decl.captures_iter(&text) {
            let (Some(m), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            exports.push((
                m.start(),
                ExportDecl::value(name.as_str()).at_line(lines.line_of(m.start())),
            ));
        }

        for caps in p.export_destructure.captures_iter(&text) {
            let (Some(m), Some(pattern)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let line = lines.line_of(m.start());
            for name in parse_destructured_names(pattern.as_str()) {
                exports.push((m.start(), ExportDecl::value(name).at_line(line)));
            }
        }

        for caps in p.export_default.captures_iter(&text) {
            let Some(m) = caps.get(0) else {
                continue;
            };
            let line = lines.line_of(m.start());
            let decl = match caps.get(1).map(|w| w.as_str()) {
                Some(word) if !DEFAULT_KEYWORDS.contains(&word) => {
                    local_export(&bindings, word, DEFAULT_EXPORT.to_string(), line)
                }
                _ => ExportDecl::value(DEFAULT_EXPORT).at_line(line),
            };
            exports.push((m.start(), decl));
        }

        for caps in p.cjs_named.captures_iter(&text) {
            let (Some(m), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            exports.push((
                m.start(),
                ExportDecl::value(name.as_str()).at_line(lines.line_of(m.start())),
            ));
        }
        for m in p.cjs_default.find_iter(&text) {
            exports.push((
                m.start(),
                ExportDecl::value(DEFAULT_EXPORT).at_line(lines.line_of(m.start())),
            ));
        }

        exports.sort_by_key(|(offset, _)| *offset);
        stars.sort_by_key(|(offset, _)| *offset);

        Ok(ExtractedDeclarations {
            exports: exports.into_iter().map(|(_, d)| d).collect(),
            star_reexports: stars.into_iter().map(|(_, s)| s).collect(),
            imports: imports.into_iter().map(|(_, d)| d).collect(),
        })
    }
}

/// `export { local as exported }`: forwards when `local` is an imported binding.
fn local_export(
    bindings: &HashMap<&str, &ImportDecl>,
    local: &str,
    exported: String,
    line: usize,
) -> ExportDecl {
    match bindings.get(local) {
        Some(import) if !import.is_side_effect() => {
            ExportDecl::reexport(exported, import.source.clone(), import.name.clone())
                .at_line(line)
        }
        _ => ExportDecl::value(exported).at_line(line),
    }
}

/// Parse the clause between `import` and `from`.
///
/// Handles `Default`, `* as ns`, `{ a, b as c }` and their comma-joined
/// combinations.
fn parse_import_clause(clause: &str, source: &str) -> Vec<ImportDecl> {
    let clause = clause.trim();
    let mut out = Vec::new();

    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if close > open => {
            (&clause[..open], Some(&clause[open + 1..close]))
        }
        _ => (clause, None),
    };

    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(rest) = part.strip_prefix('*') {
            let alias = rest.trim().strip_prefix("as").map(str::trim).unwrap_or("");
            out.push(ImportDecl::namespace(source, alias));
        } else {
            out.push(ImportDecl::aliased(source, DEFAULT_EXPORT, part));
        }
    }

    if let Some(list) = named {
        for (imported, local) in parse_specifier_list(list) {
            out.push(ImportDecl::aliased(source, imported, local));
        }
    }

    out
}

/// Parse `a, b as c, type D` into `(original, local)` pairs.
fn parse_specifier_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|spec| {
            let spec = spec.strip_prefix("type ").map(str::trim).unwrap_or(spec);
            let mut words = spec.split_whitespace();
            let original = words.next().unwrap_or_default().to_string();
            let local = match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => alias.to_string(),
                _ => original.clone(),
            };
            (original, local)
        })
        .collect()
}

/// Names bound by `{ a, b: c, d = 1, ...rest }` or `[x, y]`.
fn parse_destructured_names(pattern: &str) -> Vec<String> {
    pattern
        .split(',')
        .filter_map(|part| {
            let part = part.split('=').next()?.trim();
            let part = part.rsplit(':').next()?.trim();
            let part = part.trim_start_matches("...").trim();
            let valid = !part.is_empty()
                && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
            valid.then(|| part.to_string())
        })
        .collect()
}

/// Replace comment text with spaces, keeping newlines so offsets and line
/// numbers stay valid. Returns the line of an unterminated block comment.
fn blank_comments(source: &str) -> Result<String, usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Str(char),
        Line,
        Block(usize),
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut line = 1;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::Line;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::Block(line);
                }
                '\'' | '"' | '`' => {
                    out.push(c);
                    state = State::Str(c);
                }
                _ => out.push(c),
            },
            State::Str(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        if escaped == '\n' {
                            line += 1;
                        }
                        out.push(escaped);
                    }
                } else if c == quote || (c == '\n' && quote != '`') {
                    state = State::Code;
                }
            }
            State::Line => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    out.push(' ');
                }
            }
            State::Block(_) => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
        }
    }

    match state {
        State::Block(start) => Err(start),
        _ => Ok(out),
    }
}

/// Byte offset → 1-indexed line lookup.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
}
