//! Configuration loading from deadexport.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

/// File name looked up at the project root.
pub const CONFIG_FILE: &str = "deadexport.toml";

/// Main configuration structure for deadexport.toml.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeadexportConfig {
    /// Entry modules, relative to the project root.
    pub entries: Option<Vec<String>>,
    /// Export or module name patterns to leave out of the report.
    pub ignore: Option<Vec<String>>,
    /// Extra directory names to skip while scanning.
    pub exclude_dirs: Option<Vec<String>>,
    /// Resolution extensions, in priority order (e.g. `[".ts", ".js"]`).
    pub extensions: Option<Vec<String>>,
    /// Lowercase module identifiers.
    pub case_insensitive: Option<bool>,
    /// Count every export of an entry module as used.
    pub entry_exports_used: Option<bool>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl DeadexportConfig {
    /// True when `[output] format = "json"`.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from deadexport.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<DeadexportConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content).context("Invalid deadexport.toml")?;
    Ok(Some(cfg))
}
