//! Incremental extraction cache using SHA-256 for change detection.
//!
//! Performance characteristics:
//! - Parallel file hashing and extraction via Rayon
//! - Read-once pattern: file content read once, then hashed and extracted
//! - O(changed_files) extraction work, O(1) cache lookups
//!
//! # Cache Versioning
//!
//! The cache carries version metadata and is discarded when:
//! - the cache format version changes
//! - the major version of deadexport changes (extraction rules may differ)

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::error::{DeadexportError, IoResultExt};
use crate::extract::{DeclarationExtractor, ExtractedDeclarations};
use crate::module_id::ModuleId;

/// Directory holding deadexport state, relative to the project root.
pub const CACHE_DIR: &str = ".deadexport";

/// Maximum cache file size (50MB).
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when the cache format changes.
const CACHE_VERSION: u32 = 1;

const DEADEXPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cached declarations of one module, tagged with the hash of its source.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedModule {
    pub hash: String,
    pub declarations: ExtractedDeclarations,
}

/// Cache metadata for version checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheMetadata {
    pub cache_version: u32,
    pub deadexport_version: String,
    #[serde(default)]
    pub created_at: u64,
}

impl CacheMetadata {
    /// Create metadata for the running build.
    pub fn current() -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            cache_version: CACHE_VERSION,
            deadexport_version: DEADEXPORT_VERSION.to_string(),
            created_at,
        }
    }

    /// Check if this cache is compatible with the running build.
    pub fn is_compatible(&self) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        let current_major = DEADEXPORT_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.deadexport_version.split('.').next().unwrap_or("0");

        current_major == cached_major
    }
}

/// The full cache model, stored in `.deadexport/cache.json`.
///
/// Keyed by module identifier so renames never hit a stale entry.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DeadexportCache {
    #[serde(default)]
    pub metadata: CacheMetadata,
    pub modules: BTreeMap<String, CachedModule>,
}

/// Compute SHA-256 hash from bytes (in-memory, no I/O).
#[inline]
fn hash_bytes(bytes: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(bytes);
    format!("{:x}", sha.finalize())
}

/// Compute the SHA-256 hash of a file's content.
pub fn file_hash(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read {} for hashing", path.display()))?;
    Ok(hash_bytes(&bytes))
}

fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_DIR).join("cache.json")
}

/// Load the cache from `.deadexport/cache.json`.
///
/// Returns `None` if the file is missing, corrupted, or from an
/// incompatible version. An incompatible cache is removed.
pub fn load_cache(root: &Path) -> Option<DeadexportCache> {
    let path = cache_path(root);
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    let cache: DeadexportCache = match serde_json::from_str(&text) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unreadable cache");
            return None;
        }
    };

    if !cache.metadata.is_compatible() {
        info!(
            cached_version = cache.metadata.cache_version,
            cached_release = %cache.metadata.deadexport_version,
            current_version = CACHE_VERSION,
            "cache version mismatch, rebuilding"
        );
        let _ = fs::remove_file(&path);
        return None;
    }

    Some(cache)
}

/// Save the cache to disk.
///
/// Writes to a uniquely named temp file and renames it into place, so a
/// reader never sees a partial file. A cache over the size cap is dropped.
pub fn save_cache(root: &Path, cache: &DeadexportCache) -> Result<()> {
    let dir = root.join(CACHE_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_path(&dir)?;
    }

    let path = dir.join("cache.json");
    let json = serde_json::to_string_pretty(cache)
        .map_err(|e| DeadexportError::cache(format!("serialization failed: {}", e)))?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        warn!(
            limit_mb = MAX_CACHE_SIZE_BYTES / 1_000_000,
            "cache exceeds size limit, clearing"
        );
        let _ = fs::remove_file(&path);
        return Ok(());
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("cache.json.{}.{}.tmp", std::process::id(), nanos));

    fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp cache file: {}", temp_path.display()))?;

    fs::rename(&temp_path, &path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename cache file to: {}", path.display())
    })?;

    Ok(())
}

/// Result of extracting one file.
enum FileProcessResult {
    Extracted {
        id: ModuleId,
        declarations: ExtractedDeclarations,
        entry: CachedModule,
        cache_hit: bool,
    },
    /// The file could not be read or the extractor rejected it
    Failed { id: ModuleId, error: DeadexportError },
}

/// Everything produced by one extraction pass.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Extracted modules, in input file order
    pub modules: Vec<(ModuleId, ExtractedDeclarations)>,
    /// Files that could not be read or that the extractor rejected
    pub failures: Vec<(ModuleId, DeadexportError)>,
    pub cache_hits: usize,
    /// Cache contents reflecting this pass
    pub cache: DeadexportCache,
}

/// Read, hash, and extract one file, reusing a cached result on hash match.
fn process_file<E: DeclarationExtractor>(
    file: &Path,
    old_cache: Option<&DeadexportCache>,
    extractor: &E,
    case_insensitive: bool,
) -> FileProcessResult {
    let id = ModuleId::with_case(file, case_insensitive);

    let bytes = match fs::read(file).with_path(file) {
        Ok(b) => b,
        Err(error) => return FileProcessResult::Failed { id, error },
    };

    let hash = hash_bytes(&bytes);

    if let Some(cached) = old_cache.and_then(|c| c.modules.get(id.as_str())) {
        if cached.hash == hash {
            return FileProcessResult::Extracted {
                id,
                declarations: cached.declarations.clone(),
                entry: cached.clone(),
                cache_hit: true,
            };
        }
    }

    // Stray non-UTF-8 bytes (Latin-1 comments and the like) are replaced, not fatal.
    let content = String::from_utf8_lossy(&bytes);
    match extractor.extract(&id, &content) {
        Ok(declarations) => FileProcessResult::Extracted {
            entry: CachedModule {
                hash,
                declarations: declarations.clone(),
            },
            id,
            declarations,
            cache_hit: false,
        },
        Err(error) => FileProcessResult::Failed { id, error },
    }
}

/// Extract every file in parallel, consulting `old_cache` first.
///
/// Fault tolerance:
/// - unchanged hash: cached declarations are reused without extraction
/// - unreadable file or extractor error: reported in `failures`, never cached
/// - invalid UTF-8: decoded lossily and extracted
pub fn incremental_extract<E: DeclarationExtractor>(
    files: &[PathBuf],
    old_cache: Option<&DeadexportCache>,
    extractor: &E,
    case_insensitive: bool,
) -> ExtractionOutcome {
    let results: Vec<FileProcessResult> = files
        .par_iter()
        .map(|file| process_file(file, old_cache, extractor, case_insensitive))
        .collect();

    let mut outcome = ExtractionOutcome {
        cache: DeadexportCache {
            metadata: CacheMetadata::current(),
            modules: BTreeMap::new(),
        },
        ..ExtractionOutcome::default()
    };

    for result in results {
        match result {
            FileProcessResult::Extracted {
                id,
                declarations,
                entry,
                cache_hit,
            } => {
                if cache_hit {
                    outcome.cache_hits += 1;
                }
                outcome.cache.modules.insert(id.as_str().to_string(), entry);
                outcome.modules.push((id, declarations));
            }
            FileProcessResult::Failed { id, error } => {
                warn!(module = %id, error = %error, "extraction failed");
                outcome.failures.push((id, error));
            }
        }
    }

    debug!(
        files = files.len(),
        cache_hits = outcome.cache_hits,
        failures = outcome.failures.len(),
        "extraction finished"
    );
    outcome
}
