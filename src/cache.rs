//! Change detection for generated artifacts.
//!
//! Two JSON sidecars live next to the outputs they describe:
//! - `metadata.json` in the report output directory: per-section input hash and
//!   generation time, plus the report's semantic version.
//! - `.penwork-cache.json` in a rewrite responses directory: per-response hash of
//!   everything that went into the prompt.

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::PenworkError;

pub const METADATA_FILE: &str = "metadata.json";
pub const REWRITE_CACHE_FILE: &str = ".penwork-cache.json";
pub const DEFAULT_VERSION: &str = "1.0.0";

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 of a file's bytes, read in 4 KiB chunks. Missing file -> "".
pub fn file_hash(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex(&hasher.finalize()))
}

/// SHA-256 over several strings, NUL-separated so ("ab","c") != ("a","bc").
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    hex(&hasher.finalize())
}

fn now_iso() -> String {
    Local::now().to_rfc3339()
}

/// Decide whether a cached output must be regenerated.
///
/// - missing input: nothing to generate from, so `false`
/// - missing output: `true`
/// - stored hash differs from the input's current hash: `true`
pub fn needs_regeneration(input: &Path, output: &Path, stored_hash: Option<&str>) -> Result<bool> {
    if !input.exists() {
        warn!("Input file {} not found, skipping", input.display());
        return Ok(false);
    }
    if !output.exists() {
        info!(
            "Output file {} missing, will regenerate",
            output.display()
        );
        return Ok(true);
    }
    let current = file_hash(input)?;
    if stored_hash != Some(current.as_str()) {
        info!("Input file {} has changed, will regenerate", input.display());
        return Ok(true);
    }
    Ok(false)
}

/// MAJOR.MINOR.PATCH
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn bump_patch(self) -> Self {
        Self {
            patch: self.patch + 1,
            ..self
        }
    }
}

impl FromStr for Version {
    type Err = PenworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PenworkError::InvalidVersion(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let num = |p: &str| p.parse::<u64>().map_err(|_| invalid());
        Ok(Self {
            major: num(parts[0])?,
            minor: num(parts[1])?,
            patch: num(parts[2])?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// One generated artifact in the metadata sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generated_from_sections: bool,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub output_file: String,
}

/// The report metadata sidecar. Unknown keys survive a load/save round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_date: Option<String>,
    #[serde(flatten)]
    entries: BTreeMap<String, Value>,
}

impl Metadata {
    /// Missing or empty file loads as empty metadata; malformed JSON is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed metadata file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize metadata")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn record(&self, name: &str) -> Option<Record> {
        self.entries
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn input_hash(&self, name: &str) -> Option<String> {
        self.record(name).and_then(|r| r.input_hash)
    }

    /// Author stored directly in the sidecar, used when nothing else names one.
    pub fn author(&self) -> Option<String> {
        self.entries
            .get("author")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn put(&mut self, name: &str, record: Record) {
        // Record serialization cannot fail: plain strings and a bool
        if let Ok(value) = serde_json::to_value(record) {
            self.entries.insert(name.to_string(), value);
        }
    }

    pub fn record_generated(&mut self, name: &str, input_hash: String, output_file: &Path) {
        self.put(
            name,
            Record {
                input_hash: Some(input_hash),
                generated_from_sections: false,
                generated_at: now_iso(),
                output_file: output_file.display().to_string(),
            },
        );
    }

    pub fn record_derived(&mut self, name: &str, output_file: &Path) {
        self.put(
            name,
            Record {
                input_hash: None,
                generated_from_sections: true,
                generated_at: now_iso(),
                output_file: output_file.display().to_string(),
            },
        );
    }

    /// Parse the stored version, defaulting to 1.0.0 when absent.
    pub fn current_version(&self) -> Result<Version> {
        let raw = self.version.as_deref().unwrap_or(DEFAULT_VERSION);
        Ok(raw.parse()?)
    }
}

/// Read, bump the patch component, stamp the date and persist. One call per run.
pub fn bump_version(metadata_path: &Path) -> Result<Version> {
    let mut metadata = Metadata::load(metadata_path)?;
    let next = metadata.current_version()?.bump_patch();
    metadata.version = Some(next.to_string());
    metadata.version_date = Some(now_iso());
    metadata.save(metadata_path)?;
    debug!("Report version bumped to {}", next);
    Ok(next)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub input_hash: String,
    pub generated_at: String,
}

/// Hash cache for batch rewrite responses, keyed by path relative to the
/// responses directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteCache {
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

impl RewriteCache {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match serde_json::from_str(&content) {
            Ok(cache) => Ok(cache),
            Err(e) => {
                // A broken cache only costs regeneration
                warn!("Discarding unreadable cache {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize cache")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Fresh only when the output exists and was produced from the same inputs.
    pub fn is_fresh(&self, key: &str, input_hash: &str, output: &Path) -> bool {
        output.exists()
            && self
                .entries
                .get(key)
                .map(|e| e.input_hash == input_hash)
                .unwrap_or(false)
    }

    pub fn record(&mut self, key: &str, input_hash: String) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                input_hash,
                generated_at: now_iso(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
