use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_DIR;

/// Which ELF inspector implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorKind {
    /// Shell out to `llvm-readelf`/`readelf`.
    #[default]
    Readelf,
    /// Parse in-process (requires the `goblin-inspector` feature).
    Goblin,
}

impl InspectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectorKind::Readelf => "readelf",
            InspectorKind::Goblin => "goblin",
        }
    }
}

impl std::str::FromStr for InspectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "readelf" => Ok(InspectorKind::Readelf),
            "goblin" => Ok(InspectorKind::Goblin),
            other => Err(format!("Unknown inspector '{other}'. Allowed: readelf, goblin")),
        }
    }
}

/// Settings for a cache build, loadable from YAML or JSON.
///
/// Every field has a default so partial config files are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Cache root directory.
    pub cache_dir: PathBuf,
    /// Directories searched for local copies, in order.
    pub search_dirs: Vec<PathBuf>,
    /// Never try `adb root`.
    pub disable_adb_root: bool,
    /// Toolchain location used to find `llvm-readelf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndk_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adb_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readelf_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simpleperf_path: Option<PathBuf>,
    pub inspector: InspectorKind,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            search_dirs: Vec::new(),
            disable_adb_root: false,
            ndk_path: None,
            adb_path: None,
            readelf_path: None,
            simpleperf_path: None,
            inspector: InspectorKind::default(),
        }
    }
}

/// Load a builder config from `.yaml`, `.yml` or `.json`.
pub fn load_builder_config(path: &Path) -> Result<BuilderConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read builder config at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&body)
            .with_context(|| format!("Failed to parse YAML config {}", path.display())),
        "json" => serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse JSON config {}", path.display())),
        other => Err(anyhow!(
            "Unsupported config format '{}' for {} (expected yaml, yml or json)",
            other,
            path.display()
        )),
    }
}
