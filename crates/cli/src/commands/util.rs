use std::path::PathBuf;

use anyhow::{anyhow, Result};
use bincache_core::cache::{load_builder_config, BuilderConfig, InspectorKind};
use bincache_core::services::elf::ElfInspector;
use bincache_core::services::inspectors::ReadElfInspector;
use clap::Args;

/// Flags shared by every command that touches a cache.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Builder config file (.yaml, .yml or .json).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cache root directory. Defaults to `binary_cache`.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// ELF inspector: `readelf` (external tool) or `goblin` (in-process).
    #[arg(long)]
    pub inspector: Option<InspectorKind>,

    /// Toolchain directory used to find llvm-readelf.
    #[arg(long)]
    pub ndk_path: Option<PathBuf>,

    /// Explicit readelf executable.
    #[arg(long)]
    pub readelf: Option<PathBuf>,
}

/// Load the config file (if any) and apply the shared flag overrides.
pub fn resolve_config(common: &CommonArgs) -> Result<BuilderConfig> {
    let mut config = match &common.config {
        Some(path) => load_builder_config(path)?,
        None => BuilderConfig::default(),
    };
    if let Some(dir) = &common.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(kind) = common.inspector {
        config.inspector = kind;
    }
    if let Some(ndk) = &common.ndk_path {
        config.ndk_path = Some(ndk.clone());
    }
    if let Some(readelf) = &common.readelf {
        config.readelf_path = Some(readelf.clone());
    }
    Ok(config)
}

/// Construct the configured ELF inspector.
pub fn make_inspector(config: &BuilderConfig) -> Result<Box<dyn ElfInspector>> {
    match config.inspector {
        InspectorKind::Readelf => Ok(Box::new(ReadElfInspector::locate(
            config.readelf_path.as_deref(),
            config.ndk_path.as_deref(),
        )?)),
        #[cfg(feature = "goblin-inspector")]
        InspectorKind::Goblin => Ok(Box::new(bincache_core::services::inspectors::GoblinInspector)),
        #[cfg(not(feature = "goblin-inspector"))]
        InspectorKind::Goblin => {
            Err(anyhow!("The goblin inspector is not compiled in (enable the goblin-inspector feature)"))
        }
    }
}

/// Fail unless `path` is an existing directory.
pub fn require_dir(path: &std::path::Path, what: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(anyhow!("{} does not exist: {}", what, path.display()));
    }
    Ok(())
}
