use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::cache::BinaryCache;
use crate::error::{io_at, CacheResult};
use crate::model::{file_name_of, RequiredBinaries, ANON_DSO_PATH, DEVICE_NODE_PREFIX};
use crate::services::device::DeviceBridge;
use crate::services::elf::ElfInspector;
use crate::services::sources::{BinarySource, SourceReport};

/// World-readable directory on the device used to stage unreadable files.
pub const DEVICE_SCRATCH_DIR: &str = "/data/local/tmp";

/// Device path of the live kernel symbol table.
const DEVICE_KALLSYMS: &str = "/proc/kallsyms";

/// One way of getting a file off the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullStrategy {
    /// `pull` the path as is.
    Direct,
    /// Copy into `scratch_dir` with the device shell, pull the copy, then
    /// delete it. Needed for app-private files on non-root devices.
    ViaScratchCopy { scratch_dir: String },
}

impl PullStrategy {
    /// Strategies tried in order until one succeeds.
    pub fn default_chain() -> Vec<PullStrategy> {
        vec![
            PullStrategy::Direct,
            PullStrategy::ViaScratchCopy { scratch_dir: DEVICE_SCRATCH_DIR.to_string() },
        ]
    }

    pub fn attempt(&self, bridge: &dyn DeviceBridge, device_path: &str, host_path: &Path) -> bool {
        match self {
            PullStrategy::Direct => bridge.pull(device_path, host_path),
            PullStrategy::ViaScratchCopy { scratch_dir } => {
                let staged = format!("{}/{}", scratch_dir, file_name_of(device_path));
                if bridge.shell(&["cp", device_path, scratch_dir.as_str()])
                    && bridge.pull(&staged, host_path)
                {
                    bridge.shell(&["rm", staged.as_str()]);
                    return true;
                }
                false
            }
        }
    }
}

/// Pulls binaries from a connected device, plus the kernel symbol table.
pub struct DeviceSource<'a> {
    inspector: &'a dyn ElfInspector,
    bridge: &'a dyn DeviceBridge,
    strategies: Vec<PullStrategy>,
}

impl<'a> DeviceSource<'a> {
    pub fn new(inspector: &'a dyn ElfInspector, bridge: &'a dyn DeviceBridge) -> Self {
        Self { inspector, bridge, strategies: PullStrategy::default_chain() }
    }

    pub fn with_strategies(mut self, strategies: Vec<PullStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Paths that can never name a file on the device.
    pub fn is_pullable(path: &str) -> bool {
        path.starts_with('/') && path != ANON_DSO_PATH && !path.starts_with(DEVICE_NODE_PREFIX)
    }

    fn collect_binary(
        &self,
        path: &str,
        expected_build_id: &str,
        cache: &BinaryCache,
        report: &mut SourceReport,
    ) -> CacheResult<()> {
        if !Self::is_pullable(path) {
            return Ok(());
        }
        let cache_file = cache.path_in_cache(path);

        // An existing copy is trusted without comparing against the device.
        if cache_file.is_file()
            && (expected_build_id.is_empty()
                || expected_build_id == self.inspector.build_id(&cache_file))
        {
            info!("use current file in binary_cache: {}", cache_file.display());
            report.reused.push(path.to_string());
            return Ok(());
        }

        info!("pull file to binary_cache: {} to {}", path, cache_file.display());
        if let Some(dir) = cache_file.parent() {
            fs::create_dir_all(dir).map_err(io_at(dir))?;
        }
        if cache_file.is_file() {
            fs::remove_file(&cache_file).map_err(io_at(&cache_file))?;
        }
        if self.pull_file(path, &cache_file) {
            report.collected.push(path.to_string());
        } else {
            warn!("failed to pull {} from device", path);
            report.failed.push(path.to_string());
        }
        Ok(())
    }

    fn pull_file(&self, device_path: &str, host_path: &Path) -> bool {
        self.strategies.iter().any(|s| s.attempt(self.bridge, device_path, host_path))
    }

    /// Replace the cached kernel symbol table. Needs root; without it the
    /// file is simply absent.
    fn pull_kernel_symbols(&self, cache: &BinaryCache) -> CacheResult<bool> {
        let path = cache.kallsyms_path();
        if path.is_file() {
            fs::remove_file(&path).map_err(io_at(&path))?;
        }
        if !self.bridge.switch_to_root() {
            info!("no root on device; skipping kernel symbols");
            return Ok(false);
        }
        fs::create_dir_all(cache.root()).map_err(io_at(cache.root()))?;
        self.bridge.shell(&["echo", "0", ">/proc/sys/kernel/kptr_restrict"]);
        Ok(self.bridge.pull(DEVICE_KALLSYMS, &path))
    }
}

impl BinarySource for DeviceSource<'_> {
    fn collect(
        &self,
        binaries: &RequiredBinaries,
        cache: &BinaryCache,
    ) -> CacheResult<SourceReport> {
        let mut report = SourceReport::new(self.name());
        if !self.bridge.is_device_available() {
            info!("no device available; skipping device pulls");
            return Ok(report);
        }
        for (path, build_id) in binaries.iter() {
            self.collect_binary(path, build_id, cache, &mut report)?;
        }
        report.kernel_symbols = self.pull_kernel_symbols(cache)?;
        Ok(report)
    }

    fn name(&self) -> &'static str {
        "device"
    }
}
