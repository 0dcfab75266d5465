use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use crate::cache::{BinaryCache, BuildIdIndexWriter, IndexRecord};
use crate::error::CacheResult;
use crate::model::{is_jit_symfile, RequiredBinaries, KERNEL_DSO_NAME, VMLINUX};
use crate::services::device::DeviceBridge;
use crate::services::elf::ElfInspector;
use crate::services::sources::{BinarySource, DeviceSource, LibDirSource, SourceReport};
use crate::services::trace::TraceReader;

/// Summary of one cache build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub trace_path: String,
    pub cache_dir: String,
    pub started_at: String,
    pub finished_at: String,
    pub binaries: RequiredBinaries,
    pub sources: Vec<SourceReport>,
    pub index_entries: usize,
}

/// Collects every binary a trace needs into a cache and indexes it.
///
/// Local directories run before the device, so binaries already matched
/// locally are not pulled again.
pub struct BinaryCacheBuilder<'a> {
    inspector: &'a dyn ElfInspector,
    device: &'a dyn DeviceBridge,
    cache: BinaryCache,
    binaries: RequiredBinaries,
}

impl<'a> BinaryCacheBuilder<'a> {
    pub fn new(
        inspector: &'a dyn ElfInspector,
        device: &'a dyn DeviceBridge,
        cache: BinaryCache,
    ) -> Self {
        Self { inspector, device, cache, binaries: RequiredBinaries::new() }
    }

    pub fn cache(&self) -> &BinaryCache {
        &self.cache
    }

    /// Binaries discovered by the last trace scan.
    pub fn binaries(&self) -> &RequiredBinaries {
        &self.binaries
    }

    /// Run the whole pipeline.
    ///
    /// Only a missing search directory (or an unexpected filesystem error)
    /// fails the build; device problems just leave binaries out.
    pub fn build(
        &mut self,
        reader: &mut dyn TraceReader,
        trace_path: &Path,
        search_dirs: &[PathBuf],
    ) -> CacheResult<BuildReport> {
        let started_at = Utc::now().to_rfc3339();
        self.collect_used_binaries(reader, trace_path)?;

        let mut sources = Vec::new();
        if let Some(report) = self.copy_binaries_from_search_dirs(search_dirs)? {
            sources.push(report);
        }
        sources.push(self.pull_binaries_from_device()?);
        let index = self.create_build_id_list()?;

        Ok(BuildReport {
            trace_path: trace_path.display().to_string(),
            cache_dir: self.cache.root().display().to_string(),
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            binaries: self.binaries.clone(),
            sources,
            index_entries: index.len(),
        })
    }

    /// Scan every sample and callchain frame for the binaries in use.
    pub fn collect_used_binaries(
        &mut self,
        reader: &mut dyn TraceReader,
        trace_path: &Path,
    ) -> CacheResult<()> {
        reader.set_record_file(trace_path)?;
        let mut binaries = RequiredBinaries::new();
        while reader.next_sample()? {
            let frames = reader
                .symbol_of_current_sample()
                .into_iter()
                .chain(reader.callchain_of_current_sample().iter());
            for frame in frames {
                let dso_name = frame.dso_name.as_str();
                let name = if dso_name == KERNEL_DSO_NAME { VMLINUX } else { dso_name };
                if binaries.contains(name) || is_jit_symfile(dso_name) {
                    continue;
                }
                binaries.insert_if_absent(name, reader.build_id_for_path(dso_name));
            }
        }
        info!("trace {} uses {} binaries", trace_path.display(), binaries.len());
        self.binaries = binaries;
        Ok(())
    }

    /// Copy matches from `search_dirs`. `None` when no directories are given.
    pub fn copy_binaries_from_search_dirs(
        &self,
        search_dirs: &[PathBuf],
    ) -> CacheResult<Option<SourceReport>> {
        if search_dirs.is_empty() {
            return Ok(None);
        }
        let source = LibDirSource::new(self.inspector, search_dirs)?;
        self.collect_from(&source).map(Some)
    }

    pub fn pull_binaries_from_device(&self) -> CacheResult<SourceReport> {
        self.collect_from(&DeviceSource::new(self.inspector, self.device))
    }

    /// Run any source against the current required-binary mapping.
    pub fn collect_from(&self, source: &dyn BinarySource) -> CacheResult<SourceReport> {
        let report = source.collect(&self.binaries, &self.cache)?;
        info!(
            "{}: {} collected, {} reused, {} failed",
            source.name(),
            report.collected.len(),
            report.reused.len(),
            report.failed.len()
        );
        Ok(report)
    }

    pub fn create_build_id_list(&self) -> CacheResult<Vec<IndexRecord>> {
        BuildIdIndexWriter::new(self.inspector).write(&self.cache)
    }
}
