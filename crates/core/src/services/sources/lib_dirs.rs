use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use walkdir::WalkDir;

use crate::cache::index::names_a_file;
use crate::cache::BinaryCache;
use crate::error::{io_at, CacheError, CacheResult};
use crate::model::{file_name_of, RequiredBinaries};
use crate::services::elf::ElfInspector;
use crate::services::sources::{BinarySource, SourceReport};

/// Collects binaries from local directories.
///
/// A locally built library rarely lives at the path recorded on the device
/// (`debug/arm64/libfoo.so` vs `/data/app/<pkg>/lib/arm64/libfoo.so`), so files
/// are matched by filename and build-id instead of by path.
pub struct LibDirSource<'a> {
    inspector: &'a dyn ElfInspector,
    lib_dirs: Vec<PathBuf>,
}

impl<'a> LibDirSource<'a> {
    /// Fails on the first directory that does not exist.
    pub fn new(inspector: &'a dyn ElfInspector, lib_dirs: &[PathBuf]) -> CacheResult<Self> {
        for dir in lib_dirs {
            if !dir.is_dir() {
                error!("can't find dir {}", dir.display());
                return Err(CacheError::MissingSearchDir(dir.clone()));
            }
        }
        Ok(Self { inspector, lib_dirs: lib_dirs.to_vec() })
    }

    pub fn lib_dirs(&self) -> &[PathBuf] {
        &self.lib_dirs
    }

    /// Decide whether `from` should replace whatever is at `to`.
    ///
    /// Copies when `to` is missing or has another build-id, or when `from` is
    /// strictly less stripped than `to`.
    pub fn need_to_copy(&self, from: &Path, to: &Path, expected_build_id: &str) -> bool {
        if !to.is_file() || self.inspector.build_id(to) != expected_build_id {
            return true;
        }
        self.inspector.stripped_level(from) < self.inspector.stripped_level(to)
    }

    fn search_dir(
        &self,
        lib_dir: &Path,
        by_filename: &HashMap<&str, Vec<(&str, &str)>>,
        cache: &BinaryCache,
        report: &mut SourceReport,
    ) -> CacheResult<()> {
        for entry in WalkDir::new(lib_dir).sort_by_file_name() {
            let entry = entry
                .map_err(|source| CacheError::Walk { path: lib_dir.to_path_buf(), source })?;
            if !names_a_file(&entry) {
                continue;
            }
            let Some(candidates) = entry.file_name().to_str().and_then(|n| by_filename.get(n))
            else {
                continue;
            };
            let build_id = self.inspector.build_id(entry.path());
            for &(path, expected_build_id) in candidates {
                if expected_build_id != build_id {
                    continue;
                }
                let to = cache.path_in_cache(path);
                if self.copy_to_cache(entry.path(), expected_build_id, &to)? {
                    if !report.collected.iter().any(|p| p == path) {
                        report.collected.push(path.to_string());
                    }
                } else if !report.reused.iter().any(|p| p == path) {
                    report.reused.push(path.to_string());
                }
            }
        }
        Ok(())
    }

    fn copy_to_cache(&self, from: &Path, expected_build_id: &str, to: &Path) -> CacheResult<bool> {
        if !self.need_to_copy(from, to, expected_build_id) {
            // The cached file carries at least as much debug info.
            return Ok(false);
        }
        if let Some(dir) = to.parent() {
            fs::create_dir_all(dir).map_err(io_at(dir))?;
        }
        info!("copy to binary_cache: {} to {}", from.display(), to.display());
        fs::copy(from, to).map_err(io_at(to))?;
        Ok(true)
    }
}

/// Group required binaries by their filename.
pub fn build_filename_index(binaries: &RequiredBinaries) -> HashMap<&str, Vec<(&str, &str)>> {
    let mut index: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
    for (path, build_id) in binaries.iter() {
        index.entry(file_name_of(path)).or_default().push((path, build_id));
    }
    index
}

impl BinarySource for LibDirSource<'_> {
    fn collect(
        &self,
        binaries: &RequiredBinaries,
        cache: &BinaryCache,
    ) -> CacheResult<SourceReport> {
        let by_filename = build_filename_index(binaries);
        let mut report = SourceReport::new(self.name());
        for lib_dir in &self.lib_dirs {
            self.search_dir(lib_dir, &by_filename, cache, &mut report)?;
        }
        // A path copied from a later directory is no longer merely reused.
        report.reused.retain(|p| !report.collected.contains(p));
        Ok(report)
    }

    fn name(&self) -> &'static str {
        "lib-dirs"
    }
}
