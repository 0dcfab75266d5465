use std::fs::{self, File};
use std::io::{BufWriter, Write};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use crate::cache::BinaryCache;
use crate::error::{io_at, CacheError, CacheResult};
use crate::services::elf::ElfInspector;

/// One `build_id=relative_path` line of `build_id_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub build_id: String,
    pub path: String,
}

/// Writes `build_id_list` from the full current contents of the cache.
pub struct BuildIdIndexWriter<'a> {
    pub inspector: &'a dyn ElfInspector,
}

impl<'a> BuildIdIndexWriter<'a> {
    pub fn new(inspector: &'a dyn ElfInspector) -> Self {
        Self { inspector }
    }

    /// Regenerate the index, replacing any previous one.
    ///
    /// Files without a build-id are left out. Lines end in a bare `\n` on
    /// every host.
    pub fn write(&self, cache: &BinaryCache) -> CacheResult<Vec<IndexRecord>> {
        fs::create_dir_all(cache.root()).map_err(io_at(cache.root()))?;
        let index_path = cache.build_id_list_path();

        let mut records = Vec::new();
        for entry in WalkDir::new(cache.root()).sort_by_file_name() {
            let entry = entry
                .map_err(|source| CacheError::Walk { path: cache.root().to_path_buf(), source })?;
            if !names_a_file(&entry) || entry.path() == index_path {
                continue;
            }
            let build_id = self.inspector.build_id(entry.path());
            if build_id.is_empty() {
                continue;
            }
            match cache.relative_string(entry.path()) {
                Some(path) => records.push(IndexRecord { build_id, path }),
                None => debug!("not indexing {}: path is not UTF-8", entry.path().display()),
            }
        }

        let file = File::create(&index_path).map_err(io_at(&index_path))?;
        let mut out = BufWriter::new(file);
        for record in &records {
            out.write_all(format!("{}={}\n", record.build_id, record.path).as_bytes())
                .map_err(io_at(&index_path))?;
        }
        out.flush().map_err(io_at(&index_path))?;

        info!("wrote {} entries to {}", records.len(), index_path.display());
        Ok(records)
    }
}

/// A regular file, or a symlink that resolves to one.
pub(crate) fn names_a_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Parsed `build_id_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIdIndex {
    pub records: Vec<IndexRecord>,
}

impl BuildIdIndex {
    /// Read the index of `cache`. A missing index is an empty one.
    pub fn load(cache: &BinaryCache) -> CacheResult<Self> {
        let path = cache.build_id_list_path();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let body = fs::read_to_string(&path).map_err(io_at(&path))?;
        Ok(Self::parse(&body))
    }

    /// Parse index text. Lines without `=` are ignored.
    pub fn parse(body: &str) -> Self {
        let records = body
            .lines()
            .filter_map(|line| {
                let (build_id, path) = line.split_once('=')?;
                if build_id.is_empty() || path.is_empty() {
                    return None;
                }
                Some(IndexRecord { build_id: build_id.to_string(), path: path.to_string() })
            })
            .collect();
        Self { records }
    }

    pub fn lookup(&self, build_id: &str) -> Option<&str> {
        self.records.iter().find(|r| r.build_id == build_id).map(|r| r.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
