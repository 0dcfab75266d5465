use anyhow::{Context, Result};
use bincache_core::cache::{BinaryCache, BuildIdIndex, BuildIdIndexWriter, IndexRecord};
use bincache_core::model::normalize_build_id;
use serde::Serialize;

use crate::commands::util::{make_inspector, require_dir, resolve_config, CommonArgs};

/// Rewrite `build_id_list` from the current cache contents.
pub fn rebuild_index_command(common: &CommonArgs) -> Result<Vec<IndexRecord>> {
    let config = resolve_config(common)?;
    require_dir(&config.cache_dir, "Cache dir")?;
    let inspector = make_inspector(&config)?;
    let cache = BinaryCache::new(&config.cache_dir);
    let records = BuildIdIndexWriter::new(inspector.as_ref())
        .write(&cache)
        .with_context(|| format!("Failed to index {}", cache.root().display()))?;

    println!("Indexed {} binaries in {}", records.len(), cache.build_id_list_path().display());
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub build_id: String,
    pub path: String,
}

/// Resolve a build-id to its cache-relative path.
///
/// The id is tried as given first, then normalized, so short ids copied from
/// other tools still match.
pub fn lookup_build_id_command(common: &CommonArgs, build_id: &str) -> Result<LookupResult> {
    let config = resolve_config(common)?;
    let cache = BinaryCache::new(&config.cache_dir);
    let index = BuildIdIndex::load(&cache)?;

    let normalized = normalize_build_id(build_id);
    let (key, path) = index
        .lookup(build_id)
        .map(|p| (build_id.to_string(), p))
        .or_else(|| index.lookup(&normalized).map(|p| (normalized.clone(), p)))
        .with_context(|| {
            format!("Build id {} not found in {}", build_id, cache.build_id_list_path().display())
        })?;

    let result = LookupResult { build_id: key, path: path.to_string() };
    println!("{}", result.path);
    Ok(result)
}

/// Print every `build_id_list` entry.
pub fn list_index_command(common: &CommonArgs, json: bool) -> Result<Vec<IndexRecord>> {
    let config = resolve_config(common)?;
    let cache = BinaryCache::new(&config.cache_dir);
    let index = BuildIdIndex::load(&cache)?;
    let records: Vec<IndexRecord> = index.records.clone();

    if json {
        let serialized = serde_json::to_string_pretty(&records)
            .context("Failed to serialize index to JSON")?;
        println!("{}", serialized);
    } else {
        println!("Index entries ({}):", records.len());
        if records.is_empty() {
            println!("  (none)");
        }
        for record in &records {
            println!("  - {} {}", record.build_id, record.path);
        }
    }
    Ok(records)
}
