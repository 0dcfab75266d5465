use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Cache root used when nothing else is configured.
pub const DEFAULT_CACHE_DIR: &str = "binary_cache";

/// Name of the build-id index inside the cache root.
pub const BUILD_ID_LIST_FILE: &str = "build_id_list";

/// Name of the pulled kernel symbol table inside the cache root.
pub const KALLSYMS_FILE: &str = "kallsyms";

/// Map a path recorded in the trace to a path relative to the cache root.
///
/// A single leading `/` is dropped, then every `/` becomes the host separator.
/// Pure; never fails.
pub fn cache_relative_path(original: &str) -> PathBuf {
    let trimmed = original.strip_prefix('/').unwrap_or(original);
    PathBuf::from(trimmed.split('/').collect::<Vec<_>>().join(MAIN_SEPARATOR_STR))
}

/// Logical view of the cache directory.
///
/// Does not touch the filesystem; sources and the index writer do the IO.
#[derive(Debug, Clone)]
pub struct BinaryCache {
    root: PathBuf,
}

impl BinaryCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location inside the cache for a binary recorded in the trace.
    ///
    /// Only normal components of the mapped path are joined, so `..` or a
    /// leftover root never lead outside the cache root.
    pub fn path_in_cache(&self, original: &str) -> PathBuf {
        let relative = cache_relative_path(original);
        let mut path = self.root.clone();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        path
    }

    pub fn build_id_list_path(&self) -> PathBuf {
        self.root.join(BUILD_ID_LIST_FILE)
    }

    pub fn kallsyms_path(&self) -> PathBuf {
        self.root.join(KALLSYMS_FILE)
    }

    /// Render `path` relative to the cache root with `/` separators.
    ///
    /// Returns `None` for paths outside the root and for paths that are not
    /// valid UTF-8.
    pub fn relative_string(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_str().map(str::to_string)),
                _ => None,
            })
            .collect::<Option<Vec<String>>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}
