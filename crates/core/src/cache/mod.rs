//! On-disk cache layout, the build-id index and builder configuration.
//!
//! - `BinaryCache`: maps trace paths to files under the cache root.
//! - `BuildIdIndexWriter` / `BuildIdIndex`: write and read `build_id_list`.
//! - `BuilderConfig`: serializable settings for a build.

pub mod config;
pub mod index;
pub mod layout;

pub use config::{load_builder_config, BuilderConfig, InspectorKind};
pub use index::{BuildIdIndex, BuildIdIndexWriter, IndexRecord};
pub use layout::{
    cache_relative_path, BinaryCache, BUILD_ID_LIST_FILE, DEFAULT_CACHE_DIR, KALLSYMS_FILE,
};
