//! Binary sources that populate the cache.
//!
//! Each source receives the required-binary mapping read-only and writes
//! matching files into the cache. The builder runs them in order, cheapest
//! first.

pub mod device;
pub mod lib_dirs;

pub use device::{DeviceSource, PullStrategy, DEVICE_SCRATCH_DIR};
pub use lib_dirs::LibDirSource;

use serde::{Deserialize, Serialize};

use crate::cache::BinaryCache;
use crate::error::CacheResult;
use crate::model::RequiredBinaries;

/// What a single source did during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    /// Original paths written into the cache by this source.
    pub collected: Vec<String>,
    /// Original paths whose cached copy was already good enough.
    pub reused: Vec<String>,
    /// Original paths this source tried and failed to fetch.
    pub failed: Vec<String>,
    /// Whether a kernel symbol table was pulled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub kernel_symbols: bool,
}

impl SourceReport {
    pub fn new(source: &str) -> Self {
        Self { source: source.to_string(), ..Self::default() }
    }
}

/// Trait implemented by every place binaries can be collected from.
pub trait BinarySource {
    fn collect(
        &self,
        binaries: &RequiredBinaries,
        cache: &BinaryCache,
    ) -> CacheResult<SourceReport>;

    fn name(&self) -> &'static str;
}
