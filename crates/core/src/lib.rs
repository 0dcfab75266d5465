//! bincache-core
//!
//! Core library for building a local cache of the binaries referenced by a
//! profiling trace.
//!
//! The pipeline is one-directional: the trace is scanned for the binaries it
//! uses, one or more sources copy matching files into the cache, and a
//! `build_id_list` index is written for downstream symbolizers.
//!
//! External tools (ELF inspection, the device bridge, the trace dumper) sit
//! behind traits in [`services`] so the decision logic can be exercised with
//! in-memory fakes.

pub mod cache;
pub mod error;
pub mod model;
pub mod services;

pub use error::{CacheError, CacheResult};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
