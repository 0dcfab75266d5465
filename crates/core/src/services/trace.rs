use std::path::Path;

use crate::error::CacheResult;

/// One frame of a sample: the binary (dso) it falls in and, if resolved, the
/// symbol name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSymbol {
    pub dso_name: String,
    pub symbol_name: Option<String>,
}

impl SampleSymbol {
    pub fn new(dso_name: impl Into<String>) -> Self {
        Self { dso_name: dso_name.into(), symbol_name: None }
    }
}

/// Sequential access to the samples of a recorded trace.
pub trait TraceReader {
    fn set_record_file(&mut self, path: &Path) -> CacheResult<()>;

    /// Advance to the next sample; `false` once the trace is exhausted.
    fn next_sample(&mut self) -> CacheResult<bool>;

    /// Frame the current sample was taken in.
    fn symbol_of_current_sample(&self) -> Option<&SampleSymbol>;

    /// Caller frames of the current sample, innermost first.
    fn callchain_of_current_sample(&self) -> &[SampleSymbol];

    /// Build-id recorded for a dso, or an empty string.
    fn build_id_for_path(&self, dso_name: &str) -> String;
}
