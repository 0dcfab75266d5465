//! Data model shared by the trace scan, the binary sources and the index.

use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

/// Dso name the trace reader reports for kernel samples.
pub const KERNEL_DSO_NAME: &str = "[kernel.kallsyms]";

/// Key kernel samples are recorded under in [`RequiredBinaries`].
pub const VMLINUX: &str = "vmlinux";

/// Path recorded for anonymous executable mappings.
pub const ANON_DSO_PATH: &str = "//anon";

/// Device nodes are never pullable binaries.
pub const DEVICE_NODE_PREFIX: &str = "/dev/";

/// Filename prefix of the symbol files the profiler writes for JIT code while
/// recording.
pub const JIT_SYMFILE_PREFIX: &str = "TemporaryFile";

/// Number of hex digits in a normalized build-id.
const BUILD_ID_HEX_LEN: usize = 40;

/// Last `/`-delimited component of a path as recorded in the trace.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// True for symbol files materialized by the profiler during recording.
pub fn is_jit_symfile(dso_name: &str) -> bool {
    file_name_of(dso_name).starts_with(JIT_SYMFILE_PREFIX)
}

/// Normalize a build-id to `0x` followed by 40 lowercase hex digits.
///
/// Shorter ids are zero padded, longer ones truncated. An empty (or `0x`-only)
/// input stays empty, meaning "unknown".
pub fn normalize_build_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    if hex.is_empty() {
        return String::new();
    }
    let mut digits: String = hex.chars().take(BUILD_ID_HEX_LEN).collect();
    while digits.len() < BUILD_ID_HEX_LEN {
        digits.push('0');
    }
    format!("0x{digits}")
}

/// How much debug information an ELF file retains. Lower is more useful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrippedLevel {
    /// Has `.debug_line`.
    LineInfo = 0,
    /// Has `.symtab` but no line info.
    SymbolTable = 1,
    Stripped = 2,
}

impl StrippedLevel {
    pub fn from_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut level = StrippedLevel::Stripped;
        for section in sections {
            match section.as_ref() {
                ".debug_line" => return StrippedLevel::LineInfo,
                ".symtab" => level = StrippedLevel::SymbolTable,
                _ => {}
            }
        }
        level
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Binaries a trace needs, keyed by the path recorded in the trace.
///
/// Values are normalized build-ids; an empty string means the trace did not
/// record one. The first build-id seen for a path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredBinaries {
    entries: BTreeMap<String, String>,
}

impl RequiredBinaries {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Record `path` unless it is already known. Returns whether it was added.
    pub fn insert_if_absent(&mut self, path: impl Into<String>, build_id: impl Into<String>) -> bool {
        match self.entries.entry(path.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(build_id.into());
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn build_id(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Iterate `(path, expected_build_id)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, b)| (p.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, B: Into<String>> FromIterator<(P, B)> for RequiredBinaries {
    fn from_iter<T: IntoIterator<Item = (P, B)>>(iter: T) -> Self {
        let mut out = RequiredBinaries::new();
        for (path, build_id) in iter {
            out.insert_if_absent(path, build_id);
        }
        out
    }
}
