use std::collections::BTreeSet;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, CacheResult};
use crate::model::normalize_build_id;
use crate::services::elf::{is_elf_file, ElfInspector};
use crate::services::tools::{find_in_path, run_tool};

/// Inspector that shells out to `llvm-readelf` (or binutils `readelf`).
pub struct ReadElfInspector {
    readelf: PathBuf,
}

impl ReadElfInspector {
    pub fn new(readelf: impl Into<PathBuf>) -> Self {
        Self { readelf: readelf.into() }
    }

    /// Find a readelf binary.
    ///
    /// Precedence:
    /// - `explicit`, when given and present.
    /// - `READELF` pointing directly to the executable.
    /// - `llvm-readelf` inside the toolchain at `ndk_path`.
    /// - `llvm-readelf`, then `readelf`, on `PATH`.
    pub fn locate(explicit: Option<&Path>, ndk_path: Option<&Path>) -> CacheResult<Self> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(Self::new(path));
            }
            return Err(CacheError::Tool(format!("readelf not found at {}", path.display())));
        }
        if let Some(path) = env::var_os("READELF").map(PathBuf::from) {
            if path.is_file() {
                return Ok(Self::new(path));
            }
        }
        if let Some(ndk) = ndk_path {
            let candidate = ndk_readelf_path(ndk);
            if candidate.is_file() {
                return Ok(Self::new(candidate));
            }
        }
        find_in_path("llvm-readelf")
            .or_else(|| find_in_path("readelf"))
            .map(Self::new)
            .ok_or_else(|| {
                CacheError::Tool(
                    "Could not find llvm-readelf. Install it, set READELF, or pass --ndk-path"
                        .to_string(),
                )
            })
    }

    pub fn readelf_path(&self) -> &Path {
        &self.readelf
    }

    fn run(&self, flag: &str, path: &Path) -> Option<String> {
        let output = run_tool(&self.readelf, [OsStr::new(flag), path.as_os_str()]).ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl ElfInspector for ReadElfInspector {
    fn build_id(&self, path: &Path) -> String {
        if !is_elf_file(path) {
            return String::new();
        }
        self.run("-n", path).map(|out| parse_build_id(&out)).unwrap_or_default()
    }

    fn sections(&self, path: &Path) -> BTreeSet<String> {
        if !is_elf_file(path) {
            return BTreeSet::new();
        }
        self.run("-SW", path).map(|out| parse_section_names(&out)).unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "readelf"
    }
}

/// Location of `llvm-readelf` inside an NDK-style toolchain tree.
pub fn ndk_readelf_path(ndk: &Path) -> PathBuf {
    let exe = if cfg!(windows) { "llvm-readelf.exe" } else { "llvm-readelf" };
    ndk.join("toolchains").join("llvm").join("prebuilt").join(host_tag()).join("bin").join(exe)
}

fn host_tag() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin-x86_64"
    } else if cfg!(windows) {
        "windows-x86_64"
    } else {
        "linux-x86_64"
    }
}

/// Extract the build-id from `readelf -n` output.
pub fn parse_build_id(output: &str) -> String {
    output
        .lines()
        .find_map(|line| {
            let (_, rest) = line.split_once("Build ID:")?;
            rest.split_whitespace().next().map(normalize_build_id)
        })
        .unwrap_or_default()
}

/// Extract section names from `readelf -SW` output.
///
/// Section lines look like `  [ 1] .interp  PROGBITS ...`; the null section
/// has no name and is skipped.
pub fn parse_section_names(output: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for line in output.lines() {
        let trimmed = line.trim_start();
        let Some(inner) = trimmed.strip_prefix('[') else {
            continue;
        };
        let Some((index, rest)) = inner.split_once(']') else {
            continue;
        };
        if index.trim().parse::<u32>().is_err() {
            continue;
        }
        // One separator space, then the name; a second space means no name.
        let mut chars = rest.chars();
        if !chars.next().is_some_and(char::is_whitespace) {
            continue;
        }
        let after = chars.as_str();
        if after.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some(name) = after.split_whitespace().next() {
            names.insert(name.to_string());
        }
    }
    names
}
