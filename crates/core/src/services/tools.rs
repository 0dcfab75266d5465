use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use crate::error::{CacheError, CacheResult};

/// Search `PATH` for an executable, trying the `.exe` suffix on Windows.
pub fn find_in_path(executable: &str) -> Option<PathBuf> {
    let name =
        if cfg!(windows) { format!("{executable}.exe") } else { executable.to_string() };
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths).find_map(|p| {
            let candidate = p.join(&name);
            if candidate.is_file() {
                Some(candidate)
            } else {
                None
            }
        })
    })
}

/// Spawn `tool` with `args` and capture its output.
///
/// Only a spawn failure is an error; a non-zero exit is left to the caller.
pub fn run_tool<I, S>(tool: &Path, args: I) -> CacheResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    debug!(
        "run {} {}",
        tool.display(),
        args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>().join(" ")
    );
    Command::new(tool)
        .args(&args)
        .output()
        .map_err(|e| CacheError::Tool(format!("failed to spawn {}: {e}", tool.display())))
}
