#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use bincache_core::services::device::DeviceBridge;
use bincache_core::services::elf::ElfInspector;
use bincache_core::services::trace::{SampleSymbol, TraceReader};
use bincache_core::CacheResult;

/// Write a stand-in binary whose identity the fake inspector reads back.
pub fn write_fake_elf(path: &Path, build_id: &str, sections: &[&str]) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(path, fake_elf_bytes(build_id, sections)).unwrap();
}

pub fn fake_elf_bytes(build_id: &str, sections: &[&str]) -> Vec<u8> {
    format!("build_id={}\nsections={}\n", build_id, sections.join(",")).into_bytes()
}

/// Inspector that reads `build_id=` / `sections=` lines from the file itself,
/// so copies keep their identity. Records every build-id lookup.
#[derive(Default)]
pub struct FakeInspector {
    pub build_id_calls: RefCell<Vec<PathBuf>>,
}

impl FakeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_id_calls_for(&self, file_name: &str) -> usize {
        self.build_id_calls
            .borrow()
            .iter()
            .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(file_name))
            .count()
    }

    fn field(path: &Path, key: &str) -> Option<String> {
        let body = fs::read_to_string(path).ok()?;
        body.lines().find_map(|l| l.strip_prefix(key).map(str::to_string))
    }
}

impl ElfInspector for FakeInspector {
    fn build_id(&self, path: &Path) -> String {
        self.build_id_calls.borrow_mut().push(path.to_path_buf());
        Self::field(path, "build_id=").unwrap_or_default()
    }

    fn sections(&self, path: &Path) -> BTreeSet<String> {
        Self::field(path, "sections=")
            .map(|s| s.split(',').filter(|n| !n.is_empty()).map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// In-memory device. Paths in `protected` cannot be pulled directly but can
/// be copied to the scratch dir with the shell.
#[derive(Default)]
pub struct FakeDevice {
    pub available: bool,
    pub root: bool,
    pub files: HashMap<String, Vec<u8>>,
    pub protected: HashSet<String>,
    pub scratch: RefCell<HashMap<String, Vec<u8>>>,
    pub pulls: RefCell<Vec<String>>,
    pub shell_cmds: RefCell<Vec<String>>,
    pub availability_checks: Cell<usize>,
}

impl FakeDevice {
    pub fn available() -> Self {
        Self { available: true, ..Self::default() }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub fn with_protected_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.protected.insert(path.to_string());
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub fn with_root(mut self) -> Self {
        self.root = true;
        self
    }

    pub fn pulls(&self) -> Vec<String> {
        self.pulls.borrow().clone()
    }

    pub fn shell_cmds(&self) -> Vec<String> {
        self.shell_cmds.borrow().clone()
    }

    pub fn touched_device(&self) -> bool {
        self.availability_checks.get() > 0
            || !self.pulls.borrow().is_empty()
            || !self.shell_cmds.borrow().is_empty()
    }
}

impl DeviceBridge for FakeDevice {
    fn is_device_available(&self) -> bool {
        self.availability_checks.set(self.availability_checks.get() + 1);
        self.available
    }

    fn switch_to_root(&self) -> bool {
        self.root
    }

    fn shell(&self, args: &[&str]) -> bool {
        self.shell_cmds.borrow_mut().push(args.join(" "));
        match args {
            ["cp", src, dir] => match self.files.get(*src) {
                Some(bytes) => {
                    let name = src.rsplit('/').next().unwrap();
                    self.scratch.borrow_mut().insert(format!("{dir}/{name}"), bytes.clone());
                    true
                }
                None => false,
            },
            ["rm", path] => self.scratch.borrow_mut().remove(*path).is_some(),
            ["echo", ..] => self.root,
            _ => false,
        }
    }

    fn pull(&self, device_path: &str, host_path: &Path) -> bool {
        self.pulls.borrow_mut().push(device_path.to_string());
        let bytes = if device_path == "/proc/kallsyms" && self.root {
            Some(b"ffffffc000080000 T _text\n".to_vec())
        } else if let Some(bytes) = self.scratch.borrow().get(device_path) {
            Some(bytes.clone())
        } else if self.protected.contains(device_path) {
            None
        } else {
            self.files.get(device_path).cloned()
        };
        match bytes {
            Some(bytes) => fs::write(host_path, bytes).is_ok(),
            None => false,
        }
    }
}

/// Trace reader over a fixed list of samples.
#[derive(Default)]
pub struct FakeTrace {
    samples: Vec<(SampleSymbol, Vec<SampleSymbol>)>,
    build_ids: HashMap<String, String>,
    cursor: usize,
    current: Option<usize>,
    pub record_files: Vec<PathBuf>,
    pub build_id_queries: RefCell<Vec<String>>,
}

impl FakeTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(mut self, dso: &str, callchain: &[&str]) -> Self {
        self.samples.push((
            SampleSymbol::new(dso),
            callchain.iter().map(|d| SampleSymbol::new(*d)).collect(),
        ));
        self
    }

    pub fn build_id(mut self, dso: &str, build_id: &str) -> Self {
        self.build_ids.insert(dso.to_string(), build_id.to_string());
        self
    }
}

impl TraceReader for FakeTrace {
    fn set_record_file(&mut self, path: &Path) -> CacheResult<()> {
        self.record_files.push(path.to_path_buf());
        Ok(())
    }

    fn next_sample(&mut self) -> CacheResult<bool> {
        if self.cursor < self.samples.len() {
            self.current = Some(self.cursor);
            self.cursor += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn symbol_of_current_sample(&self) -> Option<&SampleSymbol> {
        self.current.map(|i| &self.samples[i].0)
    }

    fn callchain_of_current_sample(&self) -> &[SampleSymbol] {
        match self.current {
            Some(i) => &self.samples[i].1,
            None => &[],
        }
    }

    fn build_id_for_path(&self, dso_name: &str) -> String {
        self.build_id_queries.borrow_mut().push(dso_name.to_string());
        self.build_ids.get(dso_name).cloned().unwrap_or_default()
    }
}

/// Write an executable `/bin/sh` script standing in for an external tool.
/// Every invocation appends its arguments to `<dir>/<name>.log`.
#[cfg(unix)]
pub fn write_fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let log = dir.join(format!("{name}.log"));
    let script = format!("#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\n{}\n", log.display(), body);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Argument lines recorded by a tool written with [`write_fake_tool`].
#[cfg(unix)]
pub fn fake_tool_calls(dir: &Path, name: &str) -> Vec<String> {
    fs::read_to_string(dir.join(format!("{name}.log")))
        .map(|body| body.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
