use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::services::device::DeviceBridge;
use crate::services::tools::{find_in_path, run_tool};

/// Device bridge that shells out to `adb`.
///
/// A missing adb binary behaves like a disconnected device.
pub struct AdbBridge {
    adb: Option<PathBuf>,
    enable_switch_to_root: bool,
}

impl AdbBridge {
    pub fn new(adb: Option<PathBuf>, enable_switch_to_root: bool) -> Self {
        Self { adb, enable_switch_to_root }
    }

    /// Use `explicit` if given, otherwise look for `adb` on `PATH`.
    pub fn locate(explicit: Option<&Path>, enable_switch_to_root: bool) -> Self {
        let adb = explicit.map(Path::to_path_buf).or_else(|| find_in_path("adb"));
        if adb.is_none() {
            debug!("adb not found; device collection disabled");
        }
        Self::new(adb, enable_switch_to_root)
    }

    pub fn adb_path(&self) -> Option<&Path> {
        self.adb.as_deref()
    }

    fn run(&self, args: &[&str]) -> bool {
        self.run_with_output(args).is_some()
    }

    fn run_with_output(&self, args: &[&str]) -> Option<String> {
        let adb = self.adb.as_deref()?;
        let output = run_tool(adb, args).ok()?;
        if !output.status.success() {
            debug!("adb {} exited with {}", args.join(" "), output.status);
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn is_root(&self) -> bool {
        self.run_with_output(&["shell", "whoami"]).is_some_and(|out| out.contains("root"))
    }

    fn build_type(&self) -> Option<String> {
        self.run_with_output(&["shell", "getprop", "ro.build.type"])
            .map(|out| out.trim().to_string())
    }
}

impl DeviceBridge for AdbBridge {
    fn is_device_available(&self) -> bool {
        self.run(&["shell", "whoami"])
    }

    fn switch_to_root(&self) -> bool {
        if !self.enable_switch_to_root {
            return false;
        }
        if self.is_root() {
            return true;
        }
        // `adb root` is refused on user builds.
        if self.build_type().as_deref() == Some("user") {
            return false;
        }
        info!("switching adb to root");
        self.run(&["root"]);
        self.run(&["wait-for-device"]);
        thread::sleep(Duration::from_secs(1));
        self.is_root()
    }

    fn shell(&self, args: &[&str]) -> bool {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);
        self.run(&full)
    }

    fn pull(&self, device_path: &str, host_path: &Path) -> bool {
        let host = host_path.to_string_lossy().to_string();
        self.run(&["pull", device_path, host.as_str()])
    }
}
