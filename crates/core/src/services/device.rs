use std::path::Path;

/// Operations the device source needs from a connected device.
///
/// Every call reports plain success; failures are expected and handled by
/// the caller's fallbacks.
pub trait DeviceBridge {
    fn is_device_available(&self) -> bool;

    /// Try to get a root shell on the device.
    fn switch_to_root(&self) -> bool;

    /// Run a remote shell command. Arguments are joined by the remote shell,
    /// so redirections like `>/proc/...` work.
    fn shell(&self, args: &[&str]) -> bool;

    fn pull(&self, device_path: &str, host_path: &Path) -> bool;
}
