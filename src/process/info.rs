//! Owned summaries of toolhelp entries

use crate::core::types::ProcessId;
use crate::windows::types::{ModuleEntry32, ModuleHandle, ProcessEntry32};
use serde::Serialize;
use std::fmt;

/// Information about a running process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: ProcessId,
    /// Executable file name, without directory
    pub name: String,
    /// Parent process ID; the parent may have exited and its ID been reused
    pub parent_pid: ProcessId,
    /// Number of threads
    pub thread_count: u32,
    /// Base priority of threads the process creates
    pub priority_base: i32,
}

impl ProcessInfo {
    /// Create a new ProcessInfo with minimal information
    pub fn new(pid: ProcessId, name: String) -> Self {
        ProcessInfo {
            pid,
            name,
            parent_pid: 0,
            thread_count: 0,
            priority_base: 0,
        }
    }

    /// Case-insensitive comparison against the executable name
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl From<&ProcessEntry32> for ProcessInfo {
    fn from(entry: &ProcessEntry32) -> Self {
        ProcessInfo {
            pid: entry.process_id,
            name: entry.exe_file(),
            parent_pid: entry.parent_process_id,
            thread_count: entry.thread_count,
            priority_base: entry.priority_class_base,
        }
    }
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

/// Information about a module loaded in a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub path: String,
    pub base_address: usize,
    pub size: u32,
    pub process_id: ProcessId,
    /// Valid only inside the owning process
    pub handle: ModuleHandle,
}

impl ModuleInfo {
    /// Case-insensitive comparison against the module name
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Whether `address` falls inside the module image
    pub fn contains_address(&self, address: usize) -> bool {
        address >= self.base_address && address - self.base_address < self.size as usize
    }

    pub fn end_address(&self) -> usize {
        self.base_address + self.size as usize
    }
}

impl From<&ModuleEntry32> for ModuleInfo {
    fn from(entry: &ModuleEntry32) -> Self {
        ModuleInfo {
            name: entry.module_name(),
            path: entry.exe_path(),
            base_address: entry.base_address,
            size: entry.base_size,
            process_id: entry.process_id,
            handle: entry.module,
        }
    }
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ 0x{:X} (size: 0x{:X})",
            self.name, self.base_address, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_process_info_from_entry() {
        let mut entry = ProcessEntry32::new();
        entry.process_id = 1234;
        entry.parent_process_id = 1000;
        entry.thread_count = 7;
        entry.priority_class_base = 8;
        entry.set_exe_file("notepad.exe");

        let info = ProcessInfo::from(&entry);
        assert_eq!(
            info,
            ProcessInfo {
                pid: 1234,
                name: "notepad.exe".to_string(),
                parent_pid: 1000,
                thread_count: 7,
                priority_base: 8,
            }
        );
        assert_eq!(info.to_string(), "notepad.exe (PID: 1234)");
    }

    #[test]
    fn test_process_name_matches() {
        let info = ProcessInfo::new(1, "Explorer.EXE".to_string());
        assert!(info.name_matches("explorer.exe"));
        assert!(!info.name_matches("explorer"));
    }

    #[test]
    fn test_module_info_from_entry() {
        let mut entry = ModuleEntry32::new();
        entry.process_id = 42;
        entry.base_address = 0x7700_0000;
        entry.base_size = 0x1000;
        entry.module = ModuleHandle::from_raw(0x7700_0000);
        entry.set_module_name("KERNEL32.DLL");
        entry.set_exe_path("C:\\Windows\\System32\\KERNEL32.DLL");

        let module = ModuleInfo::from(&entry);
        assert!(module.name_matches("kernel32.dll"));
        assert!(module.contains_address(0x7700_0FFF));
        assert!(!module.contains_address(0x7700_1000));
        assert!(!module.contains_address(0x76FF_FFFF));
        assert_eq!(module.end_address(), 0x7700_1000);
        assert_eq!(module.to_string(), "KERNEL32.DLL @ 0x77000000 (size: 0x1000)");
    }

    #[test]
    fn test_info_serializes() {
        let info = ProcessInfo::new(4, "System".to_string());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["pid"], 4);
        assert_eq!(json["name"], "System");
    }
}
