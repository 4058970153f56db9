//! Fixed-layout records shared with kernel32
//!
//! Field order, sizes and padding follow the Win32 ABI exactly. Pointer
//! fields are carried as `usize` (or a handle newtype), which has the same
//! size and alignment and keeps the records `Send`.

use super::handle::ModuleHandle;
use crate::windows::utils::string_conv::{copy_to_wide_buf, wide_to_string};
use serde::{Deserialize, Serialize};
use std::mem;
use std::time::Duration;

/// `MAX_MODULE_NAME32 + 1`
pub const MODULE_NAME_LEN: usize = 256;
/// `MAX_PATH`
pub const MAX_PATH: usize = 260;

/// `FILETIME`: a 64-bit count of 100-nanosecond intervals split in two halves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct FileTime {
    pub low_date_time: u32,
    pub high_date_time: u32,
}

impl FileTime {
    pub const fn from_u64(ticks: u64) -> Self {
        FileTime {
            low_date_time: ticks as u32,
            high_date_time: (ticks >> 32) as u32,
        }
    }

    /// Combined 100 ns tick count
    pub const fn as_u64(&self) -> u64 {
        ((self.high_date_time as u64) << 32) | self.low_date_time as u64
    }

    /// The tick count as a duration; meaningful for CPU-time values
    pub fn as_duration(&self) -> Duration {
        let ticks = self.as_u64();
        Duration::new(ticks / 10_000_000, ((ticks % 10_000_000) * 100) as u32)
    }
}

/// `SYSTEMTIME`, in UTC when used with `GetSystemTime` / `SetSystemTime`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct SystemTime {
    pub year: u16,
    pub month: u16,
    pub day_of_week: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub milliseconds: u16,
}

impl SystemTime {
    /// Field ranges accepted by `SetSystemTime` (`day_of_week` is ignored by the OS)
    pub fn is_valid(&self) -> bool {
        (1601..=30827).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
            && self.milliseconds < 1000
    }
}

/// `COORD`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

/// `SMALL_RECT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct SmallRect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

impl SmallRect {
    pub fn width(&self) -> i16 {
        self.right.saturating_sub(self.left).saturating_add(1)
    }

    pub fn height(&self) -> i16 {
        self.bottom.saturating_sub(self.top).saturating_add(1)
    }
}

/// `CONSOLE_SCREEN_BUFFER_INFO`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct ConsoleScreenBufferInfo {
    pub size: Coord,
    pub cursor_position: Coord,
    pub attributes: u16,
    pub window: SmallRect,
    pub maximum_window_size: Coord,
}

/// `MODULEENTRY32W`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ModuleEntry32 {
    pub size: u32,
    pub module_id: u32,
    pub process_id: u32,
    pub global_usage: u32,
    pub process_usage: u32,
    pub base_address: usize,
    pub base_size: u32,
    pub module: ModuleHandle,
    pub module_name: [u16; MODULE_NAME_LEN],
    pub exe_path: [u16; MAX_PATH],
}

impl ModuleEntry32 {
    /// `size_of::<MODULEENTRY32W>()`, the value the OS expects in `size`
    pub const SIZE: u32 = mem::size_of::<ModuleEntry32>() as u32;

    /// All-zero record, including `size`
    pub const fn zeroed() -> Self {
        ModuleEntry32 {
            size: 0,
            module_id: 0,
            process_id: 0,
            global_usage: 0,
            process_usage: 0,
            base_address: 0,
            base_size: 0,
            module: ModuleHandle::NULL,
            module_name: [0; MODULE_NAME_LEN],
            exe_path: [0; MAX_PATH],
        }
    }

    /// Zeroed record with `size` preset, ready for `Module32FirstW`
    pub const fn new() -> Self {
        let mut entry = Self::zeroed();
        entry.size = Self::SIZE;
        entry
    }

    pub fn module_name(&self) -> String {
        wide_to_string(&self.module_name)
    }

    pub fn exe_path(&self) -> String {
        wide_to_string(&self.exe_path)
    }

    pub fn set_module_name(&mut self, name: &str) {
        copy_to_wide_buf(name, &mut self.module_name);
    }

    pub fn set_exe_path(&mut self, path: &str) {
        copy_to_wide_buf(path, &mut self.exe_path);
    }
}

impl Default for ModuleEntry32 {
    fn default() -> Self {
        Self::new()
    }
}

/// `PROCESSENTRY32W`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ProcessEntry32 {
    pub size: u32,
    pub usage: u32,
    pub process_id: u32,
    pub default_heap_id: usize,
    pub module_id: u32,
    pub thread_count: u32,
    pub parent_process_id: u32,
    pub priority_class_base: i32,
    pub flags: u32,
    pub exe_file: [u16; MAX_PATH],
}

impl ProcessEntry32 {
    /// `size_of::<PROCESSENTRY32W>()`, the value the OS expects in `size`
    pub const SIZE: u32 = mem::size_of::<ProcessEntry32>() as u32;

    /// All-zero record, including `size`
    pub const fn zeroed() -> Self {
        ProcessEntry32 {
            size: 0,
            usage: 0,
            process_id: 0,
            default_heap_id: 0,
            module_id: 0,
            thread_count: 0,
            parent_process_id: 0,
            priority_class_base: 0,
            flags: 0,
            exe_file: [0; MAX_PATH],
        }
    }

    /// Zeroed record with `size` preset, ready for `Process32FirstW`
    pub const fn new() -> Self {
        let mut entry = Self::zeroed();
        entry.size = Self::SIZE;
        entry
    }

    pub fn exe_file(&self) -> String {
        wide_to_string(&self.exe_file)
    }

    pub fn set_exe_file(&mut self, name: &str) {
        copy_to_wide_buf(name, &mut self.exe_file);
    }
}

impl Default for ProcessEntry32 {
    fn default() -> Self {
        Self::new()
    }
}

/// The three counts reported by `GetDiskFreeSpaceExW`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiskSpace {
    /// Free bytes available to the calling user (quota-aware)
    pub free_bytes_available: u64,
    pub total_bytes: u64,
    pub total_free_bytes: u64,
}

/// CPU times of the whole system from `GetSystemTimes`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemTimes {
    pub idle: FileTime,
    /// Includes idle time
    pub kernel: FileTime,
    pub user: FileTime,
}

/// Timing information of one process from `GetProcessTimes`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTimes {
    pub creation: FileTime,
    /// Undefined while the process is still running
    pub exit: FileTime,
    pub kernel: FileTime,
    pub user: FileTime,
}
