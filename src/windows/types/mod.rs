//! Windows-specific type definitions and wrappers

pub mod flags;
pub mod handle;
pub mod records;

// Re-export commonly used types
pub use flags::{
    drive_letters, CtrlEvent, GlobalAllocFlags, ProcessAccess, SnapshotFlags, TextAttribute,
};
pub use handle::{
    ConsoleHandle, GlobalHandle, KernelObject, ModuleHandle, ProcessHandle, ResourceDataHandle,
    ResourceInfoHandle, SnapshotHandle, ThreadHandle, WindowHandle, INVALID_HANDLE_VALUE,
};
pub use records::{
    ConsoleScreenBufferInfo, Coord, DiskSpace, FileTime, ModuleEntry32, ProcessEntry32,
    ProcessTimes, SmallRect, SystemTime, SystemTimes, MAX_PATH, MODULE_NAME_LEN,
};
