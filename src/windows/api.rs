//! The raw kernel32 call boundary
//!
//! [`Kernel32Api`] has one method per bound entry point, at ABI level:
//! `BOOL` is `i32`, handles are `usize`, records are passed by reference.
//! [`Kernel32`](crate::windows::Kernel32) does all marshaling and failure
//! translation on top of it, so any implementation (the real table in
//! [`SystemApi`](crate::windows::bindings::SystemApi) or the in-memory
//! [`FakeKernel32`](crate::windows::fake::FakeKernel32)) gets the same
//! typed surface.

use crate::windows::types::{
    ConsoleScreenBufferInfo, FileTime, ModuleEntry32, ProcessEntry32, SystemTime,
};
use crate::windows::utils::WideString;
use std::ffi::c_void;
use std::fmt;

/// Console control handler, `PHANDLER_ROUTINE`.
///
/// The OS calls it on a thread of its own, concurrently with the rest of the
/// process, so it must only touch state that is safe to share. Returning
/// non-zero marks the event as handled.
pub type HandlerRoutine = unsafe extern "system" fn(ctrl_type: u32) -> i32;

/// `TRUE`
pub const TRUE: i32 = 1;
/// `FALSE`
pub const FALSE: i32 = 0;

/// Resource name or type: an integer id (`MAKEINTRESOURCE`) or a string
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ResourceName {
    Id(u16),
    Name(WideString),
}

impl ResourceName {
    pub const RT_ICON: ResourceName = ResourceName::Id(3);
    pub const RT_STRING: ResourceName = ResourceName::Id(6);
    pub const RT_RCDATA: ResourceName = ResourceName::Id(10);
    pub const RT_VERSION: ResourceName = ResourceName::Id(16);
    pub const RT_MANIFEST: ResourceName = ResourceName::Id(24);

    pub fn name(name: &str) -> Self {
        ResourceName::Name(WideString::new(name))
    }

    /// The `LPCWSTR` value handed to `FindResourceW`
    pub fn as_ptr(&self) -> *const u16 {
        match self {
            ResourceName::Id(id) => *id as usize as *const u16,
            ResourceName::Name(name) => name.as_ptr(),
        }
    }
}

impl From<u16> for ResourceName {
    fn from(id: u16) -> Self {
        ResourceName::Id(id)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        ResourceName::name(name)
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceName::Id(id) => write!(f, "#{}", id),
            ResourceName::Name(name) => write!(f, "{:?}", name),
        }
    }
}

/// One method per kernel32 export, with the export's own signature
pub trait Kernel32Api: Send + Sync {
    /// `GetModuleHandleW`; `None` passes a null name
    fn get_module_handle_w(&self, module_name: Option<&[u16]>) -> usize;

    fn mul_div(&self, number: i32, numerator: i32, denominator: i32) -> i32;

    fn get_console_window(&self) -> usize;

    fn get_current_thread(&self) -> usize;

    fn get_logical_drives(&self) -> u32;

    fn get_user_default_lcid(&self) -> u32;

    /// # Safety
    /// `string` must be null or point to a null-terminated UTF-16 string
    unsafe fn lstrlen_w(&self, string: *const u16) -> i32;

    /// # Safety
    /// `src` must be null-terminated and `dest` must have room for it, terminator included
    unsafe fn lstrcpy_w(&self, dest: *mut u16, src: *const u16) -> *mut u16;

    fn global_alloc(&self, flags: u32, bytes: usize) -> usize;

    /// Returns zero on success, the handle otherwise
    fn global_free(&self, mem: usize) -> usize;

    fn global_lock(&self, mem: usize) -> *mut c_void;

    fn global_unlock(&self, mem: usize) -> i32;

    /// # Safety
    /// Both ranges must be valid for `length` bytes
    unsafe fn rtl_move_memory(&self, dest: *mut c_void, src: *const c_void, length: usize);

    fn find_resource_w(&self, module: usize, name: &ResourceName, kind: &ResourceName) -> usize;

    fn sizeof_resource(&self, module: usize, res_info: usize) -> u32;

    fn load_resource(&self, module: usize, res_info: usize) -> usize;

    fn lock_resource(&self, res_data: usize) -> *mut c_void;

    fn get_last_error(&self) -> u32;

    fn open_process(&self, desired_access: u32, inherit_handle: i32, process_id: u32) -> usize;

    fn terminate_process(&self, process: usize, exit_code: u32) -> i32;

    fn close_handle(&self, object: usize) -> i32;

    fn create_toolhelp32_snapshot(&self, flags: u32, process_id: u32) -> usize;

    fn module32_first_w(&self, snapshot: usize, entry: &mut ModuleEntry32) -> i32;

    fn module32_next_w(&self, snapshot: usize, entry: &mut ModuleEntry32) -> i32;

    fn process32_first_w(&self, snapshot: usize, entry: &mut ProcessEntry32) -> i32;

    fn process32_next_w(&self, snapshot: usize, entry: &mut ProcessEntry32) -> i32;

    fn get_system_times(
        &self,
        idle_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> i32;

    fn get_process_times(
        &self,
        process: usize,
        creation_time: &mut FileTime,
        exit_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> i32;

    fn get_console_screen_buffer_info(
        &self,
        console_output: usize,
        info: &mut ConsoleScreenBufferInfo,
    ) -> i32;

    fn set_console_text_attribute(&self, console_output: usize, attributes: u16) -> i32;

    /// `directory` includes its terminator
    fn get_disk_free_space_ex_w(
        &self,
        directory: &[u16],
        free_bytes_available: &mut u64,
        total_bytes: &mut u64,
        total_free_bytes: &mut u64,
    ) -> i32;

    fn get_system_time(&self, time: &mut SystemTime);

    fn set_system_time(&self, time: &SystemTime) -> i32;

    fn read_process_memory(
        &self,
        process: usize,
        base_address: usize,
        buffer: &mut [u8],
        bytes_read: &mut usize,
    ) -> i32;

    fn write_process_memory(
        &self,
        process: usize,
        base_address: usize,
        data: &[u8],
        bytes_written: &mut usize,
    ) -> i32;

    fn set_console_ctrl_handler(&self, routine: Option<HandlerRoutine>, add: i32) -> i32;

    fn get_current_process(&self) -> usize;
}
