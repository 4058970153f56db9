//! The real kernel32 call table
//!
//! Every entry point is resolved once, when the library is loaded, into a
//! typed function pointer. A missing export fails the load instead of
//! surfacing later at call time.

use super::kernel32::Kernel32;
use crate::config::LibraryConfig;
use crate::core::types::{ApiError, ApiResult, Operation};
use crate::windows::api::{HandlerRoutine, Kernel32Api, ResourceName};
use crate::windows::types::{
    ConsoleScreenBufferInfo, FileTime, ModuleEntry32, ProcessEntry32, SystemTime,
};
use crate::windows::utils::WideString;
use lazy_static::lazy_static;
use std::ffi::c_void;
use std::mem;
use std::ptr;
use tracing::{debug, info};
use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use winapi::shared::basetsd::SIZE_T;
use winapi::shared::minwindef::{
    BOOL, DWORD, HGLOBAL, HMODULE as RawModule, HRSRC, LPCVOID, LPVOID, UINT, WORD,
};
use winapi::shared::windef::HWND;
use winapi::um::winnt::{HANDLE, LCID, LPCWSTR, LPWSTR};

/// Library loaded when no configuration says otherwise
pub const DEFAULT_LIBRARY: &str = "kernel32.dll";

type RawProc = unsafe extern "system" fn() -> isize;

struct ProcTable {
    get_module_handle_w: unsafe extern "system" fn(LPCWSTR) -> RawModule,
    mul_div: unsafe extern "system" fn(i32, i32, i32) -> i32,
    get_console_window: unsafe extern "system" fn() -> HWND,
    get_current_thread: unsafe extern "system" fn() -> HANDLE,
    get_logical_drives: unsafe extern "system" fn() -> DWORD,
    get_user_default_lcid: unsafe extern "system" fn() -> LCID,
    lstrlen_w: unsafe extern "system" fn(LPCWSTR) -> i32,
    lstrcpy_w: unsafe extern "system" fn(LPWSTR, LPCWSTR) -> LPWSTR,
    global_alloc: unsafe extern "system" fn(UINT, SIZE_T) -> HGLOBAL,
    global_free: unsafe extern "system" fn(HGLOBAL) -> HGLOBAL,
    global_lock: unsafe extern "system" fn(HGLOBAL) -> LPVOID,
    global_unlock: unsafe extern "system" fn(HGLOBAL) -> BOOL,
    rtl_move_memory: unsafe extern "system" fn(*mut c_void, *const c_void, SIZE_T),
    find_resource_w: unsafe extern "system" fn(RawModule, LPCWSTR, LPCWSTR) -> HRSRC,
    sizeof_resource: unsafe extern "system" fn(RawModule, HRSRC) -> DWORD,
    load_resource: unsafe extern "system" fn(RawModule, HRSRC) -> HGLOBAL,
    lock_resource: unsafe extern "system" fn(HGLOBAL) -> LPVOID,
    get_last_error: unsafe extern "system" fn() -> DWORD,
    open_process: unsafe extern "system" fn(DWORD, BOOL, DWORD) -> HANDLE,
    terminate_process: unsafe extern "system" fn(HANDLE, UINT) -> BOOL,
    close_handle: unsafe extern "system" fn(HANDLE) -> BOOL,
    create_toolhelp32_snapshot: unsafe extern "system" fn(DWORD, DWORD) -> HANDLE,
    module32_first_w: unsafe extern "system" fn(HANDLE, *mut ModuleEntry32) -> BOOL,
    module32_next_w: unsafe extern "system" fn(HANDLE, *mut ModuleEntry32) -> BOOL,
    process32_first_w: unsafe extern "system" fn(HANDLE, *mut ProcessEntry32) -> BOOL,
    process32_next_w: unsafe extern "system" fn(HANDLE, *mut ProcessEntry32) -> BOOL,
    get_system_times:
        unsafe extern "system" fn(*mut FileTime, *mut FileTime, *mut FileTime) -> BOOL,
    get_process_times: unsafe extern "system" fn(
        HANDLE,
        *mut FileTime,
        *mut FileTime,
        *mut FileTime,
        *mut FileTime,
    ) -> BOOL,
    get_console_screen_buffer_info:
        unsafe extern "system" fn(HANDLE, *mut ConsoleScreenBufferInfo) -> BOOL,
    set_console_text_attribute: unsafe extern "system" fn(HANDLE, WORD) -> BOOL,
    get_disk_free_space_ex_w:
        unsafe extern "system" fn(LPCWSTR, *mut u64, *mut u64, *mut u64) -> BOOL,
    get_system_time: unsafe extern "system" fn(*mut SystemTime),
    set_system_time: unsafe extern "system" fn(*const SystemTime) -> BOOL,
    read_process_memory:
        unsafe extern "system" fn(HANDLE, LPCVOID, LPVOID, SIZE_T, *mut SIZE_T) -> BOOL,
    write_process_memory:
        unsafe extern "system" fn(HANDLE, LPVOID, LPCVOID, SIZE_T, *mut SIZE_T) -> BOOL,
    set_console_ctrl_handler: unsafe extern "system" fn(Option<HandlerRoutine>, BOOL) -> BOOL,
    get_current_process: unsafe extern "system" fn() -> HANDLE,
}

/// Look up one export by its name in `kernel32.dll`
unsafe fn lookup(module: HMODULE, op: Operation) -> ApiResult<RawProc> {
    let mut name = op.export_name().as_bytes().to_vec();
    name.push(0);
    GetProcAddress(module, PCSTR(name.as_ptr()))
        .ok_or(ApiError::MissingEntryPoint(op.export_name()))
}

macro_rules! resolve {
    ($module:expr, $op:ident) => {
        mem::transmute::<RawProc, _>(lookup($module, Operation::$op)?)
    };
}

impl ProcTable {
    /// # Safety
    /// `module` must be a loaded image whose exports have kernel32's signatures
    unsafe fn resolve(module: HMODULE) -> ApiResult<Self> {
        Ok(ProcTable {
            get_module_handle_w: resolve!(module, GetModuleHandle),
            mul_div: resolve!(module, MulDiv),
            get_console_window: resolve!(module, GetConsoleWindow),
            get_current_thread: resolve!(module, GetCurrentThread),
            get_logical_drives: resolve!(module, GetLogicalDrives),
            get_user_default_lcid: resolve!(module, GetUserDefaultLcid),
            lstrlen_w: resolve!(module, Lstrlen),
            lstrcpy_w: resolve!(module, Lstrcpy),
            global_alloc: resolve!(module, GlobalAlloc),
            global_free: resolve!(module, GlobalFree),
            global_lock: resolve!(module, GlobalLock),
            global_unlock: resolve!(module, GlobalUnlock),
            rtl_move_memory: resolve!(module, MoveMemory),
            find_resource_w: resolve!(module, FindResource),
            sizeof_resource: resolve!(module, SizeofResource),
            load_resource: resolve!(module, LoadResource),
            lock_resource: resolve!(module, LockResource),
            get_last_error: resolve!(module, GetLastError),
            open_process: resolve!(module, OpenProcess),
            terminate_process: resolve!(module, TerminateProcess),
            close_handle: resolve!(module, CloseHandle),
            create_toolhelp32_snapshot: resolve!(module, CreateToolhelp32Snapshot),
            module32_first_w: resolve!(module, Module32First),
            module32_next_w: resolve!(module, Module32Next),
            process32_first_w: resolve!(module, Process32First),
            process32_next_w: resolve!(module, Process32Next),
            get_system_times: resolve!(module, GetSystemTimes),
            get_process_times: resolve!(module, GetProcessTimes),
            get_console_screen_buffer_info: resolve!(module, GetConsoleScreenBufferInfo),
            set_console_text_attribute: resolve!(module, SetConsoleTextAttribute),
            get_disk_free_space_ex_w: resolve!(module, GetDiskFreeSpaceEx),
            get_system_time: resolve!(module, GetSystemTime),
            set_system_time: resolve!(module, SetSystemTime),
            read_process_memory: resolve!(module, ReadProcessMemory),
            write_process_memory: resolve!(module, WriteProcessMemory),
            set_console_ctrl_handler: resolve!(module, SetConsoleCtrlHandler),
            get_current_process: resolve!(module, GetCurrentProcess),
        })
    }
}

/// kernel32 loaded into this process, with every bound export resolved.
///
/// The library stays loaded until the table is dropped.
pub struct SystemApi {
    module: HMODULE,
    table: ProcTable,
}

impl SystemApi {
    /// Load `library` and resolve every bound export from it
    pub fn load(library: &str) -> ApiResult<Self> {
        let path = WideString::new(library);
        let module = unsafe { LoadLibraryW(PCWSTR(path.as_ptr())) }
            .map_err(|err| ApiError::library_load(library, err.message().to_string()))?;

        let table = match unsafe { ProcTable::resolve(module) } {
            Ok(table) => table,
            Err(err) => {
                unsafe {
                    let _ = FreeLibrary(module);
                }
                return Err(err);
            }
        };

        debug!(
            library,
            entry_points = Operation::ALL.len(),
            "Resolved kernel32 entry points"
        );
        Ok(SystemApi { module, table })
    }

    pub fn load_default() -> ApiResult<Self> {
        Self::load(DEFAULT_LIBRARY)
    }

    pub fn from_config(config: &LibraryConfig) -> ApiResult<Self> {
        Self::load(&config.path)
    }
}

impl Drop for SystemApi {
    fn drop(&mut self) {
        unsafe {
            let _ = FreeLibrary(self.module);
        }
    }
}

// SAFETY: the table only holds function pointers into a loaded image, and
// kernel32's exports may be called from any thread.
unsafe impl Send for SystemApi {}
unsafe impl Sync for SystemApi {}

lazy_static! {
    static ref SYSTEM: Result<Kernel32<SystemApi>, ApiError> = {
        let loaded = SystemApi::load_default().map(Kernel32::new);
        if loaded.is_ok() {
            info!("kernel32 bindings ready");
        }
        loaded
    };
}

/// Process-wide bindings over the system `kernel32.dll`, loaded on first use
pub fn system() -> ApiResult<&'static Kernel32<SystemApi>> {
    SYSTEM.as_ref().map_err(Clone::clone)
}

impl Kernel32Api for SystemApi {
    fn get_module_handle_w(&self, module_name: Option<&[u16]>) -> usize {
        let name = module_name.map_or(ptr::null(), |name| name.as_ptr());
        unsafe { (self.table.get_module_handle_w)(name) as usize }
    }

    fn mul_div(&self, number: i32, numerator: i32, denominator: i32) -> i32 {
        unsafe { (self.table.mul_div)(number, numerator, denominator) }
    }

    fn get_console_window(&self) -> usize {
        unsafe { (self.table.get_console_window)() as usize }
    }

    fn get_current_thread(&self) -> usize {
        unsafe { (self.table.get_current_thread)() as usize }
    }

    fn get_logical_drives(&self) -> u32 {
        unsafe { (self.table.get_logical_drives)() }
    }

    fn get_user_default_lcid(&self) -> u32 {
        unsafe { (self.table.get_user_default_lcid)() }
    }

    unsafe fn lstrlen_w(&self, string: *const u16) -> i32 {
        (self.table.lstrlen_w)(string)
    }

    unsafe fn lstrcpy_w(&self, dest: *mut u16, src: *const u16) -> *mut u16 {
        (self.table.lstrcpy_w)(dest, src)
    }

    fn global_alloc(&self, flags: u32, bytes: usize) -> usize {
        unsafe { (self.table.global_alloc)(flags, bytes) as usize }
    }

    fn global_free(&self, mem: usize) -> usize {
        unsafe { (self.table.global_free)(mem as HGLOBAL) as usize }
    }

    fn global_lock(&self, mem: usize) -> *mut c_void {
        unsafe { (self.table.global_lock)(mem as HGLOBAL) as *mut c_void }
    }

    fn global_unlock(&self, mem: usize) -> i32 {
        unsafe { (self.table.global_unlock)(mem as HGLOBAL) }
    }

    unsafe fn rtl_move_memory(&self, dest: *mut c_void, src: *const c_void, length: usize) {
        (self.table.rtl_move_memory)(dest, src, length)
    }

    fn find_resource_w(&self, module: usize, name: &ResourceName, kind: &ResourceName) -> usize {
        unsafe {
            (self.table.find_resource_w)(module as RawModule, name.as_ptr(), kind.as_ptr())
                as usize
        }
    }

    fn sizeof_resource(&self, module: usize, res_info: usize) -> u32 {
        unsafe { (self.table.sizeof_resource)(module as RawModule, res_info as HRSRC) }
    }

    fn load_resource(&self, module: usize, res_info: usize) -> usize {
        unsafe { (self.table.load_resource)(module as RawModule, res_info as HRSRC) as usize }
    }

    fn lock_resource(&self, res_data: usize) -> *mut c_void {
        unsafe { (self.table.lock_resource)(res_data as HGLOBAL) as *mut c_void }
    }

    fn get_last_error(&self) -> u32 {
        unsafe { (self.table.get_last_error)() }
    }

    fn open_process(&self, desired_access: u32, inherit_handle: i32, process_id: u32) -> usize {
        unsafe { (self.table.open_process)(desired_access, inherit_handle, process_id) as usize }
    }

    fn terminate_process(&self, process: usize, exit_code: u32) -> i32 {
        unsafe { (self.table.terminate_process)(process as HANDLE, exit_code) }
    }

    fn close_handle(&self, object: usize) -> i32 {
        unsafe { (self.table.close_handle)(object as HANDLE) }
    }

    fn create_toolhelp32_snapshot(&self, flags: u32, process_id: u32) -> usize {
        unsafe { (self.table.create_toolhelp32_snapshot)(flags, process_id) as usize }
    }

    fn module32_first_w(&self, snapshot: usize, entry: &mut ModuleEntry32) -> i32 {
        unsafe { (self.table.module32_first_w)(snapshot as HANDLE, entry) }
    }

    fn module32_next_w(&self, snapshot: usize, entry: &mut ModuleEntry32) -> i32 {
        unsafe { (self.table.module32_next_w)(snapshot as HANDLE, entry) }
    }

    fn process32_first_w(&self, snapshot: usize, entry: &mut ProcessEntry32) -> i32 {
        unsafe { (self.table.process32_first_w)(snapshot as HANDLE, entry) }
    }

    fn process32_next_w(&self, snapshot: usize, entry: &mut ProcessEntry32) -> i32 {
        unsafe { (self.table.process32_next_w)(snapshot as HANDLE, entry) }
    }

    fn get_system_times(
        &self,
        idle_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> i32 {
        unsafe { (self.table.get_system_times)(idle_time, kernel_time, user_time) }
    }

    fn get_process_times(
        &self,
        process: usize,
        creation_time: &mut FileTime,
        exit_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> i32 {
        unsafe {
            (self.table.get_process_times)(
                process as HANDLE,
                creation_time,
                exit_time,
                kernel_time,
                user_time,
            )
        }
    }

    fn get_console_screen_buffer_info(
        &self,
        console_output: usize,
        info: &mut ConsoleScreenBufferInfo,
    ) -> i32 {
        unsafe { (self.table.get_console_screen_buffer_info)(console_output as HANDLE, info) }
    }

    fn set_console_text_attribute(&self, console_output: usize, attributes: u16) -> i32 {
        unsafe { (self.table.set_console_text_attribute)(console_output as HANDLE, attributes) }
    }

    fn get_disk_free_space_ex_w(
        &self,
        directory: &[u16],
        free_bytes_available: &mut u64,
        total_bytes: &mut u64,
        total_free_bytes: &mut u64,
    ) -> i32 {
        unsafe {
            (self.table.get_disk_free_space_ex_w)(
                directory.as_ptr(),
                free_bytes_available,
                total_bytes,
                total_free_bytes,
            )
        }
    }

    fn get_system_time(&self, time: &mut SystemTime) {
        unsafe { (self.table.get_system_time)(time) }
    }

    fn set_system_time(&self, time: &SystemTime) -> i32 {
        unsafe { (self.table.set_system_time)(time) }
    }

    fn read_process_memory(
        &self,
        process: usize,
        base_address: usize,
        buffer: &mut [u8],
        bytes_read: &mut usize,
    ) -> i32 {
        unsafe {
            (self.table.read_process_memory)(
                process as HANDLE,
                base_address as LPCVOID,
                buffer.as_mut_ptr() as LPVOID,
                buffer.len(),
                bytes_read,
            )
        }
    }

    fn write_process_memory(
        &self,
        process: usize,
        base_address: usize,
        data: &[u8],
        bytes_written: &mut usize,
    ) -> i32 {
        unsafe {
            (self.table.write_process_memory)(
                process as HANDLE,
                base_address as LPVOID,
                data.as_ptr() as LPCVOID,
                data.len(),
                bytes_written,
            )
        }
    }

    fn set_console_ctrl_handler(&self, routine: Option<HandlerRoutine>, add: i32) -> i32 {
        unsafe { (self.table.set_console_ctrl_handler)(routine, add) }
    }

    fn get_current_process(&self) -> usize {
        unsafe { (self.table.get_current_process)() as usize }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_resolves_every_export() {
        let api = SystemApi::load_default().expect("kernel32.dll should load");
        let kernel32 = Kernel32::new(api);
        assert_eq!(kernel32.mul_div(10, 3, 4), 8);
        assert!(kernel32.get_current_process().is_ok());
    }

    #[test]
    fn test_load_missing_library() {
        let err = SystemApi::load("no-such-library-4242.dll")
            .err()
            .expect("load should fail");
        assert!(matches!(err, ApiError::LibraryLoad { .. }));
    }

    #[test]
    fn test_reload_after_drop() {
        let first = SystemApi::load_default().expect("kernel32.dll should load");
        drop(first);
        let second = SystemApi::load_default().expect("kernel32.dll should reload");
        assert_eq!(Kernel32::new(second).mul_div(6, 7, 2), 21);
    }

    #[test]
    fn test_system_singleton() {
        let first = system().expect("system bindings");
        let second = system().expect("system bindings");
        assert!(std::ptr::eq(first, second));
    }
}
