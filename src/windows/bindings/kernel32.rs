//! Typed kernel32 bindings
//!
//! [`Kernel32`] wraps any [`Kernel32Api`] table and turns each raw call into
//! Rust types. Every method is a single call; nothing is retried and no
//! handle is kept or closed on the caller's behalf. How a method reports
//! failure follows the [`FailurePolicy`] of its [`Operation`]:
//!
//! - `Sentinel`: a zero or invalid handle value comes back unchanged.
//! - `Abort`: the call "cannot fail"; a zero result panics (aborts in release).
//! - `Flag`: a `bool` (or `Option`) the caller must check.
//! - `LastError`: a zero result becomes [`ApiError::Os`] with the last-error code.
//! - `SuccessCode`: `Ok` only when the last-error code is exactly `ERROR_SUCCESS`.
//!
//! [`FailurePolicy`]: crate::core::FailurePolicy

use crate::core::types::{ApiError, ApiResult, Lcid, Operation, ProcessId};
use crate::windows::api::{HandlerRoutine, Kernel32Api, ResourceName, FALSE, TRUE};
use crate::windows::types::{
    ConsoleHandle, ConsoleScreenBufferInfo, DiskSpace, FileTime, GlobalAllocFlags, GlobalHandle,
    KernelObject, ModuleEntry32, ModuleHandle, ProcessAccess, ProcessEntry32, ProcessHandle,
    ProcessTimes, ResourceDataHandle, ResourceInfoHandle, SnapshotFlags, SnapshotHandle,
    SystemTime, SystemTimes, TextAttribute, ThreadHandle, WindowHandle,
};
use crate::windows::utils::{WideString, ERROR_SUCCESS};
use std::ffi::c_void;
use std::ptr::NonNull;
use std::slice;
use tracing::{error, trace};

/// Failure of an abort-policy call
#[cold]
#[track_caller]
fn abort(op: Operation) -> ! {
    error!(function = op.export_name(), "kernel32 call failed, aborting");
    panic!("{} failed", op.export_name());
}

/// Typed bindings over a kernel32 call table
pub struct Kernel32<A: Kernel32Api> {
    api: A,
}

impl<A: Kernel32Api> Kernel32<A> {
    pub fn new(api: A) -> Self {
        Kernel32 { api }
    }

    /// The underlying call table
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn into_inner(self) -> A {
        self.api
    }

    /// Read the last-error code right after a failed call, before anything
    /// else can overwrite it.
    fn last_error(&self, op: Operation) -> ApiError {
        ApiError::os(op, self.api.get_last_error())
    }

    fn check_success_code(&self, op: Operation) -> ApiResult<()> {
        let code = self.api.get_last_error();
        if code == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(ApiError::os(op, code))
        }
    }

    /// Handle of a loaded module; an empty name means the current image.
    /// Returns [`ModuleHandle::NULL`] when no loaded module matches.
    pub fn get_module_handle(&self, module_name: &str) -> ModuleHandle {
        let raw = if module_name.is_empty() {
            self.api.get_module_handle_w(None)
        } else {
            let name = WideString::new(module_name);
            self.api.get_module_handle_w(Some(name.as_slice_with_nul()))
        };
        ModuleHandle::from_raw(raw)
    }

    /// `number * numerator / denominator` with a 64-bit intermediate, rounded.
    /// The OS returns -1 on overflow or a zero denominator.
    pub fn mul_div(&self, number: i32, numerator: i32, denominator: i32) -> i32 {
        self.api.mul_div(number, numerator, denominator)
    }

    pub fn get_console_window(&self) -> WindowHandle {
        WindowHandle::from_raw(self.api.get_console_window())
    }

    /// Pseudo-handle for the calling thread; needs no closing
    pub fn get_current_thread(&self) -> ThreadHandle {
        ThreadHandle::from_raw(self.api.get_current_thread())
    }

    /// Bitmask of available drives, bit 0 for `A:`
    pub fn get_logical_drives(&self) -> u32 {
        self.api.get_logical_drives()
    }

    pub fn get_user_default_lcid(&self) -> Lcid {
        self.api.get_user_default_lcid()
    }

    /// Length in UTF-16 units of a null-terminated string
    ///
    /// # Safety
    /// `string` must be null or point to a null-terminated UTF-16 string
    pub unsafe fn lstrlen(&self, string: *const u16) -> i32 {
        self.api.lstrlen_w(string)
    }

    /// Copy a null-terminated string into `buf`
    ///
    /// # Safety
    /// `src` must be null-terminated and `buf` must hold at least its length
    /// plus one unit for the terminator
    pub unsafe fn lstrcpy(&self, buf: &mut [u16], src: *const u16) {
        self.api.lstrcpy_w(buf.as_mut_ptr(), src);
    }

    /// Allocate a global memory block. Aborts if the OS is out of memory.
    pub fn global_alloc(&self, flags: GlobalAllocFlags, bytes: usize) -> GlobalHandle {
        let raw = self.api.global_alloc(flags.value(), bytes);
        if raw == 0 {
            abort(Operation::GlobalAlloc);
        }
        GlobalHandle::from_raw(raw)
    }

    /// Free a global memory block. Aborts if the OS did not release it.
    pub fn global_free(&self, handle: GlobalHandle) {
        if self.api.global_free(handle.as_raw()) != 0 {
            abort(Operation::GlobalFree);
        }
    }

    /// Pointer to the first byte of a global memory block. Aborts on failure.
    pub fn global_lock(&self, handle: GlobalHandle) -> NonNull<c_void> {
        match NonNull::new(self.api.global_lock(handle.as_raw())) {
            Some(ptr) => ptr,
            None => abort(Operation::GlobalLock),
        }
    }

    /// `false` when the block is still locked or the handle is invalid;
    /// that is not necessarily an error.
    pub fn global_unlock(&self, handle: GlobalHandle) -> bool {
        self.api.global_unlock(handle.as_raw()) != FALSE
    }

    /// Copy `length` bytes from `source` to `destination`
    ///
    /// # Safety
    /// Both ranges must be valid for `length` bytes
    pub unsafe fn move_memory(&self, destination: *mut c_void, source: *const c_void, length: usize) {
        self.api.rtl_move_memory(destination, source, length);
    }

    /// Locate a resource in a module image
    pub fn find_resource(
        &self,
        module: ModuleHandle,
        name: &ResourceName,
        kind: &ResourceName,
    ) -> ApiResult<ResourceInfoHandle> {
        let raw = self.api.find_resource_w(module.as_raw(), name, kind);
        if raw == 0 {
            return Err(self.last_error(Operation::FindResource));
        }
        Ok(ResourceInfoHandle::from_raw(raw))
    }

    /// Size in bytes of a resource. Aborts on failure.
    pub fn sizeof_resource(&self, module: ModuleHandle, info: ResourceInfoHandle) -> u32 {
        let size = self.api.sizeof_resource(module.as_raw(), info.as_raw());
        if size == 0 {
            abort(Operation::SizeofResource);
        }
        size
    }

    /// Load a resource's data. Aborts on failure.
    pub fn load_resource(&self, module: ModuleHandle, info: ResourceInfoHandle) -> ResourceDataHandle {
        let raw = self.api.load_resource(module.as_raw(), info.as_raw());
        if raw == 0 {
            abort(Operation::LoadResource);
        }
        ResourceDataHandle::from_raw(raw)
    }

    /// Pointer to loaded resource data. Aborts on failure.
    pub fn lock_resource(&self, data: ResourceDataHandle) -> NonNull<c_void> {
        match NonNull::new(self.api.lock_resource(data.as_raw())) {
            Some(ptr) => ptr,
            None => abort(Operation::LockResource),
        }
    }

    /// Size, load and lock a resource in one step
    ///
    /// # Safety
    /// The returned slice borrows the module image; `module` must stay loaded
    /// for `'a`.
    pub unsafe fn resource_bytes<'a>(
        &self,
        module: ModuleHandle,
        info: ResourceInfoHandle,
    ) -> &'a [u8] {
        let size = self.sizeof_resource(module, info);
        let data = self.load_resource(module, info);
        let ptr = self.lock_resource(data);
        slice::from_raw_parts(ptr.as_ptr() as *const u8, size as usize)
    }

    /// The calling thread's last-error code
    pub fn get_last_error(&self) -> u32 {
        self.api.get_last_error()
    }

    /// Open a process by id. The caller closes the handle.
    pub fn open_process(
        &self,
        access: ProcessAccess,
        inherit_handle: bool,
        process_id: ProcessId,
    ) -> ApiResult<ProcessHandle> {
        let inherit = if inherit_handle { TRUE } else { FALSE };
        let raw = self.api.open_process(access.value(), inherit, process_id);
        if raw == 0 {
            return Err(self.last_error(Operation::OpenProcess));
        }
        Ok(ProcessHandle::from_raw(raw))
    }

    pub fn terminate_process(&self, process: ProcessHandle, exit_code: u32) -> bool {
        self.api.terminate_process(process.as_raw(), exit_code) != FALSE
    }

    pub fn close_handle<H: KernelObject>(&self, object: H) -> bool {
        self.api.close_handle(object.raw_handle()) != FALSE
    }

    /// Snapshot of processes, modules, threads or heaps. Any non-positive
    /// raw result comes back as [`SnapshotHandle::INVALID`].
    pub fn create_toolhelp32_snapshot(
        &self,
        flags: SnapshotFlags,
        process_id: ProcessId,
    ) -> SnapshotHandle {
        let raw = self.api.create_toolhelp32_snapshot(flags.value(), process_id);
        if (raw as isize) <= 0 {
            return SnapshotHandle::INVALID;
        }
        SnapshotHandle::from_raw(raw)
    }

    /// First module of a snapshot. `entry.size` must already be
    /// [`ModuleEntry32::SIZE`].
    pub fn module32_first(&self, snapshot: SnapshotHandle, entry: &mut ModuleEntry32) -> bool {
        self.api.module32_first_w(snapshot.as_raw(), entry) != FALSE
    }

    pub fn module32_next(&self, snapshot: SnapshotHandle, entry: &mut ModuleEntry32) -> bool {
        self.api.module32_next_w(snapshot.as_raw(), entry) != FALSE
    }

    /// First process of a snapshot. `entry.size` must already be
    /// [`ProcessEntry32::SIZE`].
    pub fn process32_first(
        &self,
        snapshot: SnapshotHandle,
        entry: &mut ProcessEntry32,
    ) -> ApiResult<()> {
        if self.api.process32_first_w(snapshot.as_raw(), entry) == FALSE {
            return Err(self.last_error(Operation::Process32First));
        }
        Ok(())
    }

    /// Next process of a snapshot; fails with `ERROR_NO_MORE_FILES` at the end
    pub fn process32_next(
        &self,
        snapshot: SnapshotHandle,
        entry: &mut ProcessEntry32,
    ) -> ApiResult<()> {
        if self.api.process32_next_w(snapshot.as_raw(), entry) == FALSE {
            return Err(self.last_error(Operation::Process32Next));
        }
        Ok(())
    }

    pub fn get_system_times(
        &self,
        idle_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> bool {
        self.api.get_system_times(idle_time, kernel_time, user_time) != FALSE
    }

    /// [`get_system_times`](Self::get_system_times) into a fresh record
    pub fn system_times(&self) -> Option<SystemTimes> {
        let mut times = SystemTimes::default();
        self.get_system_times(&mut times.idle, &mut times.kernel, &mut times.user)
            .then_some(times)
    }

    pub fn get_process_times(
        &self,
        process: ProcessHandle,
        creation_time: &mut FileTime,
        exit_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> bool {
        self.api.get_process_times(
            process.as_raw(),
            creation_time,
            exit_time,
            kernel_time,
            user_time,
        ) != FALSE
    }

    /// [`get_process_times`](Self::get_process_times) into a fresh record
    pub fn process_times(&self, process: ProcessHandle) -> Option<ProcessTimes> {
        let mut times = ProcessTimes::default();
        self.get_process_times(
            process,
            &mut times.creation,
            &mut times.exit,
            &mut times.kernel,
            &mut times.user,
        )
        .then_some(times)
    }

    pub fn get_console_screen_buffer_info(
        &self,
        console: ConsoleHandle,
    ) -> Option<ConsoleScreenBufferInfo> {
        let mut info = ConsoleScreenBufferInfo::default();
        if self.api.get_console_screen_buffer_info(console.as_raw(), &mut info) == FALSE {
            return None;
        }
        Some(info)
    }

    pub fn set_console_text_attribute(&self, console: ConsoleHandle, attribute: TextAttribute) -> bool {
        self.api.set_console_text_attribute(console.as_raw(), attribute.value()) != FALSE
    }

    /// Free and total space of the volume holding `directory`. The counts are
    /// not meaningful when the flag is `false`.
    pub fn get_disk_free_space(&self, directory: &str) -> (bool, DiskSpace) {
        let directory = WideString::new(directory);
        let mut space = DiskSpace::default();
        let ok = self.api.get_disk_free_space_ex_w(
            directory.as_slice_with_nul(),
            &mut space.free_bytes_available,
            &mut space.total_bytes,
            &mut space.total_free_bytes,
        );
        (ok != FALSE, space)
    }

    /// Current UTC time. `Ok` only when the last-error code reads
    /// `ERROR_SUCCESS` afterwards.
    pub fn get_system_time(&self) -> ApiResult<SystemTime> {
        let mut time = SystemTime::default();
        self.api.get_system_time(&mut time);
        self.check_success_code(Operation::GetSystemTime)?;
        Ok(time)
    }

    /// Set the UTC time. `Ok` only when the last-error code reads
    /// `ERROR_SUCCESS` afterwards; the call's own return value is not used.
    pub fn set_system_time(&self, time: &SystemTime) -> ApiResult<()> {
        self.api.set_system_time(time);
        self.check_success_code(Operation::SetSystemTime)
    }

    /// Read `size` bytes at `address` in another process.
    ///
    /// The count of bytes actually transferred is not compared with `size`,
    /// so a partial read is reported as success.
    pub fn read_process_memory(
        &self,
        process: ProcessHandle,
        address: usize,
        size: usize,
    ) -> ApiResult<Vec<u8>> {
        let mut data = vec![0u8; size];
        let mut transferred = 0usize;
        let ok = self
            .api
            .read_process_memory(process.as_raw(), address, &mut data, &mut transferred);
        if ok == FALSE {
            return Err(self.last_error(Operation::ReadProcessMemory));
        }
        trace!(
            address = format_args!("0x{:X}", address),
            requested = size,
            transferred,
            bytes = %hex::encode(&data),
            "read process memory"
        );
        Ok(data)
    }

    /// Read one little-endian `u32` at `address` in another process
    pub fn read_process_memory_u32(&self, process: ProcessHandle, address: usize) -> ApiResult<u32> {
        let data = self.read_process_memory(process, address, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&data);
        Ok(u32::from_le_bytes(word))
    }

    /// Write `data` at `address` in another process. The whole range must be
    /// accessible. As with reads, a partial write is reported as success.
    pub fn write_process_memory(
        &self,
        process: ProcessHandle,
        address: usize,
        data: &[u8],
    ) -> ApiResult<()> {
        let mut transferred = 0usize;
        let ok = self
            .api
            .write_process_memory(process.as_raw(), address, data, &mut transferred);
        if ok == FALSE {
            return Err(self.last_error(Operation::WriteProcessMemory));
        }
        trace!(
            address = format_args!("0x{:X}", address),
            requested = data.len(),
            transferred,
            bytes = %hex::encode(data),
            "wrote process memory"
        );
        Ok(())
    }

    /// [`write_process_memory`](Self::write_process_memory) for signed bytes
    pub fn write_process_memory_signed(
        &self,
        process: ProcessHandle,
        address: usize,
        data: &[i8],
    ) -> ApiResult<()> {
        let bytes: Vec<u8> = data.iter().map(|&b| b as u8).collect();
        self.write_process_memory(process, address, &bytes)
    }

    /// Write one little-endian `u32` at `address` in another process
    pub fn write_process_memory_u32(
        &self,
        process: ProcessHandle,
        address: usize,
        value: u32,
    ) -> ApiResult<()> {
        self.write_process_memory(process, address, &value.to_le_bytes())
    }

    /// Add (`add == true`) or remove a console control handler.
    ///
    /// With `None`, `add` toggles whether the process ignores Ctrl+C.
    /// `Ok` only when the last-error code reads `ERROR_SUCCESS` afterwards.
    pub fn set_console_ctrl_handler(
        &self,
        routine: Option<HandlerRoutine>,
        add: bool,
    ) -> ApiResult<()> {
        self.api
            .set_console_ctrl_handler(routine, if add { TRUE } else { FALSE });
        self.check_success_code(Operation::SetConsoleCtrlHandler)
    }

    /// Pseudo-handle for the calling process; needs no closing
    pub fn get_current_process(&self) -> ApiResult<ProcessHandle> {
        let raw = self.api.get_current_process();
        if raw == 0 {
            return Err(self.last_error(Operation::GetCurrentProcess));
        }
        Ok(ProcessHandle::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::windows::fake::{FakeKernel32, CURRENT_IMAGE_BASE, KERNEL32_BASE};
    use crate::windows::utils::ErrorCode;

    fn kernel32() -> Kernel32<FakeKernel32> {
        Kernel32::new(FakeKernel32::new())
    }

    #[test]
    fn test_get_module_handle() {
        let k32 = kernel32();
        assert_eq!(k32.get_module_handle("").as_raw(), CURRENT_IMAGE_BASE);
        assert_eq!(k32.get_module_handle("kernel32").as_raw(), KERNEL32_BASE);
        assert_eq!(k32.get_module_handle("KERNEL32.dll").as_raw(), KERNEL32_BASE);

        let missing = k32.get_module_handle("missing.dll");
        assert!(missing.is_null());
        assert_eq!(k32.get_last_error(), 126);
    }

    #[test]
    fn test_last_error_read_right_after_call() {
        let k32 = kernel32();
        k32.api().clear_calls();
        let err = k32
            .open_process(ProcessAccess::read(), false, 9999)
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));
        assert_eq!(
            k32.api().calls(),
            vec![Operation::OpenProcess, Operation::GetLastError]
        );
    }

    #[test]
    fn test_snapshot_normalization() {
        let k32 = kernel32();
        k32.api().override_next_snapshot(0);
        assert_eq!(
            k32.create_toolhelp32_snapshot(SnapshotFlags::SNAP_PROCESS, 0),
            SnapshotHandle::INVALID
        );

        k32.api().override_next_snapshot(usize::MAX - 5);
        assert_eq!(
            k32.create_toolhelp32_snapshot(SnapshotFlags::SNAP_PROCESS, 0),
            SnapshotHandle::INVALID
        );

        k32.api().override_next_snapshot(0x1234);
        assert_eq!(
            k32.create_toolhelp32_snapshot(SnapshotFlags::SNAP_PROCESS, 0)
                .as_raw(),
            0x1234
        );
    }

    #[test]
    fn test_global_memory_lifecycle() {
        let k32 = kernel32();
        let block = k32.global_alloc(GlobalAllocFlags::GHND, 16);
        let ptr = k32.global_lock(block);
        unsafe {
            let bytes = slice::from_raw_parts_mut(ptr.as_ptr() as *mut u8, 16);
            assert!(bytes.iter().all(|&b| b == 0));
            bytes[0] = 0xAB;
        }
        assert!(!k32.global_unlock(block));
        assert_eq!(k32.get_last_error(), ERROR_SUCCESS);
        k32.global_free(block);
        assert_eq!(k32.api().global_block_count(), 0);
    }

    #[test]
    #[should_panic(expected = "GlobalAlloc failed")]
    fn test_global_alloc_aborts() {
        let k32 = kernel32();
        k32.api().fail_next(Operation::GlobalAlloc, 8);
        k32.global_alloc(GlobalAllocFlags::FIXED, 16);
    }

    #[test]
    #[should_panic(expected = "GlobalFree failed")]
    fn test_global_free_of_unknown_block_aborts() {
        let k32 = kernel32();
        k32.global_free(GlobalHandle::from_raw(0xDEAD));
    }

    #[test]
    #[should_panic(expected = "GlobalLock failed")]
    fn test_global_lock_aborts() {
        let k32 = kernel32();
        k32.global_lock(GlobalHandle::from_raw(0xDEAD));
    }

    #[test]
    fn test_resource_bytes() {
        let k32 = kernel32();
        let module = ModuleHandle::from_raw(CURRENT_IMAGE_BASE);
        k32.api()
            .add_resource(module, ResourceName::RT_RCDATA, "config", b"hello".to_vec());

        let info = k32
            .find_resource(module, &"CONFIG".into(), &ResourceName::RT_RCDATA)
            .unwrap();
        assert_eq!(k32.sizeof_resource(module, info), 5);
        let bytes = unsafe { k32.resource_bytes(module, info) };
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_find_resource_errors() {
        let k32 = kernel32();
        let module = ModuleHandle::from_raw(CURRENT_IMAGE_BASE);
        k32.api()
            .add_resource(module, ResourceName::RT_RCDATA, 101u16, vec![1]);

        let err = k32
            .find_resource(module, &101u16.into(), &ResourceName::RT_MANIFEST)
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ResourceTypeNotFound));

        let err = k32
            .find_resource(module, &102u16.into(), &ResourceName::RT_RCDATA)
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ResourceNameNotFound));
    }

    #[test]
    #[should_panic(expected = "SizeofResource failed")]
    fn test_empty_resource_aborts() {
        let k32 = kernel32();
        let module = ModuleHandle::from_raw(CURRENT_IMAGE_BASE);
        k32.api()
            .add_resource(module, ResourceName::RT_RCDATA, 1u16, Vec::new());
        let info = k32
            .find_resource(module, &1u16.into(), &ResourceName::RT_RCDATA)
            .unwrap();
        k32.sizeof_resource(module, info);
    }

    #[test]
    fn test_stale_last_error_fails_success_code_call() {
        let k32 = kernel32();
        k32.api().set_last_error(87);
        let err = k32.get_system_time().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));

        k32.api().set_last_error(ERROR_SUCCESS);
        assert!(k32.get_system_time().is_ok());
    }

    #[test]
    fn test_set_system_time_without_privilege() {
        let k32 = kernel32();
        k32.api().set_time_privilege(false);
        let time = k32.get_system_time().unwrap();
        let err = k32.set_system_time(&time).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PrivilegeNotHeld));
        assert_eq!(err.function(), Some("SetSystemTime"));
    }

    #[test]
    fn test_partial_read_is_not_detected() {
        let k32 = kernel32();
        k32.api()
            .map_memory(crate::windows::fake::CURRENT_PROCESS_ID, 0x5000, vec![1, 2, 3, 4]);
        k32.api().truncate_transfers(Some(2));

        let process = k32.get_current_process().unwrap();
        let data = k32.read_process_memory(process, 0x5000, 4).unwrap();
        assert_eq!(data, vec![1, 2, 0, 0]);
    }

    #[test]
    fn test_write_signed_bytes() {
        let k32 = kernel32();
        let pid = crate::windows::fake::CURRENT_PROCESS_ID;
        k32.api().map_memory(pid, 0x5000, vec![0; 4]);

        let process = k32.get_current_process().unwrap();
        k32.write_process_memory_signed(process, 0x5001, &[-1, 2, -128])
            .unwrap();
        assert_eq!(
            k32.api().memory(pid, 0x5000, 4),
            Some(vec![0, 0xFF, 0x02, 0x80])
        );
    }

    #[test]
    fn test_unmapped_read_fails() {
        let k32 = kernel32();
        let process = k32.get_current_process().unwrap();
        let err = k32.read_process_memory(process, 0x10, 4).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PartialCopy));
    }

    #[test]
    fn test_console_calls() {
        let k32 = kernel32();
        assert!(k32.get_console_window().is_null());

        let console = k32.api().attach_console(120, 30);
        assert!(!k32.get_console_window().is_null());

        let info = k32.get_console_screen_buffer_info(console).unwrap();
        assert_eq!(info.window.width(), 120);
        assert_eq!(info.attributes, TextAttribute::DEFAULT.value());

        let green = TextAttribute::FOREGROUND_GREEN | TextAttribute::FOREGROUND_INTENSITY;
        assert!(k32.set_console_text_attribute(console, green));
        let info = k32.get_console_screen_buffer_info(console).unwrap();
        assert_eq!(info.attributes, green.value());

        assert!(k32
            .get_console_screen_buffer_info(ConsoleHandle::from_raw(0x9999))
            .is_none());
        assert!(k32.close_handle(console));
    }

    #[test]
    fn test_disk_space_unknown_path() {
        let k32 = kernel32();
        let (ok, space) = k32.get_disk_free_space("Q:\\");
        assert!(!ok);
        assert_eq!(space, DiskSpace::default());
        assert_eq!(k32.get_last_error(), 3);
    }

    #[test]
    fn test_wide_string_calls() {
        let k32 = kernel32();
        let source = WideString::new("kernel32");
        assert_eq!(unsafe { k32.lstrlen(source.as_ptr()) }, 8);
        assert_eq!(unsafe { k32.lstrlen(std::ptr::null()) }, 0);

        let mut buf = [0xFFFFu16; 16];
        unsafe { k32.lstrcpy(&mut buf, source.as_ptr()) };
        assert_eq!(&buf[..9], source.as_slice_with_nul());
        assert_eq!(buf[9], 0xFFFF);
    }

    #[test]
    fn test_move_memory() {
        let k32 = kernel32();
        let source = [1u8, 2, 3, 4];
        let mut dest = [0u8; 4];
        unsafe {
            k32.move_memory(
                dest.as_mut_ptr() as *mut c_void,
                source.as_ptr() as *const c_void,
                4,
            )
        };
        assert_eq!(dest, source);
    }

    #[test]
    fn test_unchecked_calls() {
        let k32 = kernel32();
        assert_eq!(k32.mul_div(300, 2, 3), 200);
        assert_eq!(k32.mul_div(1, 2, 0), -1);
        assert_eq!(k32.get_logical_drives(), 0b1100);
        assert_eq!(k32.get_user_default_lcid(), 0x0409);
        assert_eq!(k32.get_current_thread(), ThreadHandle::CURRENT);
    }

    #[test]
    fn test_get_current_process() {
        let k32 = kernel32();
        assert_eq!(k32.get_current_process().unwrap(), ProcessHandle::CURRENT);

        k32.api().fail_next(Operation::GetCurrentProcess, 6);
        let err = k32.get_current_process().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidHandle));
    }

    #[test]
    fn test_close_unknown_handle() {
        let k32 = kernel32();
        assert!(!k32.close_handle(ProcessHandle::from_raw(0x4444)));
        assert_eq!(k32.get_last_error(), 6);
    }

    #[test]
    fn test_system_times() {
        let k32 = kernel32();
        let times = SystemTimes {
            idle: FileTime::from_u64(10),
            kernel: FileTime::from_u64(30),
            user: FileTime::from_u64(20),
        };
        k32.api().set_system_times(times);
        assert_eq!(k32.system_times(), Some(times));

        k32.api().fail_next(Operation::GetSystemTimes, 5);
        assert_eq!(k32.system_times(), None);
    }
}
