//! In-memory kernel32 for tests and non-Windows hosts
//!
//! [`FakeKernel32`] implements [`Kernel32Api`] over a small simulated
//! system: a process table with readable and writable memory, module lists,
//! toolhelp snapshots, global memory blocks, module resources, a console, disk
//! volumes, a UTC clock and console control handlers. Last-error codes are
//! kept per calling thread like the real ones, and only failing calls set
//! them.
//!
//! Any call can be made to fail once with [`FakeKernel32::fail_next`].

use crate::core::types::Operation;
use crate::windows::api::{HandlerRoutine, Kernel32Api, ResourceName, FALSE, TRUE};
use crate::windows::types::{
    ConsoleHandle, ConsoleScreenBufferInfo, Coord, CtrlEvent, DiskSpace, FileTime, ModuleEntry32,
    ModuleHandle, ProcessAccess, ProcessEntry32, ProcessHandle, ProcessTimes, SmallRect,
    SnapshotFlags, SystemTime, SystemTimes, TextAttribute, ThreadHandle, INVALID_HANDLE_VALUE,
};
use crate::windows::utils::string_conv::{extract_filename, wide_to_string};
use crate::windows::utils::ErrorCode;
use std::collections::{BTreeMap, HashMap};
use std::ffi::c_void;
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Process id of the simulated calling process
pub const CURRENT_PROCESS_ID: u32 = 4242;
/// Image base of the simulated calling process
pub const CURRENT_IMAGE_BASE: usize = 0x0040_0000;
/// Where the simulated `KERNEL32.DLL` is loaded
pub const KERNEL32_BASE: usize = 0x7700_0000;

const CONSOLE_WINDOW: usize = 0x0002_0A3C;
const FIRST_HANDLE: usize = 0x100;

#[derive(Debug, Clone)]
struct FakeModule {
    name: String,
    path: String,
    base: usize,
    size: u32,
}

#[derive(Debug, Clone)]
struct FakeProcess {
    parent_process_id: u32,
    exe_file: String,
    thread_count: u32,
    priority_class_base: i32,
    protected: bool,
    exit_code: Option<u32>,
    times: ProcessTimes,
    modules: Vec<FakeModule>,
    /// Mapped regions by start address
    memory: BTreeMap<usize, Vec<u8>>,
}

impl FakeProcess {
    fn new(parent_process_id: u32, exe_file: &str) -> Self {
        FakeProcess {
            parent_process_id,
            exe_file: exe_file.to_string(),
            thread_count: 1,
            priority_class_base: 8,
            protected: false,
            exit_code: None,
            times: ProcessTimes::default(),
            modules: Vec::new(),
            memory: BTreeMap::new(),
        }
    }

    /// The region holding `[address, address + len)`
    fn region_mut(&mut self, address: usize, len: usize) -> Option<&mut [u8]> {
        let (&start, bytes) = self.memory.range_mut(..=address).next_back()?;
        let offset = address - start;
        let end = offset.checked_add(len)?;
        bytes.get_mut(offset..end)
    }
}

#[derive(Debug, Clone, Copy)]
enum HandleObject {
    Process { process_id: u32, access: u32 },
    Snapshot,
    Console,
}

#[derive(Debug, Default)]
struct FakeSnapshot {
    processes: Vec<ProcessEntry32>,
    modules: Vec<ModuleEntry32>,
    process_cursor: usize,
    module_cursor: usize,
}

#[derive(Debug)]
struct GlobalBlock {
    data: Box<[u8]>,
    lock_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ResourceKey {
    Id(u16),
    Name(String),
}

impl From<&ResourceName> for ResourceKey {
    fn from(name: &ResourceName) -> Self {
        match name {
            ResourceName::Id(id) => ResourceKey::Id(*id),
            ResourceName::Name(wide) => {
                ResourceKey::Name(String::from_utf16_lossy(wide.as_slice()).to_uppercase())
            }
        }
    }
}

#[derive(Debug)]
struct FakeResource {
    module: usize,
    kind: ResourceKey,
    name: ResourceKey,
    data: Box<[u8]>,
}

#[derive(Debug)]
struct FakeState {
    last_error: HashMap<ThreadId, u32>,
    calls: Vec<Operation>,
    /// UTF-16 buffers received by string-accepting calls, terminator included
    wide_args: Vec<(Operation, Vec<u16>)>,
    failures: HashMap<Operation, u32>,
    snapshot_override: Option<usize>,
    truncate_transfers: Option<usize>,
    next_handle: usize,
    processes: BTreeMap<u32, FakeProcess>,
    handles: HashMap<usize, HandleObject>,
    snapshots: HashMap<usize, FakeSnapshot>,
    globals: HashMap<usize, GlobalBlock>,
    resources: Vec<FakeResource>,
    /// Resource info and data handles are both indices into `resources`
    resource_handles: HashMap<usize, usize>,
    consoles: HashMap<usize, ConsoleScreenBufferInfo>,
    volumes: Vec<(String, DiskSpace)>,
    clock: SystemTime,
    can_set_time: bool,
    system_times: SystemTimes,
    logical_drives: u32,
    lcid: u32,
    ctrl_handlers: Vec<HandlerRoutine>,
    ignore_ctrl_c: bool,
}

impl FakeState {
    fn new() -> Self {
        let mut processes = BTreeMap::new();
        let mut idle = FakeProcess::new(0, "[System Process]");
        idle.protected = true;
        processes.insert(0, idle);
        let mut system = FakeProcess::new(0, "System");
        system.protected = true;
        system.thread_count = 160;
        processes.insert(4, system);
        processes.insert(1000, FakeProcess::new(4, "explorer.exe"));

        let mut current = FakeProcess::new(1000, "app.exe");
        current.modules.push(FakeModule {
            name: "app.exe".to_string(),
            path: "C:\\Program Files\\App\\app.exe".to_string(),
            base: CURRENT_IMAGE_BASE,
            size: 0x0001_0000,
        });
        current.modules.push(FakeModule {
            name: "KERNEL32.DLL".to_string(),
            path: "C:\\Windows\\System32\\KERNEL32.DLL".to_string(),
            base: KERNEL32_BASE,
            size: 0x000F_0000,
        });
        processes.insert(CURRENT_PROCESS_ID, current);

        FakeState {
            last_error: HashMap::new(),
            calls: Vec::new(),
            wide_args: Vec::new(),
            failures: HashMap::new(),
            snapshot_override: None,
            truncate_transfers: None,
            next_handle: FIRST_HANDLE,
            processes,
            handles: HashMap::new(),
            snapshots: HashMap::new(),
            globals: HashMap::new(),
            resources: Vec::new(),
            resource_handles: HashMap::new(),
            consoles: HashMap::new(),
            volumes: Vec::new(),
            clock: SystemTime {
                year: 2024,
                month: 1,
                day_of_week: 1,
                day: 1,
                hour: 0,
                minute: 0,
                second: 0,
                milliseconds: 0,
            },
            can_set_time: true,
            system_times: SystemTimes::default(),
            logical_drives: 0b1100,
            lcid: 0x0409,
            ctrl_handlers: Vec::new(),
            ignore_ctrl_c: false,
        }
    }

    /// Record the call and take any failure injected for it
    fn enter(&mut self, op: Operation) -> Option<u32> {
        self.calls.push(op);
        let code = self.failures.remove(&op)?;
        self.set_error(code);
        Some(code)
    }

    fn record_wide(&mut self, op: Operation, arg: &[u16]) {
        self.wide_args.push((op, arg.to_vec()));
    }

    fn set_error(&mut self, code: u32) {
        self.last_error.insert(thread::current().id(), code);
    }

    fn alloc_handle(&mut self) -> usize {
        let handle = self.next_handle;
        self.next_handle += 4;
        handle
    }

    fn current_modules(&self) -> &[FakeModule] {
        self.processes
            .get(&CURRENT_PROCESS_ID)
            .map(|process| process.modules.as_slice())
            .unwrap_or(&[])
    }

    /// Resolve a process handle, checking that it carries `required` rights
    fn process_for(&self, handle: usize, required: u32) -> Result<u32, ErrorCode> {
        let (process_id, access) = if handle == ProcessHandle::CURRENT.as_raw() {
            (CURRENT_PROCESS_ID, ProcessAccess::ALL_ACCESS.value())
        } else {
            match self.handles.get(&handle) {
                Some(HandleObject::Process { process_id, access }) => (*process_id, *access),
                _ => return Err(ErrorCode::InvalidHandle),
            }
        };
        if access & required != required {
            return Err(ErrorCode::AccessDenied);
        }
        Ok(process_id)
    }

    fn take_snapshot(&self, flags: SnapshotFlags, process_id: u32) -> Result<FakeSnapshot, ErrorCode> {
        let mut snapshot = FakeSnapshot::default();
        if flags.contains(SnapshotFlags::SNAP_PROCESS) {
            for (&id, process) in self.processes.iter().filter(|(_, p)| p.exit_code.is_none()) {
                let mut entry = ProcessEntry32::new();
                entry.process_id = id;
                entry.parent_process_id = process.parent_process_id;
                entry.thread_count = process.thread_count;
                entry.priority_class_base = process.priority_class_base;
                entry.set_exe_file(&process.exe_file);
                snapshot.processes.push(entry);
            }
        }
        if flags.contains(SnapshotFlags::SNAP_MODULE) || flags.contains(SnapshotFlags::SNAP_MODULE32) {
            let owner = if process_id == 0 { CURRENT_PROCESS_ID } else { process_id };
            let process = self
                .processes
                .get(&owner)
                .filter(|p| p.exit_code.is_none())
                .ok_or(ErrorCode::InvalidParameter)?;
            if process.protected {
                return Err(ErrorCode::AccessDenied);
            }
            for module in &process.modules {
                let mut entry = ModuleEntry32::new();
                entry.module_id = 1;
                entry.process_id = owner;
                entry.global_usage = 0xFFFF;
                entry.process_usage = 0xFFFF;
                entry.base_address = module.base;
                entry.base_size = module.size;
                entry.module = ModuleHandle::from_raw(module.base);
                entry.set_module_name(&module.name);
                entry.set_exe_path(&module.path);
                snapshot.modules.push(entry);
            }
        }
        Ok(snapshot)
    }

    fn find_resource(&self, module: usize, name: &ResourceName, kind: &ResourceName) -> Result<usize, ErrorCode> {
        let kind = ResourceKey::from(kind);
        let name = ResourceKey::from(name);
        let mut of_kind = self
            .resources
            .iter()
            .enumerate()
            .filter(|(_, r)| r.module == module && r.kind == kind)
            .peekable();
        if of_kind.peek().is_none() {
            return Err(ErrorCode::ResourceTypeNotFound);
        }
        of_kind
            .find(|(_, r)| r.name == name)
            .map(|(index, _)| index)
            .ok_or(ErrorCode::ResourceNameNotFound)
    }

    fn volume_for(&self, directory: &str) -> Option<DiskSpace> {
        let directory = directory.to_lowercase();
        self.volumes
            .iter()
            .filter(|(root, _)| directory.starts_with(root.as_str()))
            .max_by_key(|(root, _)| root.len())
            .map(|(_, space)| *space)
    }
}

/// Simulated kernel32; see the module docs
#[derive(Debug)]
pub struct FakeKernel32 {
    state: Mutex<FakeState>,
}

impl Default for FakeKernel32 {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeKernel32 {
    /// A system with the idle and System processes, `explorer.exe`, and the
    /// calling process `app.exe` (pid [`CURRENT_PROCESS_ID`]) with its image
    /// and `KERNEL32.DLL` loaded
    pub fn new() -> Self {
        FakeKernel32 {
            state: Mutex::new(FakeState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `op` fail with last-error `code`
    pub fn fail_next(&self, op: Operation, code: u32) {
        self.state().failures.insert(op, code);
    }

    /// Return `raw` from the next `CreateToolhelp32Snapshot`, unmodified
    pub fn override_next_snapshot(&self, raw: usize) {
        self.state().snapshot_override = Some(raw);
    }

    /// Report success for memory transfers but move at most `limit` bytes
    pub fn truncate_transfers(&self, limit: Option<usize>) {
        self.state().truncate_transfers = limit;
    }

    /// Set the calling thread's last-error code
    pub fn set_last_error(&self, code: u32) {
        self.state().set_error(code);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        self.state().calls.iter().filter(|&&call| call == op).count()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state();
        state.calls.clear();
        state.wide_args.clear();
    }

    /// Wide string arguments passed to `op`, oldest first
    pub fn wide_arguments(&self, op: Operation) -> Vec<Vec<u16>> {
        self.state()
            .wide_args
            .iter()
            .filter(|(call, _)| *call == op)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    pub fn add_process(&self, process_id: u32, parent_process_id: u32, exe_file: &str) {
        self.state()
            .processes
            .insert(process_id, FakeProcess::new(parent_process_id, exe_file));
    }

    /// Protected processes refuse `OpenProcess` and module snapshots
    pub fn set_protected(&self, process_id: u32, protected: bool) {
        if let Some(process) = self.state().processes.get_mut(&process_id) {
            process.protected = protected;
        }
    }

    pub fn set_process_times(&self, process_id: u32, times: ProcessTimes) {
        if let Some(process) = self.state().processes.get_mut(&process_id) {
            process.times = times;
        }
    }

    /// Exit code of a terminated process
    pub fn exit_code(&self, process_id: u32) -> Option<u32> {
        self.state()
            .processes
            .get(&process_id)
            .and_then(|process| process.exit_code)
    }

    /// Load a module into a process; the handle is its base address
    pub fn add_module(&self, process_id: u32, path: &str, base: usize, size: u32) -> ModuleHandle {
        let name = extract_filename(path);
        if let Some(process) = self.state().processes.get_mut(&process_id) {
            process.modules.push(FakeModule {
                name,
                path: path.to_string(),
                base,
                size,
            });
        }
        ModuleHandle::from_raw(base)
    }

    /// Map readable and writable memory into a process
    pub fn map_memory(&self, process_id: u32, address: usize, bytes: Vec<u8>) {
        if let Some(process) = self.state().processes.get_mut(&process_id) {
            process.memory.insert(address, bytes);
        }
    }

    /// Bytes at `[address, address + len)` of a process, if mapped
    pub fn memory(&self, process_id: u32, address: usize, len: usize) -> Option<Vec<u8>> {
        let mut state = self.state();
        let process = state.processes.get_mut(&process_id)?;
        process.region_mut(address, len).map(|bytes| bytes.to_vec())
    }

    /// Number of open process and snapshot handles
    pub fn open_handle_count(&self) -> usize {
        self.state()
            .handles
            .values()
            .filter(|object| !matches!(object, HandleObject::Console))
            .count()
    }

    /// Number of live global memory blocks
    pub fn global_block_count(&self) -> usize {
        self.state().globals.len()
    }

    pub fn add_resource(
        &self,
        module: ModuleHandle,
        kind: impl Into<ResourceName>,
        name: impl Into<ResourceName>,
        data: Vec<u8>,
    ) {
        self.state().resources.push(FakeResource {
            module: module.as_raw(),
            kind: ResourceKey::from(&kind.into()),
            name: ResourceKey::from(&name.into()),
            data: data.into_boxed_slice(),
        });
    }

    /// Attach a console screen buffer and return its handle
    pub fn attach_console(&self, columns: i16, rows: i16) -> ConsoleHandle {
        let mut state = self.state();
        let handle = state.alloc_handle();
        let info = ConsoleScreenBufferInfo {
            size: Coord { x: columns, y: rows },
            cursor_position: Coord::default(),
            attributes: TextAttribute::DEFAULT.value(),
            window: SmallRect {
                left: 0,
                top: 0,
                right: columns.saturating_sub(1),
                bottom: rows.saturating_sub(1),
            },
            maximum_window_size: Coord { x: columns, y: rows },
        };
        state.consoles.insert(handle, info);
        state.handles.insert(handle, HandleObject::Console);
        ConsoleHandle::from_raw(handle)
    }

    /// Register a volume; directories under `root` report `space`
    pub fn add_volume(&self, root: &str, space: DiskSpace) {
        self.state().volumes.push((root.to_lowercase(), space));
    }

    pub fn clock(&self) -> SystemTime {
        self.state().clock
    }

    /// Whether the caller holds the privilege `SetSystemTime` needs
    pub fn set_time_privilege(&self, held: bool) {
        self.state().can_set_time = held;
    }

    pub fn set_system_times(&self, times: SystemTimes) {
        self.state().system_times = times;
    }

    pub fn set_logical_drives(&self, mask: u32) {
        self.state().logical_drives = mask;
    }

    pub fn set_user_default_lcid(&self, lcid: u32) {
        self.state().lcid = lcid;
    }

    pub fn ctrl_handler_count(&self) -> usize {
        self.state().ctrl_handlers.len()
    }

    /// Deliver a control event on the calling thread, the way the OS does on
    /// a thread of its own. Handlers run last-registered first until one
    /// returns `TRUE`. Returns whether the event was handled.
    pub fn raise_ctrl_event(&self, event: CtrlEvent) -> bool {
        let handlers = {
            let state = self.state();
            if event == CtrlEvent::CtrlC && state.ignore_ctrl_c {
                return true;
            }
            state.ctrl_handlers.clone()
        };
        handlers
            .iter()
            .rev()
            .any(|&handler| unsafe { handler(event.code()) } != FALSE)
    }
}

impl Kernel32Api for FakeKernel32 {
    fn get_module_handle_w(&self, module_name: Option<&[u16]>) -> usize {
        let mut state = self.state();
        if let Some(name) = module_name {
            state.record_wide(Operation::GetModuleHandle, name);
        }
        if state.enter(Operation::GetModuleHandle).is_some() {
            return 0;
        }
        let Some(name) = module_name else {
            return CURRENT_IMAGE_BASE;
        };
        let mut wanted = wide_to_string(name).to_lowercase();
        if !wanted.contains('.') {
            wanted.push_str(".dll");
        }
        let found = state
            .current_modules()
            .iter()
            .find(|module| module.name.to_lowercase() == wanted)
            .map(|module| module.base);
        match found {
            Some(base) => base,
            None => {
                state.set_error(ErrorCode::ModNotFound.code());
                0
            }
        }
    }

    fn mul_div(&self, number: i32, numerator: i32, denominator: i32) -> i32 {
        self.state().enter(Operation::MulDiv);
        if denominator == 0 {
            return -1;
        }
        let product = number as i64 * numerator as i64;
        let divisor = denominator as i64;
        let mut quotient = (product.abs() + divisor.abs() / 2) / divisor.abs();
        if (product < 0) != (divisor < 0) {
            quotient = -quotient;
        }
        i32::try_from(quotient).unwrap_or(-1)
    }

    fn get_console_window(&self) -> usize {
        let mut state = self.state();
        state.enter(Operation::GetConsoleWindow);
        if state.consoles.is_empty() {
            0
        } else {
            CONSOLE_WINDOW
        }
    }

    fn get_current_thread(&self) -> usize {
        self.state().enter(Operation::GetCurrentThread);
        ThreadHandle::CURRENT.as_raw()
    }

    fn get_logical_drives(&self) -> u32 {
        let mut state = self.state();
        if state.enter(Operation::GetLogicalDrives).is_some() {
            return 0;
        }
        state.logical_drives
    }

    fn get_user_default_lcid(&self) -> u32 {
        let mut state = self.state();
        state.enter(Operation::GetUserDefaultLcid);
        state.lcid
    }

    unsafe fn lstrlen_w(&self, string: *const u16) -> i32 {
        self.state().enter(Operation::Lstrlen);
        if string.is_null() {
            return 0;
        }
        let mut len = 0;
        while *string.add(len) != 0 {
            len += 1;
        }
        len as i32
    }

    unsafe fn lstrcpy_w(&self, dest: *mut u16, src: *const u16) -> *mut u16 {
        self.state().enter(Operation::Lstrcpy);
        if dest.is_null() || src.is_null() {
            return ptr::null_mut();
        }
        let mut i = 0;
        loop {
            let unit = *src.add(i);
            *dest.add(i) = unit;
            if unit == 0 {
                break;
            }
            i += 1;
        }
        dest
    }

    fn global_alloc(&self, _flags: u32, bytes: usize) -> usize {
        let mut state = self.state();
        if state.enter(Operation::GlobalAlloc).is_some() {
            return 0;
        }
        let handle = state.alloc_handle();
        state.globals.insert(
            handle,
            GlobalBlock {
                data: vec![0u8; bytes.max(1)].into_boxed_slice(),
                lock_count: 0,
            },
        );
        handle
    }

    fn global_free(&self, mem: usize) -> usize {
        let mut state = self.state();
        if state.enter(Operation::GlobalFree).is_some() {
            return mem;
        }
        if state.globals.remove(&mem).is_none() {
            state.set_error(ErrorCode::InvalidHandle.code());
            return mem;
        }
        0
    }

    fn global_lock(&self, mem: usize) -> *mut c_void {
        let mut state = self.state();
        if state.enter(Operation::GlobalLock).is_some() {
            return ptr::null_mut();
        }
        match state.globals.get_mut(&mem) {
            Some(block) => {
                block.lock_count += 1;
                block.data.as_mut_ptr() as *mut c_void
            }
            None => {
                state.set_error(ErrorCode::InvalidHandle.code());
                ptr::null_mut()
            }
        }
    }

    fn global_unlock(&self, mem: usize) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::GlobalUnlock).is_some() {
            return FALSE;
        }
        let remaining = match state.globals.get_mut(&mem) {
            None => Err(ErrorCode::InvalidHandle),
            Some(block) if block.lock_count == 0 => Err(ErrorCode::NotLocked),
            Some(block) => {
                block.lock_count -= 1;
                Ok(block.lock_count)
            }
        };
        match remaining {
            Ok(0) => {
                state.set_error(ErrorCode::Success.code());
                FALSE
            }
            Ok(_) => TRUE,
            Err(code) => {
                state.set_error(code.code());
                FALSE
            }
        }
    }

    unsafe fn rtl_move_memory(&self, dest: *mut c_void, src: *const c_void, length: usize) {
        self.state().enter(Operation::MoveMemory);
        ptr::copy(src as *const u8, dest as *mut u8, length);
    }

    fn find_resource_w(&self, module: usize, name: &ResourceName, kind: &ResourceName) -> usize {
        let mut state = self.state();
        for arg in [name, kind] {
            if let ResourceName::Name(text) = arg {
                state.record_wide(Operation::FindResource, text.as_slice_with_nul());
            }
        }
        if state.enter(Operation::FindResource).is_some() {
            return 0;
        }
        let module = if module == 0 { CURRENT_IMAGE_BASE } else { module };
        match state.find_resource(module, name, kind) {
            Ok(index) => {
                let handle = state.alloc_handle();
                state.resource_handles.insert(handle, index);
                handle
            }
            Err(code) => {
                state.set_error(code.code());
                0
            }
        }
    }

    fn sizeof_resource(&self, _module: usize, res_info: usize) -> u32 {
        let mut state = self.state();
        if state.enter(Operation::SizeofResource).is_some() {
            return 0;
        }
        match state.resource_handles.get(&res_info) {
            Some(&index) => state.resources[index].data.len() as u32,
            None => {
                state.set_error(ErrorCode::InvalidHandle.code());
                0
            }
        }
    }

    fn load_resource(&self, _module: usize, res_info: usize) -> usize {
        let mut state = self.state();
        if state.enter(Operation::LoadResource).is_some() {
            return 0;
        }
        match state.resource_handles.get(&res_info).copied() {
            Some(index) => {
                let handle = state.alloc_handle();
                state.resource_handles.insert(handle, index);
                handle
            }
            None => {
                state.set_error(ErrorCode::InvalidHandle.code());
                0
            }
        }
    }

    fn lock_resource(&self, res_data: usize) -> *mut c_void {
        let mut state = self.state();
        if state.enter(Operation::LockResource).is_some() {
            return ptr::null_mut();
        }
        match state.resource_handles.get(&res_data) {
            Some(&index) => state.resources[index].data.as_ptr() as *mut c_void,
            None => ptr::null_mut(),
        }
    }

    fn get_last_error(&self) -> u32 {
        let mut state = self.state();
        state.calls.push(Operation::GetLastError);
        state
            .last_error
            .get(&thread::current().id())
            .copied()
            .unwrap_or(0)
    }

    fn open_process(&self, desired_access: u32, _inherit_handle: i32, process_id: u32) -> usize {
        let mut state = self.state();
        if state.enter(Operation::OpenProcess).is_some() {
            return 0;
        }
        let outcome = match state.processes.get(&process_id) {
            None => Err(ErrorCode::InvalidParameter),
            Some(process) if process.exit_code.is_some() => Err(ErrorCode::InvalidParameter),
            Some(process) if process.protected => Err(ErrorCode::AccessDenied),
            Some(_) => Ok(()),
        };
        match outcome {
            Ok(()) => {
                let handle = state.alloc_handle();
                state.handles.insert(
                    handle,
                    HandleObject::Process {
                        process_id,
                        access: desired_access,
                    },
                );
                handle
            }
            Err(code) => {
                state.set_error(code.code());
                0
            }
        }
    }

    fn terminate_process(&self, process: usize, exit_code: u32) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::TerminateProcess).is_some() {
            return FALSE;
        }
        match state.process_for(process, ProcessAccess::TERMINATE.value()) {
            Ok(process_id) => {
                if let Some(target) = state.processes.get_mut(&process_id) {
                    target.exit_code = Some(exit_code);
                }
                TRUE
            }
            Err(code) => {
                state.set_error(code.code());
                FALSE
            }
        }
    }

    fn close_handle(&self, object: usize) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::CloseHandle).is_some() {
            return FALSE;
        }
        if object == ProcessHandle::CURRENT.as_raw() || object == ThreadHandle::CURRENT.as_raw() {
            return TRUE;
        }
        match state.handles.remove(&object) {
            Some(HandleObject::Snapshot) => {
                state.snapshots.remove(&object);
                TRUE
            }
            Some(HandleObject::Console) => {
                state.consoles.remove(&object);
                TRUE
            }
            Some(HandleObject::Process { .. }) => TRUE,
            None => {
                state.set_error(ErrorCode::InvalidHandle.code());
                FALSE
            }
        }
    }

    fn create_toolhelp32_snapshot(&self, flags: u32, process_id: u32) -> usize {
        let mut state = self.state();
        if state.enter(Operation::CreateToolhelp32Snapshot).is_some() {
            return INVALID_HANDLE_VALUE;
        }
        if let Some(raw) = state.snapshot_override.take() {
            return raw;
        }
        match state.take_snapshot(SnapshotFlags::from_raw(flags), process_id) {
            Ok(snapshot) => {
                let handle = state.alloc_handle();
                state.snapshots.insert(handle, snapshot);
                state.handles.insert(handle, HandleObject::Snapshot);
                handle
            }
            Err(code) => {
                state.set_error(code.code());
                INVALID_HANDLE_VALUE
            }
        }
    }

    fn module32_first_w(&self, snapshot: usize, entry: &mut ModuleEntry32) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::Module32First).is_some() {
            return FALSE;
        }
        if let Some(snap) = state.snapshots.get_mut(&snapshot) {
            snap.module_cursor = 0;
        }
        next_module(&mut state, snapshot, entry)
    }

    fn module32_next_w(&self, snapshot: usize, entry: &mut ModuleEntry32) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::Module32Next).is_some() {
            return FALSE;
        }
        next_module(&mut state, snapshot, entry)
    }

    fn process32_first_w(&self, snapshot: usize, entry: &mut ProcessEntry32) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::Process32First).is_some() {
            return FALSE;
        }
        if let Some(snap) = state.snapshots.get_mut(&snapshot) {
            snap.process_cursor = 0;
        }
        next_process(&mut state, snapshot, entry)
    }

    fn process32_next_w(&self, snapshot: usize, entry: &mut ProcessEntry32) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::Process32Next).is_some() {
            return FALSE;
        }
        next_process(&mut state, snapshot, entry)
    }

    fn get_system_times(
        &self,
        idle_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::GetSystemTimes).is_some() {
            return FALSE;
        }
        *idle_time = state.system_times.idle;
        *kernel_time = state.system_times.kernel;
        *user_time = state.system_times.user;
        TRUE
    }

    fn get_process_times(
        &self,
        process: usize,
        creation_time: &mut FileTime,
        exit_time: &mut FileTime,
        kernel_time: &mut FileTime,
        user_time: &mut FileTime,
    ) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::GetProcessTimes).is_some() {
            return FALSE;
        }
        let times = state
            .process_for(process, ProcessAccess::QUERY_LIMITED_INFORMATION.value())
            .or_else(|_| state.process_for(process, ProcessAccess::QUERY_INFORMATION.value()))
            .map(|process_id| {
                state
                    .processes
                    .get(&process_id)
                    .map(|p| p.times)
                    .unwrap_or_default()
            });
        match times {
            Ok(times) => {
                *creation_time = times.creation;
                *exit_time = times.exit;
                *kernel_time = times.kernel;
                *user_time = times.user;
                TRUE
            }
            Err(code) => {
                state.set_error(code.code());
                FALSE
            }
        }
    }

    fn get_console_screen_buffer_info(
        &self,
        console_output: usize,
        info: &mut ConsoleScreenBufferInfo,
    ) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::GetConsoleScreenBufferInfo).is_some() {
            return FALSE;
        }
        match state.consoles.get(&console_output) {
            Some(console) => {
                *info = *console;
                TRUE
            }
            None => {
                state.set_error(ErrorCode::InvalidHandle.code());
                FALSE
            }
        }
    }

    fn set_console_text_attribute(&self, console_output: usize, attributes: u16) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::SetConsoleTextAttribute).is_some() {
            return FALSE;
        }
        match state.consoles.get_mut(&console_output) {
            Some(console) => {
                console.attributes = attributes;
                TRUE
            }
            None => {
                state.set_error(ErrorCode::InvalidHandle.code());
                FALSE
            }
        }
    }

    fn get_disk_free_space_ex_w(
        &self,
        directory: &[u16],
        free_bytes_available: &mut u64,
        total_bytes: &mut u64,
        total_free_bytes: &mut u64,
    ) -> i32 {
        let mut state = self.state();
        state.record_wide(Operation::GetDiskFreeSpaceEx, directory);
        if state.enter(Operation::GetDiskFreeSpaceEx).is_some() {
            return FALSE;
        }
        match state.volume_for(&wide_to_string(directory)) {
            Some(space) => {
                *free_bytes_available = space.free_bytes_available;
                *total_bytes = space.total_bytes;
                *total_free_bytes = space.total_free_bytes;
                TRUE
            }
            None => {
                state.set_error(ErrorCode::PathNotFound.code());
                FALSE
            }
        }
    }

    fn get_system_time(&self, time: &mut SystemTime) {
        let mut state = self.state();
        state.enter(Operation::GetSystemTime);
        *time = state.clock;
    }

    fn set_system_time(&self, time: &SystemTime) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::SetSystemTime).is_some() {
            return FALSE;
        }
        if !state.can_set_time {
            state.set_error(ErrorCode::PrivilegeNotHeld.code());
            return FALSE;
        }
        if !time.is_valid() {
            state.set_error(ErrorCode::InvalidParameter.code());
            return FALSE;
        }
        state.clock = *time;
        TRUE
    }

    fn read_process_memory(
        &self,
        process: usize,
        base_address: usize,
        buffer: &mut [u8],
        bytes_read: &mut usize,
    ) -> i32 {
        let mut state = self.state();
        *bytes_read = 0;
        if state.enter(Operation::ReadProcessMemory).is_some() {
            return FALSE;
        }
        let limit = state.truncate_transfers.unwrap_or(usize::MAX);
        let process_id = match state.process_for(process, ProcessAccess::VM_READ.value()) {
            Ok(process_id) => process_id,
            Err(code) => {
                state.set_error(code.code());
                return FALSE;
            }
        };
        let region = state
            .processes
            .get_mut(&process_id)
            .and_then(|target| target.region_mut(base_address, buffer.len()));
        match region {
            Some(source) => {
                let count = source.len().min(limit);
                buffer[..count].copy_from_slice(&source[..count]);
                *bytes_read = count;
                TRUE
            }
            None => {
                state.set_error(ErrorCode::PartialCopy.code());
                FALSE
            }
        }
    }

    fn write_process_memory(
        &self,
        process: usize,
        base_address: usize,
        data: &[u8],
        bytes_written: &mut usize,
    ) -> i32 {
        let mut state = self.state();
        *bytes_written = 0;
        if state.enter(Operation::WriteProcessMemory).is_some() {
            return FALSE;
        }
        let limit = state.truncate_transfers.unwrap_or(usize::MAX);
        let required = ProcessAccess::VM_WRITE.value() | ProcessAccess::VM_OPERATION.value();
        let process_id = match state.process_for(process, required) {
            Ok(process_id) => process_id,
            Err(code) => {
                state.set_error(code.code());
                return FALSE;
            }
        };
        let region = state
            .processes
            .get_mut(&process_id)
            .and_then(|target| target.region_mut(base_address, data.len()));
        match region {
            Some(target) => {
                let count = data.len().min(limit);
                target[..count].copy_from_slice(&data[..count]);
                *bytes_written = count;
                TRUE
            }
            None => {
                state.set_error(ErrorCode::PartialCopy.code());
                FALSE
            }
        }
    }

    fn set_console_ctrl_handler(&self, routine: Option<HandlerRoutine>, add: i32) -> i32 {
        let mut state = self.state();
        if state.enter(Operation::SetConsoleCtrlHandler).is_some() {
            return FALSE;
        }
        match (routine, add != FALSE) {
            (None, ignore) => {
                state.ignore_ctrl_c = ignore;
                TRUE
            }
            (Some(handler), true) => {
                state.ctrl_handlers.push(handler);
                TRUE
            }
            (Some(handler), false) => {
                let position = state
                    .ctrl_handlers
                    .iter()
                    .rposition(|&registered| registered as usize == handler as usize);
                match position {
                    Some(index) => {
                        state.ctrl_handlers.remove(index);
                        TRUE
                    }
                    None => {
                        state.set_error(ErrorCode::InvalidParameter.code());
                        FALSE
                    }
                }
            }
        }
    }

    fn get_current_process(&self) -> usize {
        let mut state = self.state();
        if state.enter(Operation::GetCurrentProcess).is_some() {
            return 0;
        }
        ProcessHandle::CURRENT.as_raw()
    }
}

fn next_module(state: &mut FakeState, snapshot: usize, entry: &mut ModuleEntry32) -> i32 {
    if entry.size != ModuleEntry32::SIZE {
        state.set_error(ErrorCode::BadLength.code());
        return FALSE;
    }
    let Some(snap) = state.snapshots.get_mut(&snapshot) else {
        state.set_error(ErrorCode::InvalidHandle.code());
        return FALSE;
    };
    match snap.modules.get(snap.module_cursor) {
        Some(next) => {
            *entry = *next;
            snap.module_cursor += 1;
            TRUE
        }
        None => {
            state.set_error(ErrorCode::NoMoreFiles.code());
            FALSE
        }
    }
}

fn next_process(state: &mut FakeState, snapshot: usize, entry: &mut ProcessEntry32) -> i32 {
    if entry.size != ProcessEntry32::SIZE {
        state.set_error(ErrorCode::BadLength.code());
        return FALSE;
    }
    let Some(snap) = state.snapshots.get_mut(&snapshot) else {
        state.set_error(ErrorCode::InvalidHandle.code());
        return FALSE;
    };
    match snap.processes.get(snap.process_cursor) {
        Some(next) => {
            *entry = *next;
            snap.process_cursor += 1;
            TRUE
        }
        None => {
            state.set_error(ErrorCode::NoMoreFiles.code());
            FALSE
        }
    }
}
