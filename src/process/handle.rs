//! Process handle wrapper with RAII semantics

use crate::core::types::{ApiResult, ProcessId};
use crate::windows::api::Kernel32Api;
use crate::windows::bindings::Kernel32;
use crate::windows::types::{ProcessAccess, ProcessHandle, ProcessTimes};
use std::fmt;
use tracing::{debug, warn};

/// An opened process that closes its handle on drop
pub struct OwnedProcess<'k, A: Kernel32Api> {
    kernel32: &'k Kernel32<A>,
    handle: ProcessHandle,
    pid: ProcessId,
    access: ProcessAccess,
}

impl<'k, A: Kernel32Api> OwnedProcess<'k, A> {
    /// Open a process with specified access rights
    pub fn open(kernel32: &'k Kernel32<A>, pid: ProcessId, access: ProcessAccess) -> ApiResult<Self> {
        let handle = kernel32.open_process(access, false, pid)?;
        debug!(pid, access = format_args!("0x{:X}", access.value()), "Opened process");
        Ok(OwnedProcess {
            kernel32,
            handle,
            pid,
            access,
        })
    }

    /// Open a process for reading memory
    pub fn open_for_read(kernel32: &'k Kernel32<A>, pid: ProcessId) -> ApiResult<Self> {
        Self::open(kernel32, pid, ProcessAccess::read())
    }

    /// Open a process for reading and writing memory
    pub fn open_for_read_write(kernel32: &'k Kernel32<A>, pid: ProcessId) -> ApiResult<Self> {
        Self::open(kernel32, pid, ProcessAccess::read_write())
    }

    /// Get the process ID
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// The raw handle; valid only while `self` is alive
    pub fn handle(&self) -> ProcessHandle {
        self.handle
    }

    /// Get the access rights
    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    /// Read `size` bytes; a partial read is not detected
    pub fn read_memory(&self, address: usize, size: usize) -> ApiResult<Vec<u8>> {
        self.kernel32.read_process_memory(self.handle, address, size)
    }

    /// Write `data`; a partial write is not detected
    pub fn write_memory(&self, address: usize, data: &[u8]) -> ApiResult<()> {
        self.kernel32.write_process_memory(self.handle, address, data)
    }

    pub fn read_u32(&self, address: usize) -> ApiResult<u32> {
        self.kernel32.read_process_memory_u32(self.handle, address)
    }

    pub fn write_u32(&self, address: usize, value: u32) -> ApiResult<()> {
        self.kernel32
            .write_process_memory_u32(self.handle, address, value)
    }

    /// Creation, exit, kernel and user times, if the OS reports them
    pub fn times(&self) -> Option<ProcessTimes> {
        self.kernel32.process_times(self.handle)
    }

    /// Terminate the process; the handle stays open until drop
    pub fn terminate(&self, exit_code: u32) -> bool {
        self.kernel32.terminate_process(self.handle, exit_code)
    }
}

impl<A: Kernel32Api> Drop for OwnedProcess<'_, A> {
    fn drop(&mut self) {
        if !self.kernel32.close_handle(self.handle) {
            warn!(pid = self.pid, "Failed to close process handle");
        }
    }
}

impl<A: Kernel32Api> fmt::Debug for OwnedProcess<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedProcess")
            .field("pid", &self.pid)
            .field("handle", &self.handle)
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}

impl<A: Kernel32Api> fmt::Display for OwnedProcess<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnedProcess(pid={})", self.pid)
    }
}
