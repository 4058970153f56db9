//! Process and module enumeration over toolhelp snapshots

use crate::core::types::{ApiError, ApiResult, Operation, ProcessId};
use crate::process::info::{ModuleInfo, ProcessInfo};
use crate::windows::api::Kernel32Api;
use crate::windows::bindings::Kernel32;
use crate::windows::types::{ModuleEntry32, ProcessEntry32, SnapshotFlags, SnapshotHandle};
use crate::windows::utils::ErrorCode;
use std::fmt;
use tracing::{debug, warn};

/// A toolhelp snapshot that closes its handle on drop
pub struct Snapshot<'k, A: Kernel32Api> {
    kernel32: &'k Kernel32<A>,
    handle: SnapshotHandle,
}

impl<'k, A: Kernel32Api> Snapshot<'k, A> {
    /// Take a snapshot. An invalid handle becomes an error carrying the
    /// last-error code.
    pub fn new(
        kernel32: &'k Kernel32<A>,
        flags: SnapshotFlags,
        process_id: ProcessId,
    ) -> ApiResult<Self> {
        let handle = kernel32.create_toolhelp32_snapshot(flags, process_id);
        if !handle.is_valid() {
            return Err(ApiError::os(
                Operation::CreateToolhelp32Snapshot,
                kernel32.get_last_error(),
            ));
        }
        Ok(Snapshot { kernel32, handle })
    }

    /// Snapshot of every process in the system
    pub fn processes(kernel32: &'k Kernel32<A>) -> ApiResult<Self> {
        Self::new(kernel32, SnapshotFlags::SNAP_PROCESS, 0)
    }

    /// Snapshot of the modules of one process; `0` means the caller
    pub fn modules(kernel32: &'k Kernel32<A>, process_id: ProcessId) -> ApiResult<Self> {
        Self::new(
            kernel32,
            SnapshotFlags::SNAP_MODULE | SnapshotFlags::SNAP_MODULE32,
            process_id,
        )
    }

    pub fn handle(&self) -> SnapshotHandle {
        self.handle
    }

    /// Walk the processes from the first one
    pub fn process_entries(&self) -> ProcessEntries<'_, 'k, A> {
        ProcessEntries {
            snapshot: self,
            started: false,
            done: false,
        }
    }

    /// Walk the modules from the first one
    pub fn module_entries(&self) -> ModuleEntries<'_, 'k, A> {
        ModuleEntries {
            snapshot: self,
            started: false,
            done: false,
        }
    }
}

impl<A: Kernel32Api> Drop for Snapshot<'_, A> {
    fn drop(&mut self) {
        if !self.kernel32.close_handle(self.handle) {
            warn!(handle = ?self.handle, "Failed to close snapshot");
        }
    }
}

impl<A: Kernel32Api> fmt::Debug for Snapshot<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Process entries of a snapshot.
///
/// Ends at `ERROR_NO_MORE_FILES`; any other failure is yielded once as an
/// error and ends the walk.
pub struct ProcessEntries<'s, 'k, A: Kernel32Api> {
    snapshot: &'s Snapshot<'k, A>,
    started: bool,
    done: bool,
}

impl<A: Kernel32Api> Iterator for ProcessEntries<'_, '_, A> {
    type Item = ApiResult<ProcessEntry32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let kernel32 = self.snapshot.kernel32;
        let mut entry = ProcessEntry32::new();
        let result = if self.started {
            kernel32.process32_next(self.snapshot.handle, &mut entry)
        } else {
            self.started = true;
            kernel32.process32_first(self.snapshot.handle, &mut entry)
        };

        match result {
            Ok(()) => Some(Ok(entry)),
            Err(err) => {
                self.done = true;
                if err.code() == Some(ErrorCode::NoMoreFiles) {
                    None
                } else {
                    Some(Err(err))
                }
            }
        }
    }
}

/// Module entries of a snapshot; ends at the first `false` from the OS
pub struct ModuleEntries<'s, 'k, A: Kernel32Api> {
    snapshot: &'s Snapshot<'k, A>,
    started: bool,
    done: bool,
}

impl<A: Kernel32Api> Iterator for ModuleEntries<'_, '_, A> {
    type Item = ModuleEntry32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let kernel32 = self.snapshot.kernel32;
        let mut entry = ModuleEntry32::new();
        let found = if self.started {
            kernel32.module32_next(self.snapshot.handle, &mut entry)
        } else {
            self.started = true;
            kernel32.module32_first(self.snapshot.handle, &mut entry)
        };

        if found {
            Some(entry)
        } else {
            self.done = true;
            None
        }
    }
}

/// Enumerate all running processes
pub fn enumerate_processes<A: Kernel32Api>(kernel32: &Kernel32<A>) -> ApiResult<Vec<ProcessInfo>> {
    let snapshot = Snapshot::processes(kernel32)?;
    let processes = snapshot
        .process_entries()
        .map(|entry| entry.map(|entry| ProcessInfo::from(&entry)))
        .collect::<ApiResult<Vec<_>>>()?;
    debug!(count = processes.len(), "Enumerated processes");
    Ok(processes)
}

/// Find processes by executable name (case-insensitive)
pub fn find_processes_by_name<A: Kernel32Api>(
    kernel32: &Kernel32<A>,
    name: &str,
) -> ApiResult<Vec<ProcessInfo>> {
    let processes = enumerate_processes(kernel32)?;
    Ok(processes
        .into_iter()
        .filter(|p| p.name_matches(name))
        .collect())
}

/// Get process by PID
pub fn get_process_by_pid<A: Kernel32Api>(
    kernel32: &Kernel32<A>,
    pid: ProcessId,
) -> ApiResult<Option<ProcessInfo>> {
    let processes = enumerate_processes(kernel32)?;
    Ok(processes.into_iter().find(|p| p.pid == pid))
}

/// Enumerate the modules loaded in a process; `0` means the caller
pub fn enumerate_modules<A: Kernel32Api>(
    kernel32: &Kernel32<A>,
    process_id: ProcessId,
) -> ApiResult<Vec<ModuleInfo>> {
    let snapshot = Snapshot::modules(kernel32, process_id)?;
    let modules: Vec<ModuleInfo> = snapshot
        .module_entries()
        .map(|entry| ModuleInfo::from(&entry))
        .collect();
    debug!(process_id, count = modules.len(), "Enumerated modules");
    Ok(modules)
}

/// Find a module by name (case-insensitive)
pub fn find_module_by_name<A: Kernel32Api>(
    kernel32: &Kernel32<A>,
    process_id: ProcessId,
    name: &str,
) -> ApiResult<Option<ModuleInfo>> {
    Ok(enumerate_modules(kernel32, process_id)?
        .into_iter()
        .find(|m| m.name_matches(name)))
}
