//! Process inspection built on the kernel32 bindings
//!
//! Owning wrappers that close what they open, snapshot iterators, and owned
//! summaries of processes and modules.

pub mod enumerator;
pub mod handle;
pub mod info;

pub use enumerator::{
    enumerate_modules, enumerate_processes, find_module_by_name, find_processes_by_name,
    get_process_by_pid, ModuleEntries, ProcessEntries, Snapshot,
};
pub use handle::OwnedProcess;
pub use info::{ModuleInfo, ProcessInfo};

// Named masks used when opening processes and taking snapshots
pub use crate::windows::types::{ProcessAccess, SnapshotFlags};
