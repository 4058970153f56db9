//! Strongly typed kernel handles
//!
//! Every handle kind is its own pointer-sized newtype so that, say, a
//! process handle cannot be passed where a snapshot handle is expected.
//! None of them close anything on drop; ownership stays with the caller.

use serde::Serialize;
use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// The zero handle; never a valid value
            pub const NULL: Self = $name(0);

            /// Wrap a raw handle value
            pub const fn from_raw(raw: usize) -> Self {
                $name(raw)
            }

            /// The raw handle value
            pub const fn as_raw(self) -> usize {
                self.0
            }

            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:X})", stringify!($name), self.0)
            }
        }
    };
}

define_handle!(
    /// A loaded executable or library image (`HMODULE` / `HINSTANCE`)
    ModuleHandle
);
define_handle!(
    /// A window (`HWND`), e.g. the console window
    WindowHandle
);
define_handle!(
    /// A console screen buffer
    ConsoleHandle
);
define_handle!(
    /// A process object
    ProcessHandle
);
define_handle!(
    /// A thread object
    ThreadHandle
);
define_handle!(
    /// A toolhelp snapshot
    SnapshotHandle
);
define_handle!(
    /// A global memory block (`HGLOBAL` from `GlobalAlloc`)
    GlobalHandle
);
define_handle!(
    /// Resource information block (`HRSRC`)
    ResourceInfoHandle
);
define_handle!(
    /// Loaded resource data (`HGLOBAL` from `LoadResource`)
    ResourceDataHandle
);

/// `INVALID_HANDLE_VALUE`
pub const INVALID_HANDLE_VALUE: usize = usize::MAX;

impl ProcessHandle {
    /// Pseudo-handle for the calling process, as returned by `GetCurrentProcess`
    pub const CURRENT: Self = ProcessHandle(usize::MAX);
}

impl ThreadHandle {
    /// Pseudo-handle for the calling thread, as returned by `GetCurrentThread`
    pub const CURRENT: Self = ThreadHandle(usize::MAX - 1);
}

impl SnapshotHandle {
    /// Failed snapshot creation
    pub const INVALID: Self = SnapshotHandle(INVALID_HANDLE_VALUE);

    /// Neither zero nor `INVALID_HANDLE_VALUE`
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 != INVALID_HANDLE_VALUE
    }
}

/// Kernel objects that `CloseHandle` accepts
pub trait KernelObject: Copy {
    fn raw_handle(self) -> usize;
}

impl KernelObject for ProcessHandle {
    fn raw_handle(self) -> usize {
        self.0
    }
}

impl KernelObject for ThreadHandle {
    fn raw_handle(self) -> usize {
        self.0
    }
}

impl KernelObject for SnapshotHandle {
    fn raw_handle(self) -> usize {
        self.0
    }
}

impl KernelObject for ConsoleHandle {
    fn raw_handle(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn test_handles_are_pointer_sized() {
        assert_eq!(mem::size_of::<ModuleHandle>(), mem::size_of::<usize>());
        assert_eq!(mem::size_of::<ProcessHandle>(), mem::size_of::<*mut u8>());
        assert_eq!(mem::size_of::<SnapshotHandle>(), mem::size_of::<usize>());
        assert_eq!(mem::size_of::<ResourceDataHandle>(), mem::size_of::<usize>());
    }

    #[test]
    fn test_null_handle() {
        assert!(ModuleHandle::NULL.is_null());
        assert!(!ModuleHandle::from_raw(0x400000).is_null());
        assert_eq!(GlobalHandle::from_raw(0x1234).as_raw(), 0x1234);
    }

    #[test]
    fn test_snapshot_validity() {
        assert!(!SnapshotHandle::INVALID.is_valid());
        assert!(!SnapshotHandle::NULL.is_valid());
        assert!(SnapshotHandle::from_raw(0x88).is_valid());
    }

    #[test]
    fn test_pseudo_handles() {
        assert_eq!(ProcessHandle::CURRENT.as_raw() as isize, -1);
        assert_eq!(ThreadHandle::CURRENT.as_raw() as isize, -2);
        assert!(!ProcessHandle::CURRENT.is_null());
    }

    #[test]
    fn test_handle_debug() {
        let handle = ProcessHandle::from_raw(0x1F0);
        assert_eq!(format!("{:?}", handle), "ProcessHandle(0x1F0)");
    }

    #[test]
    fn test_kernel_object_raw() {
        assert_eq!(ProcessHandle::from_raw(12).raw_handle(), 12);
        assert_eq!(SnapshotHandle::INVALID.raw_handle(), INVALID_HANDLE_VALUE);
    }
}
