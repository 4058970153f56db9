//! Named values for the raw masks and codes kernel32 takes

use serde::Serialize;
use std::fmt;
use std::ops::BitOr;

macro_rules! define_mask {
    ($(#[$meta:meta])* $name:ident : $raw:ty { $( $(#[$cmeta:meta])* $constant:ident = $value:expr; )* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub struct $name {
            value: $raw,
        }

        impl $name {
            $( $(#[$cmeta])* pub const $constant: Self = Self { value: $value }; )*

            /// Wrap a raw mask
            pub const fn from_raw(value: $raw) -> Self {
                Self { value }
            }

            /// Combine several masks
            pub fn combine(parts: &[Self]) -> Self {
                let mut value = 0;
                for part in parts {
                    value |= part.value;
                }
                Self { value }
            }

            /// Get raw value
            pub const fn value(&self) -> $raw {
                self.value
            }

            pub const fn contains(&self, other: Self) -> bool {
                self.value & other.value == other.value
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self { value: self.value | rhs.value }
            }
        }
    };
}

define_mask!(
    /// Access rights for `OpenProcess`
    ProcessAccess: u32 {
        TERMINATE = 0x0001;
        CREATE_THREAD = 0x0002;
        /// Execute operations
        VM_OPERATION = 0x0008;
        /// Read memory access
        VM_READ = 0x0010;
        /// Write memory access
        VM_WRITE = 0x0020;
        DUP_HANDLE = 0x0040;
        /// Query information access
        QUERY_INFORMATION = 0x0400;
        QUERY_LIMITED_INFORMATION = 0x1000;
        SYNCHRONIZE = 0x0010_0000;
        /// All possible access rights
        ALL_ACCESS = 0x001F_FFFF;
    }
);

impl ProcessAccess {
    /// Rights needed by `ReadProcessMemory`
    pub const fn read() -> Self {
        Self::from_raw(Self::QUERY_INFORMATION.value | Self::VM_READ.value)
    }

    /// Rights needed by both `ReadProcessMemory` and `WriteProcessMemory`
    pub const fn read_write() -> Self {
        Self::from_raw(
            Self::QUERY_INFORMATION.value
                | Self::VM_READ.value
                | Self::VM_WRITE.value
                | Self::VM_OPERATION.value,
        )
    }
}

define_mask!(
    /// `TH32CS_*` flags for `CreateToolhelp32Snapshot`
    SnapshotFlags: u32 {
        SNAP_HEAPLIST = 0x0000_0001;
        SNAP_PROCESS = 0x0000_0002;
        SNAP_THREAD = 0x0000_0004;
        SNAP_MODULE = 0x0000_0008;
        SNAP_MODULE32 = 0x0000_0010;
        SNAP_ALL = 0x0000_000F;
        INHERIT = 0x8000_0000;
    }
);

define_mask!(
    /// `GMEM_*` flags for `GlobalAlloc`
    GlobalAllocFlags: u32 {
        FIXED = 0x0000;
        MOVEABLE = 0x0002;
        ZEROINIT = 0x0040;
        /// `GMEM_MOVEABLE | GMEM_ZEROINIT`
        GHND = 0x0042;
        /// `GMEM_FIXED | GMEM_ZEROINIT`
        GPTR = 0x0040;
    }
);

define_mask!(
    /// Console character attributes for `SetConsoleTextAttribute`
    TextAttribute: u16 {
        FOREGROUND_BLUE = 0x0001;
        FOREGROUND_GREEN = 0x0002;
        FOREGROUND_RED = 0x0004;
        FOREGROUND_INTENSITY = 0x0008;
        BACKGROUND_BLUE = 0x0010;
        BACKGROUND_GREEN = 0x0020;
        BACKGROUND_RED = 0x0040;
        BACKGROUND_INTENSITY = 0x0080;
        /// Light grey on black, the console default
        DEFAULT = 0x0007;
    }
);

/// Control signal delivered to a console control handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CtrlEvent {
    CtrlC,
    CtrlBreak,
    Close,
    Logoff,
    Shutdown,
    Other(u32),
}

impl CtrlEvent {
    /// The `CTRL_*_EVENT` value
    pub const fn code(self) -> u32 {
        match self {
            CtrlEvent::CtrlC => 0,
            CtrlEvent::CtrlBreak => 1,
            CtrlEvent::Close => 2,
            CtrlEvent::Logoff => 5,
            CtrlEvent::Shutdown => 6,
            CtrlEvent::Other(code) => code,
        }
    }
}

impl From<u32> for CtrlEvent {
    fn from(code: u32) -> Self {
        match code {
            0 => CtrlEvent::CtrlC,
            1 => CtrlEvent::CtrlBreak,
            2 => CtrlEvent::Close,
            5 => CtrlEvent::Logoff,
            6 => CtrlEvent::Shutdown,
            other => CtrlEvent::Other(other),
        }
    }
}

impl fmt::Display for CtrlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtrlEvent::CtrlC => write!(f, "CTRL_C_EVENT"),
            CtrlEvent::CtrlBreak => write!(f, "CTRL_BREAK_EVENT"),
            CtrlEvent::Close => write!(f, "CTRL_CLOSE_EVENT"),
            CtrlEvent::Logoff => write!(f, "CTRL_LOGOFF_EVENT"),
            CtrlEvent::Shutdown => write!(f, "CTRL_SHUTDOWN_EVENT"),
            CtrlEvent::Other(code) => write!(f, "control event {}", code),
        }
    }
}

/// Decode a `GetLogicalDrives` bitmask into drive letters (bit 0 is `A`)
pub fn drive_letters(mask: u32) -> Vec<char> {
    (0..26u8)
        .filter(|bit| mask & (1u32 << bit) != 0)
        .map(|bit| (b'A' + bit) as char)
        .collect()
}
