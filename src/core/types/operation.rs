//! Bound kernel32 entry points and the failure policy each one follows

use serde::Serialize;
use std::fmt;

/// How a bound call reports failure to its caller.
///
/// The conventions come from the underlying entry points and are kept apart
/// on purpose: callers check each operation the way its policy says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailurePolicy {
    /// The raw value is returned as-is; there is no failure path.
    Unchecked,
    /// Failure is a zero (or invalid-sentinel) handle handed back to the caller.
    Sentinel,
    /// A zero result is an invariant violation and aborts.
    Abort,
    /// A boolean result; outputs are untrusted when it is `false`.
    Flag,
    /// A zero result becomes an error carrying the thread's last-error code.
    LastError,
    /// The return value is ignored; only a last-error of `ERROR_SUCCESS` is success.
    SuccessCode,
}

macro_rules! operations {
    ($( $variant:ident => $export:literal, $policy:ident; )*) => {
        /// A kernel32 entry point bound by this crate
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum Operation {
            $( $variant, )*
        }

        impl Operation {
            /// Every bound entry point, in table order
            pub const ALL: &'static [Operation] = &[ $( Operation::$variant, )* ];

            /// Name of the export in `kernel32.dll`
            pub const fn export_name(self) -> &'static str {
                match self {
                    $( Operation::$variant => $export, )*
                }
            }

            /// Failure convention of the entry point
            pub const fn policy(self) -> FailurePolicy {
                match self {
                    $( Operation::$variant => FailurePolicy::$policy, )*
                }
            }
        }
    };
}

operations! {
    GetModuleHandle => "GetModuleHandleW", Sentinel;
    MulDiv => "MulDiv", Unchecked;
    GetConsoleWindow => "GetConsoleWindow", Unchecked;
    GetCurrentThread => "GetCurrentThread", Unchecked;
    GetLogicalDrives => "GetLogicalDrives", Unchecked;
    GetUserDefaultLcid => "GetUserDefaultLCID", Unchecked;
    Lstrlen => "lstrlenW", Unchecked;
    Lstrcpy => "lstrcpyW", Unchecked;
    GlobalAlloc => "GlobalAlloc", Abort;
    GlobalFree => "GlobalFree", Abort;
    GlobalLock => "GlobalLock", Abort;
    GlobalUnlock => "GlobalUnlock", Flag;
    MoveMemory => "RtlMoveMemory", Unchecked;
    FindResource => "FindResourceW", LastError;
    SizeofResource => "SizeofResource", Abort;
    LockResource => "LockResource", Abort;
    LoadResource => "LoadResource", Abort;
    GetLastError => "GetLastError", Unchecked;
    OpenProcess => "OpenProcess", LastError;
    TerminateProcess => "TerminateProcess", Flag;
    CloseHandle => "CloseHandle", Flag;
    CreateToolhelp32Snapshot => "CreateToolhelp32Snapshot", Sentinel;
    Module32First => "Module32FirstW", Flag;
    Module32Next => "Module32NextW", Flag;
    GetSystemTimes => "GetSystemTimes", Flag;
    GetConsoleScreenBufferInfo => "GetConsoleScreenBufferInfo", Flag;
    SetConsoleTextAttribute => "SetConsoleTextAttribute", Flag;
    GetDiskFreeSpaceEx => "GetDiskFreeSpaceExW", Flag;
    GetProcessTimes => "GetProcessTimes", Flag;
    SetSystemTime => "SetSystemTime", SuccessCode;
    GetSystemTime => "GetSystemTime", SuccessCode;
    ReadProcessMemory => "ReadProcessMemory", LastError;
    WriteProcessMemory => "WriteProcessMemory", LastError;
    SetConsoleCtrlHandler => "SetConsoleCtrlHandler", SuccessCode;
    GetCurrentProcess => "GetCurrentProcess", LastError;
    Process32First => "Process32FirstW", LastError;
    Process32Next => "Process32NextW", LastError;
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.export_name())
    }
}
