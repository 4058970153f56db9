//! kernel32-adapter library for typed kernel32 calls
//!
//! [`Kernel32`] is the entry point: wrap a call table (the real
//! [`SystemApi`] on Windows, or [`FakeKernel32`] for tests) and call the
//! typed methods. The [`process`] module builds owning wrappers on top.

pub mod config;
pub mod core;
pub mod logging;
pub mod process;
pub mod windows;

// Re-export main types from core module
pub use core::types::{ApiError, ApiResult, FailurePolicy, Lcid, Operation, ProcessId};

// Re-export core directly for full access
pub use core::*;

pub use windows::types::*;
pub use windows::{ErrorCode, FakeKernel32, Kernel32, Kernel32Api, ResourceName, WideString};

#[cfg(windows)]
pub use windows::{system, SystemApi};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(AUTHORS, env!("CARGO_PKG_AUTHORS"));
    }

    #[test]
    fn test_error_reexport() {
        let error = ApiError::os(Operation::OpenProcess, 5);
        assert!(error.is_access_denied());
        assert_eq!(error.code(), Some(ErrorCode::AccessDenied));

        let result: ApiResult<u32> = Err(error);
        assert!(result.is_err());
    }

    #[test]
    fn test_operation_reexport() {
        assert_eq!(Operation::GlobalAlloc.policy(), FailurePolicy::Abort);
        assert_eq!(Operation::GetModuleHandle.export_name(), "GetModuleHandleW");
    }

    #[test]
    fn test_adapter_over_fake() {
        let k32 = Kernel32::new(FakeKernel32::new());
        assert_eq!(k32.mul_div(10, 3, 4), 8);
        let pid: ProcessId = 4242;
        assert!(k32
            .open_process(ProcessAccess::QUERY_LIMITED_INFORMATION, false, pid)
            .is_ok());
    }

    #[test]
    fn test_wide_string_reexport() {
        let wide = WideString::new("C:\\");
        assert_eq!(wide.as_slice_with_nul(), &[67, 58, 92, 0]);
    }
}
