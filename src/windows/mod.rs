//! Windows API layer
//!
//! [`Kernel32`] gives every bound kernel32 entry point a typed signature and
//! a fixed failure convention. Underneath sits a [`Kernel32Api`] call table:
//! the real one loaded from `kernel32.dll` on Windows, or [`FakeKernel32`]
//! anywhere.

use crate::core::{ApiError, ApiResult};

pub mod api;
pub mod bindings;
pub mod fake;
pub mod types;
pub mod utils;

pub use api::{HandlerRoutine, Kernel32Api, ResourceName, FALSE, TRUE};
pub use bindings::Kernel32;
pub use fake::FakeKernel32;
pub use utils::{ErrorCode, WideString, ERROR_SUCCESS};

#[cfg(windows)]
pub use bindings::{system, SystemApi};

/// Whether the real kernel32 table can be loaded on this target
pub const fn is_supported_platform() -> bool {
    cfg!(windows)
}

/// Fails with [`ApiError::UnsupportedPlatform`] naming the target OS when
/// the real table cannot be loaded here
pub fn require_supported_platform() -> ApiResult<()> {
    if is_supported_platform() {
        Ok(())
    } else {
        Err(ApiError::UnsupportedPlatform(std::env::consts::OS))
    }
}
