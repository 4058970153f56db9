//! kernel32 bindings
//!
//! The typed adapter, and on Windows the call table it normally runs on.

pub mod kernel32;
#[cfg(windows)]
pub mod system;

pub use kernel32::Kernel32;
#[cfg(windows)]
pub use system::{system, SystemApi, DEFAULT_LIBRARY};
