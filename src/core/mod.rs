//! Core module containing the error type and the entry-point table
//!
//! Everything else in the crate reports failures through [`ApiError`] and
//! names the call it made with an [`Operation`].

pub mod types;

// Re-export commonly used types for convenience
pub use types::{ApiError, ApiResult, FailurePolicy, Lcid, Operation, ProcessId};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("kernel32-adapter requires a 32- or 64-bit target");
