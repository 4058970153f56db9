//! Core type definitions for kernel32-adapter
//!
//! Error types and the table of bound entry points with their failure
//! conventions.

mod error;
mod operation;

// Re-export all public types
pub use error::{ApiError, ApiResult};
pub use operation::{FailurePolicy, Operation};

// Common type aliases
pub type ProcessId = u32;
pub type Lcid = u32;
