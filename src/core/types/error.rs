//! Error types for kernel32-adapter

use super::operation::Operation;
use crate::windows::utils::ErrorCode;
use thiserror::Error;

/// Main error type for bound kernel32 calls
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("{function} failed: {code}")]
    Os {
        function: &'static str,
        code: ErrorCode,
    },

    #[error("Failed to load {library}: {reason}")]
    LibraryLoad { library: String, reason: String },

    #[error("Entry point not found: {0}")]
    MissingEntryPoint(&'static str),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
}

/// Result type alias for bound kernel32 calls
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates an OS error for `op` from a raw last-error code
    pub fn os(op: Operation, code: u32) -> Self {
        ApiError::Os {
            function: op.export_name(),
            code: ErrorCode::from(code),
        }
    }

    /// Creates a library load error
    pub fn library_load(library: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::LibraryLoad {
            library: library.into(),
            reason: reason.into(),
        }
    }

    /// The OS error code, when the error came from a bound call
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ApiError::Os { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The export name of the failed call, when the error came from one
    pub fn function(&self) -> Option<&'static str> {
        match self {
            ApiError::Os { function, .. } => Some(*function),
            _ => None,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        self.code() == Some(ErrorCode::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::os(Operation::OpenProcess, 5);
        assert_eq!(err.to_string(), "OpenProcess failed: Access denied");

        let err = ApiError::os(Operation::FindResource, 1814);
        assert_eq!(
            err.to_string(),
            "FindResourceW failed: Resource name not found"
        );
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<(ApiError, &str)> = vec![
            (
                ApiError::os(Operation::ReadProcessMemory, 299),
                "ReadProcessMemory failed: Partial copy",
            ),
            (
                ApiError::os(Operation::SetSystemTime, 4242),
                "SetSystemTime failed: Unknown error: 4242",
            ),
            (
                ApiError::library_load("kernel33.dll", "not found"),
                "Failed to load kernel33.dll: not found",
            ),
            (
                ApiError::MissingEntryPoint("lstrcpyW"),
                "Entry point not found: lstrcpyW",
            ),
            (
                ApiError::UnsupportedPlatform("linux"),
                "Unsupported platform: linux",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_helper_methods() {
        let err = ApiError::os(Operation::OpenProcess, 5);
        assert!(err.is_access_denied());
        assert_eq!(err.code(), Some(ErrorCode::AccessDenied));
        assert_eq!(err.function(), Some("OpenProcess"));

        let err = ApiError::MissingEntryPoint("MulDiv");
        assert!(!err.is_access_denied());
        assert_eq!(err.code(), None);
        assert_eq!(err.function(), None);
    }

    #[test]
    fn test_clone_keeps_code() {
        let err = ApiError::os(Operation::Process32Next, 18);
        let cloned = err.clone();
        assert_eq!(cloned.code(), Some(ErrorCode::NoMoreFiles));
        assert_eq!(cloned.to_string(), err.to_string());
    }

    #[test]
    fn test_error_debug_format() {
        let err = ApiError::os(Operation::CloseHandle, 6);
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Os"));
        assert!(debug_str.contains("CloseHandle"));
    }
}
