//! Windows error code handling utilities

use serde::Serialize;
use std::fmt;

/// `ERROR_SUCCESS`, the "operation completed successfully" last-error value
pub const ERROR_SUCCESS: u32 = 0;

/// Common Windows error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    Success,
    FileNotFound,
    PathNotFound,
    AccessDenied,
    InvalidHandle,
    NotEnoughMemory,
    NoMoreFiles,
    BadLength,
    InvalidParameter,
    InsufficientBuffer,
    ModNotFound,
    NotLocked,
    PartialCopy,
    InvalidAddress,
    PrivilegeNotHeld,
    ResourceTypeNotFound,
    ResourceNameNotFound,
    Unknown(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            2 => ErrorCode::FileNotFound,
            3 => ErrorCode::PathNotFound,
            5 => ErrorCode::AccessDenied,
            6 => ErrorCode::InvalidHandle,
            8 => ErrorCode::NotEnoughMemory,
            18 => ErrorCode::NoMoreFiles,
            24 => ErrorCode::BadLength,
            87 => ErrorCode::InvalidParameter,
            122 => ErrorCode::InsufficientBuffer,
            126 => ErrorCode::ModNotFound,
            158 => ErrorCode::NotLocked,
            299 => ErrorCode::PartialCopy,
            487 => ErrorCode::InvalidAddress,
            1314 => ErrorCode::PrivilegeNotHeld,
            1813 => ErrorCode::ResourceTypeNotFound,
            1814 => ErrorCode::ResourceNameNotFound,
            _ => ErrorCode::Unknown(code),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl ErrorCode {
    /// The raw Win32 value
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::FileNotFound => 2,
            ErrorCode::PathNotFound => 3,
            ErrorCode::AccessDenied => 5,
            ErrorCode::InvalidHandle => 6,
            ErrorCode::NotEnoughMemory => 8,
            ErrorCode::NoMoreFiles => 18,
            ErrorCode::BadLength => 24,
            ErrorCode::InvalidParameter => 87,
            ErrorCode::InsufficientBuffer => 122,
            ErrorCode::ModNotFound => 126,
            ErrorCode::NotLocked => 158,
            ErrorCode::PartialCopy => 299,
            ErrorCode::InvalidAddress => 487,
            ErrorCode::PrivilegeNotHeld => 1314,
            ErrorCode::ResourceTypeNotFound => 1813,
            ErrorCode::ResourceNameNotFound => 1814,
            ErrorCode::Unknown(code) => code,
        }
    }

    /// Exact comparison against `ERROR_SUCCESS`
    pub const fn is_success(self) -> bool {
        self.code() == ERROR_SUCCESS
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Success => write!(f, "The operation completed successfully"),
            ErrorCode::FileNotFound => write!(f, "File not found"),
            ErrorCode::PathNotFound => write!(f, "Path not found"),
            ErrorCode::AccessDenied => write!(f, "Access denied"),
            ErrorCode::InvalidHandle => write!(f, "Invalid handle"),
            ErrorCode::NotEnoughMemory => write!(f, "Not enough memory"),
            ErrorCode::NoMoreFiles => write!(f, "No more files"),
            ErrorCode::BadLength => write!(f, "Bad length"),
            ErrorCode::InvalidParameter => write!(f, "Invalid parameter"),
            ErrorCode::InsufficientBuffer => write!(f, "Insufficient buffer"),
            ErrorCode::ModNotFound => write!(f, "Module not found"),
            ErrorCode::NotLocked => write!(f, "Segment already unlocked"),
            ErrorCode::PartialCopy => write!(f, "Partial copy"),
            ErrorCode::InvalidAddress => write!(f, "Invalid address"),
            ErrorCode::PrivilegeNotHeld => write!(f, "Privilege not held"),
            ErrorCode::ResourceTypeNotFound => write!(f, "Resource type not found"),
            ErrorCode::ResourceNameNotFound => write!(f, "Resource name not found"),
            ErrorCode::Unknown(code) => write!(f, "Unknown error: {}", code),
        }
    }
}
