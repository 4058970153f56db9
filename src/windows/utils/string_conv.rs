//! String conversion utilities for Windows API

use std::fmt;

/// An owned, null-terminated UTF-16 string ready to hand to a `W` entry point
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WideString {
    units: Vec<u16>,
}

impl WideString {
    /// Encode `s` as UTF-16 and append the terminator
    pub fn new(s: &str) -> Self {
        WideString {
            units: string_to_wide(s),
        }
    }

    /// Code units including the trailing zero
    pub fn as_slice_with_nul(&self) -> &[u16] {
        &self.units
    }

    /// Code units without the trailing zero
    pub fn as_slice(&self) -> &[u16] {
        &self.units[..self.units.len() - 1]
    }

    /// Number of code units, not counting the terminator
    pub fn len(&self) -> usize {
        self.units.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ptr(&self) -> *const u16 {
        self.units.as_ptr()
    }
}

impl From<&str> for WideString {
    fn from(s: &str) -> Self {
        WideString::new(s)
    }
}

impl fmt::Debug for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", wide_to_string(&self.units))
    }
}

/// Convert a Rust string to Windows wide string (UTF-16, null-terminated)
///
/// Interior NULs are kept; the OS will stop reading at the first one.
pub fn string_to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Convert Windows wide string (UTF-16) to Rust string, stopping at the first NUL
pub fn wide_to_string(wide: &[u16]) -> String {
    let len = wide_len(wide);
    String::from_utf16_lossy(&wide[..len])
}

/// Length of a fixed-size wide buffer up to its first NUL
pub fn wide_len(wide: &[u16]) -> usize {
    wide.iter().position(|&c| c == 0).unwrap_or(wide.len())
}

/// Convert Windows wide string pointer to Rust string
///
/// # Safety
/// The pointer must be null or point to a null-terminated UTF-16 string
pub unsafe fn wide_ptr_to_string(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }

    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }

    let slice = std::slice::from_raw_parts(ptr, len);
    wide_to_string(slice)
}

/// Copy `s` into a fixed-size wide buffer, truncating so the last unit stays NUL
pub fn copy_to_wide_buf(s: &str, buf: &mut [u16]) {
    if buf.is_empty() {
        return;
    }
    let max = buf.len() - 1;
    let mut written = 0;
    for unit in s.encode_utf16().take(max) {
        buf[written] = unit;
        written += 1;
    }
    buf[written..].fill(0);
}

/// Extract filename from full path
pub fn extract_filename(path: &str) -> String {
    path.rsplit(|c: char| c == '\\' || c == '/').next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_wide() {
        let wide = string_to_wide("Hello");
        assert_eq!(wide, vec![72, 101, 108, 108, 111, 0]);

        let empty = string_to_wide("");
        assert_eq!(empty, vec![0]);
    }

    #[test]
    fn test_wide_string_lengths() {
        let wide = WideString::new("kernel32.dll");
        assert_eq!(wide.len(), 12);
        assert_eq!(wide.as_slice_with_nul().len(), 13);
        assert_eq!(*wide.as_slice_with_nul().last().unwrap(), 0);
        assert_eq!(wide.as_slice().len(), 12);
        assert!(!wide.is_empty());
        assert!(WideString::new("").is_empty());
    }

    #[test]
    fn test_wide_to_string() {
        let wide = vec![72, 101, 108, 108, 111, 0];
        assert_eq!(wide_to_string(&wide), "Hello");

        let no_null = vec![72, 101, 108, 108, 111];
        assert_eq!(wide_to_string(&no_null), "Hello");

        let trailing = vec![72, 105, 0, 88, 88];
        assert_eq!(wide_to_string(&trailing), "Hi");
    }

    #[test]
    fn test_copy_to_wide_buf_truncates() {
        let mut buf = [0xFFFFu16; 4];
        copy_to_wide_buf("abcdef", &mut buf);
        assert_eq!(buf, [97, 98, 99, 0]);

        let mut buf = [0xFFFFu16; 6];
        copy_to_wide_buf("ab", &mut buf);
        assert_eq!(buf, [97, 98, 0, 0, 0, 0]);
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("C:\\Windows\\System32\\kernel32.dll"),
            "kernel32.dll"
        );
        assert_eq!(extract_filename("kernel32.dll"), "kernel32.dll");
        assert_eq!(extract_filename(""), "");
        assert_eq!(extract_filename("C:\\"), "");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Unsafe pointer operations")]
    fn test_wide_ptr_to_string() {
        unsafe {
            assert_eq!(wide_ptr_to_string(std::ptr::null()), "");
        }

        let wide_str = vec![72u16, 101, 108, 108, 111, 0];
        unsafe {
            assert_eq!(wide_ptr_to_string(wide_str.as_ptr()), "Hello");
        }
    }

    #[test]
    fn test_unicode_strings() {
        let unicode_str = "Hello 世界 🌍";
        let wide = string_to_wide(unicode_str);
        assert_eq!(wide.len(), unicode_str.encode_utf16().count() + 1);
        assert_eq!(wide_to_string(&wide), unicode_str);
    }
}
