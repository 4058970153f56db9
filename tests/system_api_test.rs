//! Integration tests against the real kernel32.dll

#![cfg(windows)]

use kernel32_adapter::process::{enumerate_modules, find_module_by_name, get_process_by_pid};
use kernel32_adapter::{system, ProcessAccess, WideString};
use std::process;

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_singleton_loads() {
    let k32 = system().expect("Failed to load kernel32");
    assert_eq!(k32.mul_div(10, 3, 4), 8);
    assert!(!k32.get_module_handle("kernel32.dll").is_null());
    assert!(!k32.get_module_handle("").is_null());
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_current_process_is_enumerated() {
    let k32 = system().unwrap();
    let me = get_process_by_pid(k32, process::id())
        .unwrap()
        .expect("Current process missing from snapshot");
    assert!(me.thread_count >= 1);

    let modules = enumerate_modules(k32, process::id()).unwrap();
    assert!(!modules.is_empty(), "No modules found in current process");

    let kernel32 = find_module_by_name(k32, process::id(), "kernel32.dll")
        .unwrap()
        .expect("kernel32.dll not loaded");
    assert_eq!(
        kernel32.handle,
        k32.get_module_handle("kernel32.dll"),
        "Module handle should be the image base"
    );
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_own_memory_round_trip() {
    let k32 = system().unwrap();
    let target = Box::new(0u32);
    let address = &*target as *const u32 as usize;

    let process = k32
        .open_process(ProcessAccess::read_write(), false, process::id())
        .unwrap();
    k32.write_process_memory_u32(process, address, 0x1234_5678)
        .unwrap();
    assert_eq!(k32.read_process_memory_u32(process, address).unwrap(), 0x1234_5678);
    assert_eq!(*target, 0x1234_5678);
    assert!(k32.close_handle(process));
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_strings_and_times() {
    let k32 = system().unwrap();
    let text = WideString::new("kernel32");
    assert_eq!(unsafe { k32.lstrlen(text.as_ptr()) }, 8);

    let now = k32.get_system_time();
    if let Ok(now) = now {
        assert!(now.is_valid());
    }
    assert!(k32.system_times().is_some());
}
