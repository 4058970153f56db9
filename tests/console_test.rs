//! Integration tests for console calls and control handlers

use kernel32_adapter::windows::{HandlerRoutine, FALSE, TRUE};
use kernel32_adapter::{CtrlEvent, ErrorCode, FakeKernel32, Kernel32, TextAttribute};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

static HANDLED_ON_OTHER_THREAD: AtomicBool = AtomicBool::new(false);
static LAST_EVENT: AtomicU32 = AtomicU32::new(u32::MAX);
static OUTER_CALLS: AtomicU32 = AtomicU32::new(0);
static FIRST_THREAD_HANDLER: AtomicBool = AtomicBool::new(false);
static SECOND_THREAD_HANDLER: AtomicBool = AtomicBool::new(false);

unsafe extern "system" fn record_event(ctrl_type: u32) -> i32 {
    LAST_EVENT.store(ctrl_type, Ordering::SeqCst);
    HANDLED_ON_OTHER_THREAD.store(true, Ordering::SeqCst);
    TRUE
}

unsafe extern "system" fn outer_handler(_ctrl_type: u32) -> i32 {
    OUTER_CALLS.fetch_add(1, Ordering::SeqCst);
    TRUE
}

unsafe extern "system" fn first_thread_handler(_ctrl_type: u32) -> i32 {
    FIRST_THREAD_HANDLER.store(true, Ordering::SeqCst);
    FALSE
}

unsafe extern "system" fn second_thread_handler(_ctrl_type: u32) -> i32 {
    SECOND_THREAD_HANDLER.store(true, Ordering::SeqCst);
    FALSE
}

unsafe extern "system" fn pass_through(_ctrl_type: u32) -> i32 {
    FALSE
}

unsafe extern "system" fn never_registered(_ctrl_type: u32) -> i32 {
    TRUE
}

#[test]
fn test_handler_runs_on_another_thread() {
    let k32 = Arc::new(Kernel32::new(FakeKernel32::new()));
    k32.set_console_ctrl_handler(Some(record_event), true)
        .unwrap();

    let raiser = Arc::clone(&k32);
    let handled = thread::spawn(move || raiser.api().raise_ctrl_event(CtrlEvent::CtrlBreak))
        .join()
        .unwrap();

    assert!(handled);
    assert!(HANDLED_ON_OTHER_THREAD.load(Ordering::SeqCst));
    assert_eq!(LAST_EVENT.load(Ordering::SeqCst), CtrlEvent::CtrlBreak.code());

    k32.set_console_ctrl_handler(Some(record_event), false)
        .unwrap();
    assert_eq!(k32.api().ctrl_handler_count(), 0);
}

#[test]
fn test_handlers_registered_from_two_threads_both_run() {
    let k32 = Arc::new(Kernel32::new(FakeKernel32::new()));

    let workers: Vec<_> = [first_thread_handler as HandlerRoutine, second_thread_handler]
        .into_iter()
        .map(|handler| {
            let k32 = Arc::clone(&k32);
            thread::spawn(move || k32.set_console_ctrl_handler(Some(handler), true))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap().unwrap();
    }
    assert_eq!(k32.api().ctrl_handler_count(), 2);

    // Neither handler claims the event, so both see it
    assert!(!k32.api().raise_ctrl_event(CtrlEvent::Logoff));
    assert!(FIRST_THREAD_HANDLER.load(Ordering::SeqCst));
    assert!(SECOND_THREAD_HANDLER.load(Ordering::SeqCst));
}

#[test]
fn test_handlers_run_last_registered_first() {
    let k32 = Kernel32::new(FakeKernel32::new());
    k32.set_console_ctrl_handler(Some(outer_handler), true)
        .unwrap();
    k32.set_console_ctrl_handler(Some(pass_through), true)
        .unwrap();
    assert_eq!(k32.api().ctrl_handler_count(), 2);

    // pass_through declines, so the event reaches outer_handler
    assert!(k32.api().raise_ctrl_event(CtrlEvent::Close));
    assert_eq!(OUTER_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_null_handler_ignores_ctrl_c() {
    let k32 = Kernel32::new(FakeKernel32::new());
    assert!(!k32.api().raise_ctrl_event(CtrlEvent::CtrlC));

    k32.set_console_ctrl_handler(None, true).unwrap();
    assert!(k32.api().raise_ctrl_event(CtrlEvent::CtrlC));
    assert!(!k32.api().raise_ctrl_event(CtrlEvent::CtrlBreak));

    k32.set_console_ctrl_handler(None, false).unwrap();
    assert!(!k32.api().raise_ctrl_event(CtrlEvent::CtrlC));
}

#[test]
fn test_removing_unknown_handler_fails() {
    let k32 = Kernel32::new(FakeKernel32::new());
    let err = k32
        .set_console_ctrl_handler(Some(never_registered), false)
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));
    assert_eq!(err.function(), Some("SetConsoleCtrlHandler"));
}

#[test]
fn test_text_attribute_round_trip() {
    let k32 = Kernel32::new(FakeKernel32::new());
    let console = k32.api().attach_console(100, 40);

    let before = k32.get_console_screen_buffer_info(console).unwrap();
    assert_eq!(before.size.x, 100);
    assert_eq!(before.size.y, 40);
    assert_eq!(before.window.width(), 100);

    let warning = TextAttribute::FOREGROUND_RED
        | TextAttribute::FOREGROUND_GREEN
        | TextAttribute::FOREGROUND_INTENSITY;
    assert!(k32.set_console_text_attribute(console, warning));
    let after = k32.get_console_screen_buffer_info(console).unwrap();
    assert_eq!(after.attributes, 0x000E);

    assert!(k32.set_console_text_attribute(console, TextAttribute::DEFAULT));
    assert!(k32.close_handle(console));
    assert!(!k32.set_console_text_attribute(console, TextAttribute::DEFAULT));
    assert!(k32.get_console_window().is_null());
}
