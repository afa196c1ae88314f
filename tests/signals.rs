//! Real signal delivery through `SignalHookLifecycle`.
//!
//! Run with: cargo test --test signals

#![cfg(unix)]

use std::env;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::low_level::raise;
use spark_tui_host::{
    App, AppHandle, AppOptions, BufferStream, ExitError, ExitSignal, MountContext,
    SignalHookLifecycle, TermHost,
};

/// Set in the environment of the re-executed test binary.
const CHILD_ENV: &str = "SPARK_TUI_HOST_SIGNAL_CHILD";

// Signals are process-wide; tests that raise them take turns.
static SERIAL: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPERS
// =============================================================================

fn empty(_host: &mut TermHost, _ctx: &MountContext) {}

fn mount(lifecycle: &Arc<SignalHookLifecycle>) -> AppHandle {
    App::new(
        AppOptions::new()
            .output(BufferStream::new(40))
            .input(std::io::empty())
            .error(std::io::sink())
            .lifecycle(lifecycle.clone()),
        empty,
    )
    .mount()
}

// =============================================================================
// DELIVERY
// =============================================================================

#[test]
fn sigterm_rejects_the_exit_handle() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let lifecycle = Arc::new(SignalHookLifecycle::new());
    let handle = mount(&lifecycle);
    let exit = handle.wait_until_exit();

    raise(SIGTERM).unwrap();

    assert_eq!(
        exit.wait_timeout(Duration::from_secs(5)),
        Some(Err(ExitError { code: None, signal: Some(ExitSignal::Terminate) }))
    );
    assert!(!handle.is_mounted());
}

#[test]
fn signal_after_clean_exit_still_unmounts() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let lifecycle = Arc::new(SignalHookLifecycle::new());
    let notifier = lifecycle.exit_notifier();
    let handle = mount(&lifecycle);
    let exit = handle.wait_until_exit();

    assert!(!notifier.exit(0));
    assert!(handle.is_mounted());

    raise(SIGINT).unwrap();

    assert_eq!(exit.wait_timeout(Duration::from_secs(5)), Some(Ok(())));
    assert!(!handle.is_mounted());
}

// =============================================================================
// DEFAULT ACTION
// =============================================================================

/// Body of the child process; a no-op in a normal test run.
#[test]
fn child_raises_sigterm_after_unmount() {
    if env::var_os(CHILD_ENV).is_none() {
        return;
    }
    let lifecycle = Arc::new(SignalHookLifecycle::new());
    let handle = mount(&lifecycle);
    handle.unmount();
    drop(handle);

    raise(SIGTERM).unwrap();
    thread::sleep(Duration::from_millis(200));
}

#[test]
fn sigterm_after_unmount_terminates_the_process() {
    let status = Command::new(env::current_exe().unwrap())
        .args(["--exact", "child_raises_sigterm_after_unmount", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap()
        .status;

    assert_eq!(status.signal(), Some(SIGTERM));
}
