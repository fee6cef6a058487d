//! Process halt hooks for simulated crashes
//!
//! A crash-flagged participant calls [`HaltHook::halt`] during commit,
//! before the branch record is released. [`ProcessHalt`] really halts the
//! process; [`InterceptHalt`] records the call and returns so a test can
//! inspect what the crash left on disk.

use parking_lot::Mutex;
use std::fmt;

/// Terminates the process on a simulated crash
pub trait HaltHook: Send + Sync + fmt::Debug {
    /// Halt with `code`. Production implementations never return.
    fn halt(&self, code: i32);
}

/// Terminates the process on the spot
///
/// No unwinding, no destructors, no atexit handlers, and buffered stdout is
/// not flushed. Only data already handed to the OS survives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessHalt;

impl HaltHook for ProcessHalt {
    #[cfg(unix)]
    fn halt(&self, code: i32) {
        // SAFETY: `_exit` takes no pointers and never returns.
        unsafe { libc::_exit(code) }
    }

    #[cfg(not(unix))]
    fn halt(&self, _code: i32) {
        std::process::abort()
    }
}

/// Records halt requests instead of exiting
#[derive(Debug, Default)]
pub struct InterceptHalt {
    calls: Mutex<Vec<i32>>,
}

impl InterceptHalt {
    /// Create a hook with no recorded calls
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit codes of every intercepted halt, oldest first
    pub fn calls(&self) -> Vec<i32> {
        self.calls.lock().clone()
    }

    /// True if a halt was requested at least once
    pub fn was_halted(&self) -> bool {
        !self.calls.lock().is_empty()
    }
}

impl HaltHook for InterceptHalt {
    fn halt(&self, code: i32) {
        self.calls.lock().push(code);
    }
}
