//! Cooperative Interruption
//!
//! An `InterruptFlag` is a shared boolean that a caller sets to ask a
//! long-running operation to stop. Nothing is preempted: the flag is only
//! looked at between units of work (one command line, one scan page).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation token. All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the current operation stop at its next yield point.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn set(&self, interrupted: bool) {
        self.flag.store(interrupted, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
