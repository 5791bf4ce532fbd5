//! Cooperative interruption of a conversion run.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared interrupt state between a signal handler and the converter.
///
/// The converter checks the flag before each source and holds the write lock
/// while an output file is written, so a handler that takes the lock never
/// exits in the middle of a write.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    requested: Arc<AtomicBool>,
    write_lock: Arc<Mutex<()>>,
}

impl Interrupt {
    /// Create a fresh, unrequested interrupt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before the next source.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Check whether a stop was requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Lock out output writes until the guard is dropped.
    pub fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock()
    }
}
