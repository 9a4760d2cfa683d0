//! One-shot signal flag
//!
//! A set-once, clearable boolean safe for concurrent read and write. The
//! control thread uses one to tell the producer to exit; the producer uses
//! them to report one-time events (first buffer queued, source exhausted)
//! back to the control thread.
//!
//! All accesses are relaxed: a `Flag` orders nothing but itself.

use std::sync::atomic::{AtomicBool, Ordering};

/// Single-bit cross-thread signal
#[derive(Debug, Default)]
pub struct Flag(AtomicBool);

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Lower the flag
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Read the flag
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
