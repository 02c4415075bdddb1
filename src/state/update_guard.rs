//! Update run guard
//!
//! At most one update script runs at a time. A permit is held for the whole
//! lifetime of the child and released on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-run guard for the update script
#[derive(Debug, Default)]
pub struct UpdateGuard {
    running: AtomicBool,
}

/// Held while an update script is running
#[derive(Debug)]
pub struct UpdatePermit {
    guard: Arc<UpdateGuard>,
}

impl UpdateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the guard, `None` if an update is already running
    pub fn try_acquire(self: &Arc<Self>) -> Option<UpdatePermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| UpdatePermit {
                guard: Arc::clone(self),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for UpdatePermit {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
