//! Stop flag suppressing port commands after a fault.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared fault flag.
///
/// Once tripped, the dispatcher refuses port commands until the interlock is
/// reset. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct FaultInterlock {
    tripped: Arc<AtomicBool>,
}

impl FaultInterlock {
    /// Creates an interlock in the reset state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the interlock.
    pub fn trip(&self) {
        self.tripped.store(true, Ordering::SeqCst);
    }

    /// Clears the interlock.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::SeqCst);
    }

    /// Whether the interlock is tripped.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}
