//! Cooperative cancellation token

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable interrupt flag passed explicitly into each job.
///
/// Setting it never kills a running export process; runners acknowledge it at
/// their next wait and the driver stops launching further scripts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    acknowledged: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `true` exactly once after cancellation, for the first observer
    /// that should log the acknowledgement.
    pub fn acknowledge(&self) -> bool {
        self.is_cancelled() && !self.acknowledged.swap(true, Ordering::SeqCst)
    }
}
