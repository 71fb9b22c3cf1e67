// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative cancellation for long-running batches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation signal.
///
/// Clones observe the same flag, so a host can keep one clone and hand
/// another to a batch edit or an export running elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag for reuse
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
